//! Per-job configuration: canvas, typography, colors, and encoder settings.
//!
//! Every field has a default, so a JSON config only needs the values it changes.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps, Rgb8};
use crate::foundation::error::{KaraokeError, KaraokeResult};

/// Environment variable overriding the base directory for job work dirs.
pub const ENV_TEMP_DIR: &str = "KARAOKE_TEMP_DIR";
/// Environment variable overriding the worker thread count for parallel segment builds.
pub const ENV_THREADS: &str = "KARAOKE_THREADS";

/// Canvas, typography, and color settings shared read-only by every render component.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width in pixels (must be even for yuv420p output).
    pub width: u32,
    /// Canvas height in pixels (must be even for yuv420p output).
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Caption font size in pixels.
    pub font_size: f32,
    /// Next-line preview font size in pixels.
    pub preview_font_size: f32,
    /// Base caption color.
    pub font_color: Rgb8,
    /// Color of the already-sung prefix.
    pub highlight_color: Rgb8,
    /// Color of the next-line preview.
    pub preview_color: Rgb8,
    /// Canvas fill.
    pub bg_color: Rgb8,
    /// Vertical anchor of the caption block center, as a fraction of canvas height.
    pub text_anchor: f32,
    /// Upward shift of the caption block from its anchor, leaving room for the preview.
    pub text_lift_px: f32,
    /// Gap between wrapped caption lines.
    pub line_spacing: f32,
    /// Gap between the caption block and the preview.
    pub preview_gap: f32,
    /// Gap between wrapped preview lines.
    pub preview_line_spacing: f32,
    /// Wrap width as a fraction of canvas width.
    pub wrap_width_fraction: f32,
    /// Maximum number of wrapped preview lines drawn.
    pub max_preview_lines: usize,
    /// Ordered font file candidates tried before the built-in list.
    pub fonts: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: Fps::default(),
            font_size: 72.0,
            preview_font_size: 52.0,
            font_color: Rgb8::WHITE,
            highlight_color: Rgb8::YELLOW,
            preview_color: Rgb8::new(180, 180, 180),
            bg_color: Rgb8::BLACK,
            text_anchor: 0.5,
            text_lift_px: 50.0,
            line_spacing: 10.0,
            preview_gap: 20.0,
            preview_line_spacing: 5.0,
            wrap_width_fraction: 0.9,
            max_preview_lines: 2,
            fonts: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Canvas dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Maximum caption line width in pixels.
    pub fn wrap_width_px(&self) -> f32 {
        (self.width as f32 * self.wrap_width_fraction).floor()
    }

    /// Check ranges and encoder constraints.
    pub fn validate(&self) -> KaraokeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(KaraokeError::input("canvas width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(KaraokeError::input(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(KaraokeError::input("canvas width/height must fit in u16"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        for (name, v) in [
            ("font_size", self.font_size),
            ("preview_font_size", self.preview_font_size),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(KaraokeError::input(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        for (name, v) in [
            ("text_lift_px", self.text_lift_px),
            ("line_spacing", self.line_spacing),
            ("preview_gap", self.preview_gap),
            ("preview_line_spacing", self.preview_line_spacing),
        ] {
            if !v.is_finite() {
                return Err(KaraokeError::input(format!("{name} must be finite")));
            }
        }
        if !(0.0..=1.0).contains(&self.text_anchor) {
            return Err(KaraokeError::input("text_anchor must be within [0, 1]"));
        }
        if !(self.wrap_width_fraction > 0.0 && self.wrap_width_fraction <= 1.0) {
            return Err(KaraokeError::input(
                "wrap_width_fraction must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

/// How per-line clips get their frames into ffmpeg.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntermediateMode {
    /// Write numbered PNG files into the work dir, encode them, then delete them.
    #[default]
    ImageSequence,
    /// Stream raw RGB frames over ffmpeg's stdin.
    Pipe,
}

/// Encoder settings for intermediates and the final deliverable.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    /// Final video codec.
    pub codec: String,
    /// Final video bitrate (ffmpeg syntax, e.g. `5000k`).
    pub bitrate: String,
    /// Final encoder preset.
    pub preset: String,
    /// Final audio codec.
    pub audio_codec: String,
    /// Final encode thread count.
    pub threads: u32,
    /// Codec for per-line and background intermediates.
    pub intermediate_codec: String,
    /// Preset for intermediates.
    pub intermediate_preset: String,
    /// How segment frames reach the intermediate encoder.
    pub intermediate: IntermediateMode,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_owned(),
            bitrate: "5000k".to_owned(),
            preset: "medium".to_owned(),
            audio_codec: "aac".to_owned(),
            threads: 4,
            intermediate_codec: "libx264".to_owned(),
            intermediate_preset: "fast".to_owned(),
            intermediate: IntermediateMode::default(),
        }
    }
}

/// Everything configurable about one job.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Canvas/typography/colors.
    pub render: RenderConfig,
    /// Encoder settings.
    pub encode: EncodeSettings,
}

impl JobConfig {
    /// Parse a JSON config.
    pub fn from_json_str(s: &str) -> KaraokeResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| KaraokeError::serde(format!("config json: {e}")))?;
        cfg.render.validate()?;
        Ok(cfg)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn from_json_path(path: &Path) -> KaraokeResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}

/// Base directory for job work dirs: `KARAOKE_TEMP_DIR`, else the OS temp dir.
pub fn temp_base_dir() -> PathBuf {
    std::env::var_os(ENV_TEMP_DIR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

/// Worker thread override from `KARAOKE_THREADS`, when set to a positive integer.
pub fn threads_from_env() -> Option<usize> {
    std::env::var(ENV_THREADS)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
