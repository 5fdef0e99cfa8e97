use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::config::EncodeSettings;
use crate::encode::ffmpeg::{FfmpegPipeSink, ffmpeg_command, run_ffmpeg, verify_output};
use crate::foundation::core::Fps;
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::render::frame::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback frame rate.
    pub fps: Fps,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called with strictly increasing indices starting at 0, between one `begin`
/// and one `end`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> KaraokeResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: u64, frame: &Frame) -> KaraokeResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> KaraokeResult<()>;
}

fn check_frame(cfg: &SinkConfig, last: Option<u64>, idx: u64, frame: &Frame) -> KaraokeResult<()> {
    if let Some(last) = last
        && idx <= last
    {
        return Err(KaraokeError::encode("sink received out-of-order frame index"));
    }
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(KaraokeError::encode(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, Frame)>,
    finished: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Frames in push order.
    pub fn frames(&self) -> &[(u64, Frame)] {
        &self.frames
    }

    /// Whether `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> KaraokeResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> KaraokeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KaraokeError::encode("in-memory sink not started"))?;
        check_frame(cfg, self.frames.last().map(|(i, _)| *i), idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> KaraokeResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes each frame as a numbered PNG, then encodes the sequence with `ffmpeg` on `end`.
///
/// The PNG directory is removed once the clip is written, and on drop if encoding never ran.
pub struct ImageSequenceSink {
    frames_dir: PathBuf,
    out_path: PathBuf,
    codec: String,
    preset: String,
    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl ImageSequenceSink {
    /// Sink writing PNGs into `frames_dir` and the encoded clip to `out_path`.
    pub fn new(
        frames_dir: impl Into<PathBuf>,
        out_path: impl Into<PathBuf>,
        encode: &EncodeSettings,
    ) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            out_path: out_path.into(),
            codec: encode.intermediate_codec.clone(),
            preset: encode.intermediate_preset.clone(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Path of frame `idx` inside the frame directory.
    pub fn frame_path(&self, idx: u64) -> PathBuf {
        self.frames_dir.join(format!("frame_{idx:06}.png"))
    }

    fn remove_frames(&self) {
        if self.frames_dir.exists()
            && let Err(e) = std::fs::remove_dir_all(&self.frames_dir)
        {
            tracing::warn!(dir = %self.frames_dir.display(), "failed to remove frame directory: {e}");
        }
    }
}

impl FrameSink for ImageSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> KaraokeResult<()> {
        std::fs::create_dir_all(&self.frames_dir).with_context(|| {
            format!("create frame directory '{}'", self.frames_dir.display())
        })?;
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> KaraokeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KaraokeError::encode("image sequence sink not started"))?;
        check_frame(cfg, self.last_idx, idx, frame)?;
        if idx != self.last_idx.map_or(0, |i| i + 1) {
            return Err(KaraokeError::encode(
                "image sequence sink requires contiguous frame indices",
            ));
        }
        self.last_idx = Some(idx);
        frame
            .save_png(&self.frame_path(idx))
            .map_err(|e| KaraokeError::resource(format!("failed to write frame {idx}: {e}")))
    }

    fn end(&mut self) -> KaraokeResult<()> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| KaraokeError::encode("image sequence sink not started"))?;
        if self.last_idx.is_none() {
            return Err(KaraokeError::encode("image sequence sink received no frames"));
        }

        let mut cmd = ffmpeg_command();
        cmd.args(["-framerate", &cfg.fps.ffmpeg_rate(), "-i"])
            .arg(self.frames_dir.join("frame_%06d.png"))
            .args([
                "-c:v",
                &self.codec,
                "-pix_fmt",
                "yuv420p",
                "-preset",
                &self.preset,
                "-an",
            ])
            .arg(&self.out_path);
        let res = run_ffmpeg(cmd, "segment encode").and_then(|()| verify_output(&self.out_path));
        self.remove_frames();
        res
    }
}

impl Drop for ImageSequenceSink {
    fn drop(&mut self) {
        if self.cfg.is_some() {
            self.remove_frames();
        }
    }
}

/// Sink selected by `encode.intermediate`.
pub(crate) fn sink_for(
    encode: &EncodeSettings,
    scratch_dir: &Path,
    out_path: &Path,
) -> Box<dyn FrameSink> {
    match encode.intermediate {
        crate::config::IntermediateMode::ImageSequence => {
            Box::new(ImageSequenceSink::new(scratch_dir, out_path, encode))
        }
        crate::config::IntermediateMode::Pipe => Box::new(FfmpegPipeSink::new(out_path, encode)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
