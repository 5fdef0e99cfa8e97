//! Timed lyric lines as handed over by upstream producers (transcription, subtitle import, editors).

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{KaraokeError, KaraokeResult};

/// One timed caption line.
///
/// Valid segments have finite times with `0 <= start < end`. A negative `start` is an input
/// error, not clamped to zero.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricSegment {
    /// Start time in seconds (absolute, from the beginning of the audio).
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Caption text.
    pub text: String,
}

impl LyricSegment {
    /// Construct a segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// On-screen duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Check the timing invariants (`0 <= start < end`, both finite).
    pub fn validate(&self) -> KaraokeResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(KaraokeError::input(format!(
                "segment '{}' has non-finite timing",
                self.text
            )));
        }
        if self.start < 0.0 {
            return Err(KaraokeError::input(format!(
                "segment '{}' starts before 0 ({})",
                self.text, self.start
            )));
        }
        if self.end <= self.start {
            return Err(KaraokeError::input(format!(
                "segment '{}' must end after it starts (start={}, end={})",
                self.text, self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Ordered lyric lines for one job plus the detected language, if any.
///
/// JSON shape: `{"segments": [{"start": 0.0, "end": 2.0, "text": "..."}], "language": "en"}`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricSet {
    /// Lines in display order.
    pub segments: Vec<LyricSegment>,
    /// Opaque language tag (display only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl LyricSet {
    /// Construct from segments without a language tag.
    pub fn new(segments: Vec<LyricSegment>) -> Self {
        Self {
            segments,
            language: None,
        }
    }

    /// Parse the interchange JSON shape.
    pub fn from_json_str(s: &str) -> KaraokeResult<Self> {
        serde_json::from_str(s).map_err(|e| KaraokeError::serde(format!("lyrics json: {e}")))
    }

    /// Read and parse a lyrics JSON file.
    pub fn from_json_path(path: &Path) -> KaraokeResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read lyrics file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Return `true` when there are no lines.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Validate every segment; the first offending line is reported with its index.
    pub fn validate(&self) -> KaraokeResult<()> {
        for (i, seg) in self.segments.iter().enumerate() {
            seg.validate().map_err(|e| match e {
                KaraokeError::Input(msg) => KaraokeError::input(format!("segment {i}: {msg}")),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Text of the line following `index`, or `""` for the last line.
    pub fn next_text(&self, index: usize) -> &str {
        self.segments
            .get(index + 1)
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }

    /// Latest end time across all lines.
    pub fn last_end_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.end).fold(0.0, f64::max)
    }
}

#[cfg(test)]
#[path = "../tests/unit/lyrics/lyrics.rs"]
mod tests;
