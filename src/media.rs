//! Backing-track inspection through `ffprobe`.

use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::is_ffprobe_on_path;
use crate::foundation::error::{KaraokeError, KaraokeResult};

/// Basic metadata about the backing track.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioInfo {
    /// Probed path.
    pub path: PathBuf,
    /// Container duration in seconds.
    pub duration_secs: f64,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe an audio file for its duration, requiring at least one audio stream.
///
/// Missing files, files without an audio stream, and files without a positive duration are
/// input errors.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn probe_audio(path: &Path) -> KaraokeResult<AudioInfo> {
    if !path.is_file() {
        return Err(KaraokeError::input(format!(
            "audio file '{}' does not exist",
            path.display()
        )));
    }
    if !is_ffprobe_on_path() {
        return Err(KaraokeError::encode(
            "ffprobe is required to read the audio track, but was not found on PATH",
        ));
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| KaraokeError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(KaraokeError::input(format!(
            "audio file '{}' is unreadable: {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| KaraokeError::serde(format!("ffprobe json parse failed: {e}")))?;
    audio_info_from_probe(path, parsed)
}

fn audio_info_from_probe(path: &Path, parsed: ProbeOut) -> KaraokeResult<AudioInfo> {
    let stream = parsed
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or_else(|| {
            KaraokeError::input(format!("'{}' has no audio stream", path.display()))
        })?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .or(stream.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            KaraokeError::input(format!(
                "audio file '{}' has no positive duration",
                path.display()
            ))
        })?;

    Ok(AudioInfo {
        path: path.to_path_buf(),
        duration_secs,
    })
}

#[cfg(test)]
#[path = "../tests/unit/media/media.rs"]
mod tests;
