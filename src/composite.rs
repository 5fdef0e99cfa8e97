//! Final assembly: background, per-line clips, and the backing track in one `ffmpeg` pass.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::build::segment::SegmentClip;
use crate::config::JobConfig;
use crate::encode::ffmpeg::{ensure_parent_dir, ffmpeg_command, run_ffmpeg, verify_output};
use crate::foundation::error::{KaraokeError, KaraokeResult};

/// Inputs of the final encode.
#[derive(Clone, Copy, Debug)]
pub struct CompositeRequest<'a> {
    /// Full-length background clip.
    pub background: &'a Path,
    /// Per-line clips in lyric order.
    pub clips: &'a [SegmentClip],
    /// Backing track.
    pub audio: &'a Path,
    /// Backing track duration; the output is cut to it.
    pub audio_duration_secs: f64,
    /// Final deliverable.
    pub output: &'a Path,
}

/// Label of the composited video stream in [`overlay_filter_graph`].
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Build the `-filter_complex` graph laying `clips` over input 0.
///
/// Clip `k` is input `k + 1`. Each is shifted to its start offset and overlaid only inside its
/// `[start, end]` window. Overlays chain in lyric order, so a later line is drawn over an earlier
/// one where they overlap.
pub fn overlay_filter_graph(clips: &[SegmentClip]) -> String {
    let mut graph = String::new();
    let mut prev = "0:v".to_owned();
    for (k, clip) in clips.iter().enumerate() {
        let input = k + 1;
        let start = clip.start_offset;
        let end = clip.end_offset;
        let _ = write!(
            graph,
            "[{input}:v]setpts=PTS-STARTPTS+{start:.6}/TB[s{k}];\
             [{prev}][s{k}]overlay=eof_action=pass:enable='between(t,{start:.6},{end:.6})'[v{k}];"
        );
        prev = format!("v{k}");
    }
    let _ = write!(graph, "[{prev}]format=yuv420p[{VIDEO_OUT_LABEL}]");
    graph
}

/// Sibling path the encoder writes before the final rename.
pub fn partial_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    let name = match output.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    output.with_file_name(name)
}

/// Removes the partial output unless the encode was committed.
struct PartialFileGuard {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Encode the final video with the backing track.
///
/// The encoder writes to [`partial_output_path`] and the file is renamed into place only on
/// success, so a failed job never leaves a truncated deliverable behind.
#[tracing::instrument(skip_all, fields(clips = req.clips.len(), output = %req.output.display()))]
pub fn compose(req: &CompositeRequest<'_>, cfg: &JobConfig) -> KaraokeResult<()> {
    if !req.audio_duration_secs.is_finite() || req.audio_duration_secs <= 0.0 {
        return Err(KaraokeError::input("audio duration must be finite and > 0"));
    }
    ensure_parent_dir(req.output)?;

    let partial = partial_output_path(req.output);
    let mut guard = PartialFileGuard {
        path: partial.clone(),
        committed: false,
    };

    let enc = &cfg.encode;
    let mut cmd = ffmpeg_command();
    cmd.arg("-i").arg(req.background);
    for clip in req.clips {
        cmd.arg("-i").arg(&clip.path);
    }
    cmd.arg("-i").arg(req.audio);
    let audio_input = req.clips.len() + 1;

    cmd.args([
        "-filter_complex",
        &overlay_filter_graph(req.clips),
        "-map",
        &format!("[{VIDEO_OUT_LABEL}]"),
        "-map",
        &format!("{audio_input}:a:0"),
        "-c:v",
        &enc.codec,
        "-preset",
        &enc.preset,
        "-b:v",
        &enc.bitrate,
        "-r",
        &cfg.render.fps.ffmpeg_rate(),
        "-c:a",
        &enc.audio_codec,
        "-threads",
        &enc.threads.to_string(),
        "-t",
        &format!("{:.6}", req.audio_duration_secs),
        "-movflags",
        "+faststart",
    ])
    .arg(&partial);

    run_ffmpeg(cmd, "final composite")?;
    verify_output(&partial)?;
    std::fs::rename(&partial, req.output).map_err(|e| {
        KaraokeError::resource(format!(
            "failed to move '{}' into place: {e}",
            req.output.display()
        ))
    })?;
    guard.committed = true;
    tracing::info!("final video written");
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/composite/composite.rs"]
mod tests;
