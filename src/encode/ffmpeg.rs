use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::config::EncodeSettings;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::Fps;
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::render::frame::Frame;

/// `ffmpeg` with overwrite and quiet logging preset.
pub(crate) fn ffmpeg_command() -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
    cmd
}

/// Run `cmd` to completion, mapping spawn failures and non-zero exits to encode errors.
pub(crate) fn run_ffmpeg(mut cmd: Command, what: &str) -> KaraokeResult<()> {
    tracing::debug!(?cmd, "{what}");
    let out = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            KaraokeError::encode(format!(
                "failed to spawn ffmpeg for {what} (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(KaraokeError::encode(format!(
            "ffmpeg {what} exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// Fail unless `path` exists and is non-empty.
pub(crate) fn verify_output(path: &Path) -> KaraokeResult<()> {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() > 0 => Ok(()),
        Ok(_) => Err(KaraokeError::encode(format!(
            "encoder produced an empty output '{}'",
            path.display()
        ))),
        Err(e) => Err(KaraokeError::encode(format!(
            "encoder output '{}' is unreadable: {e}",
            path.display()
        ))),
    }
}

/// Encode a still PNG into a clip of `duration_secs` at `fps`.
#[tracing::instrument(
    skip_all,
    fields(png = %png.display(), out = %out_path.display(), duration_secs = duration_secs)
)]
pub(crate) fn encode_still(
    png: &Path,
    duration_secs: f64,
    fps: Fps,
    encode: &EncodeSettings,
    out_path: &Path,
) -> KaraokeResult<()> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(KaraokeError::input(format!(
            "still clip duration must be finite and > 0, got {duration_secs}"
        )));
    }
    let rate = fps.ffmpeg_rate();
    let mut cmd = ffmpeg_command();
    cmd.args(["-loop", "1", "-framerate", &rate, "-i"])
        .arg(png)
        .args([
            "-t",
            &format!("{duration_secs:.6}"),
            "-c:v",
            &encode.intermediate_codec,
            "-pix_fmt",
            "yuv420p",
            "-preset",
            &encode.intermediate_preset,
            "-r",
            &rate,
            "-an",
        ])
        .arg(out_path);
    run_ffmpeg(cmd, "still encode")?;
    verify_output(out_path)
}

/// Sink that spawns `ffmpeg` and streams raw RGB frames to its stdin.
pub struct FfmpegPipeSink {
    out_path: PathBuf,
    codec: String,
    preset: String,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<u64>,
}

impl FfmpegPipeSink {
    /// Sink encoding to `out_path` with the intermediate codec settings of `encode`.
    pub fn new(out_path: impl Into<PathBuf>, encode: &EncodeSettings) -> Self {
        Self {
            out_path: out_path.into(),
            codec: encode.intermediate_codec.clone(),
            preset: encode.intermediate_preset.clone(),
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegPipeSink {
    fn begin(&mut self, cfg: SinkConfig) -> KaraokeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KaraokeError::encode(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KaraokeError::encode(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        ensure_parent_dir(&self.out_path)?;

        let mut cmd = ffmpeg_command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            // Input rate for rawvideo goes before `-i`.
            "-r",
            &cfg.fps.ffmpeg_rate(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &self.codec,
            "-pix_fmt",
            "yuv420p",
            "-preset",
            &self.preset,
        ])
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            KaraokeError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KaraokeError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KaraokeError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> KaraokeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KaraokeError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(KaraokeError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(KaraokeError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KaraokeError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            KaraokeError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> KaraokeResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KaraokeError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            KaraokeError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KaraokeError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| KaraokeError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(KaraokeError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        verify_output(&self.out_path)
    }
}

impl Drop for FfmpegPipeSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> KaraokeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
