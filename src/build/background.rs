use std::path::{Path, PathBuf};

use crate::config::JobConfig;
use crate::encode::ffmpeg::encode_still;
use crate::foundation::error::KaraokeResult;
use crate::render::caption::CaptionRenderer;

/// Encode a background-only clip covering `duration_secs` under `work_dir`.
#[tracing::instrument(skip_all, fields(duration_secs = duration_secs))]
pub fn build_background(
    duration_secs: f64,
    renderer: &mut dyn CaptionRenderer,
    cfg: &JobConfig,
    work_dir: &Path,
) -> KaraokeResult<PathBuf> {
    let frame = renderer.render("", 0.0, "")?;
    let png = work_dir.join("background.png");
    frame.save_png(&png)?;

    let out = work_dir.join("background.mp4");
    encode_still(&png, duration_secs, cfg.render.fps, &cfg.encode, &out)?;
    if let Err(e) = std::fs::remove_file(&png) {
        tracing::debug!("failed to remove background still: {e}");
    }
    Ok(out)
}
