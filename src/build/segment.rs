use std::path::{Path, PathBuf};

use crate::config::JobConfig;
use crate::encode::sink::{FrameSink, SinkConfig, sink_for};
use crate::foundation::core::Fps;
use crate::foundation::error::KaraokeResult;
use crate::lyrics::LyricSegment;
use crate::render::caption::CaptionRenderer;

/// Encoded clip for one lyric line, placed on the final timeline at `start_offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentClip {
    /// Index of the lyric line.
    pub index: usize,
    /// Encoded clip.
    pub path: PathBuf,
    /// Absolute start on the output timeline, in seconds.
    pub start_offset: f64,
    /// Absolute end on the output timeline, in seconds.
    pub end_offset: f64,
    /// Frames in the clip.
    pub frame_count: u64,
}

/// Frames rendered for a segment: `max(round(duration * fps), 1)`.
pub fn segment_frame_count(segment: &LyricSegment, fps: Fps) -> u64 {
    fps.secs_to_frames_round(segment.duration_secs()).max(1)
}

/// Highlight progress of frame `i` out of `count`: `i / (count - 1)`, or 0 for a single frame.
///
/// The last frame is exactly 1.
pub fn progress_at(i: u64, count: u64) -> f64 {
    if count <= 1 {
        0.0
    } else {
        i as f64 / (count - 1) as f64
    }
}

/// Render every frame of `segment` into `sink`.
pub fn render_segment_frames(
    segment: &LyricSegment,
    next_text: &str,
    renderer: &mut dyn CaptionRenderer,
    sink: &mut dyn FrameSink,
    sink_cfg: SinkConfig,
) -> KaraokeResult<u64> {
    let count = segment_frame_count(segment, sink_cfg.fps);
    sink.begin(sink_cfg)?;
    for i in 0..count {
        let frame = renderer.render(&segment.text, progress_at(i, count), next_text)?;
        sink.push_frame(i, &frame)?;
    }
    sink.end()?;
    Ok(count)
}

/// Render and encode the clip for lyric line `index` under `work_dir`.
///
/// Frames go to a private `seg_NNNN` scratch directory, so distinct indices can build
/// concurrently.
#[tracing::instrument(skip_all, fields(index = index, start = segment.start, end = segment.end))]
pub fn build_segment(
    index: usize,
    segment: &LyricSegment,
    next_text: &str,
    renderer: &mut dyn CaptionRenderer,
    cfg: &JobConfig,
    work_dir: &Path,
) -> KaraokeResult<SegmentClip> {
    segment.validate()?;
    let path = work_dir.join(format!("segment_{index:04}.mp4"));
    let scratch = work_dir.join(format!("seg_{index:04}"));

    let mut sink = sink_for(&cfg.encode, &scratch, &path);
    let sink_cfg = SinkConfig {
        width: cfg.render.width,
        height: cfg.render.height,
        fps: cfg.render.fps,
    };
    let frame_count = render_segment_frames(segment, next_text, renderer, sink.as_mut(), sink_cfg)?;
    tracing::debug!(frame_count, path = %path.display(), "segment clip encoded");

    Ok(SegmentClip {
        index,
        path,
        start_offset: segment.start,
        end_offset: segment.end,
        frame_count,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/build/segment.rs"]
mod tests;
