//! Karaoke video rendering core.
//!
//! Turns a backing track plus timed lyric lines into a video: every line is rendered as its own
//! clip whose characters progressively switch to the highlight color, with a dimmer preview of
//! the next line underneath. The clips are laid over a bare background and muxed with the audio
//! by the system `ffmpeg`.
//!
//! - Describe the input as a [`LyricSet`] and a [`JobConfig`]
//! - Run a [`Job`] synchronously with [`run_job`], or on a background thread with [`spawn_job`]
//! - Render single caption frames with a [`CpuCaptionRenderer`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod build;
pub(crate) mod composite;
/// Per-job configuration.
pub mod config;
pub(crate) mod encode;
/// Timed lyric input.
pub mod lyrics;
pub(crate) mod media;
/// Job orchestration.
pub mod pipeline;
pub(crate) mod render;
pub(crate) mod text;

pub use crate::foundation::core::{Canvas, Fps, Rgb8};
pub use crate::foundation::error::{KaraokeError, KaraokeResult};

pub use crate::build::background::build_background;
pub use crate::build::segment::{
    SegmentClip, build_segment, progress_at, render_segment_frames, segment_frame_count,
};
pub use crate::composite::{
    CompositeRequest, VIDEO_OUT_LABEL, compose, overlay_filter_graph, partial_output_path,
};
pub use crate::config::{EncodeSettings, IntermediateMode, JobConfig, RenderConfig};
pub use crate::encode::ffmpeg::{
    FfmpegPipeSink, ensure_parent_dir, is_ffmpeg_on_path, is_ffprobe_on_path,
};
pub use crate::encode::sink::{FrameSink, ImageSequenceSink, InMemorySink, SinkConfig};
pub use crate::lyrics::{LyricSegment, LyricSet};
pub use crate::media::{AudioInfo, probe_audio};
pub use crate::pipeline::controller::{
    JobControl, JobFailure, JobOutput, JobStatus, Phase, run_job, run_job_with,
};
pub use crate::pipeline::job::{Job, PipelineOpts, WorkDir};
pub use crate::pipeline::task::{JobHandle, spawn_job, spawn_job_with};
pub use crate::render::caption::{
    CaptionRenderer, CpuCaptionRenderer, RendererFactory, plan_highlight,
};
pub use crate::render::frame::Frame;
pub use crate::text::font::{
    FontHandle, FontOrigin, builtin_font_candidates, resolve_font, system_sans_serif,
};
pub use crate::text::wrap::{TextMeasure, wrap_text, wrapped_char_count};
