use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};

use rayon::prelude::*;

use crate::build::background::build_background;
use crate::build::segment::{SegmentClip, build_segment};
use crate::composite::{CompositeRequest, compose};
use crate::config::threads_from_env;
use crate::encode::ffmpeg::is_ffmpeg_on_path;
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::media::{AudioInfo, probe_audio};
use crate::pipeline::job::{Job, WorkDir};
use crate::render::caption::{CpuCaptionRenderer, RendererFactory};
use crate::text::font::resolve_font;

/// Job lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Validating inputs; nothing on disk yet.
    Idle,
    /// Rendering and encoding one clip per lyric line.
    BuildingSegments,
    /// Encoding the background-only clip.
    BuildingBackground,
    /// Final composite and audio mux.
    Compositing,
    /// Output written.
    Done,
    /// Aborted; work dir removed, no output left behind.
    Failed,
}

impl Phase {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BuildingSegments => "building_segments",
            Self::BuildingBackground => "building_background",
            Self::Compositing => "compositing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress record published while a job runs.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobStatus {
    /// Current phase.
    pub phase: Phase,
    /// Overall progress, 0 to 100.
    pub percent: u8,
    /// Human-readable message.
    pub message: String,
    /// Failure message when `phase` is [`Phase::Failed`].
    pub error: Option<String>,
}

/// Structured job failure: the phase that failed and the original error.
#[derive(thiserror::Error, Debug)]
#[error("job failed while {phase}: {error}")]
pub struct JobFailure {
    /// Phase in which the error occurred.
    pub phase: Phase,
    /// Underlying error, unmodified.
    #[source]
    pub error: KaraokeError,
}

impl JobFailure {
    /// Attribute `error` to `phase`.
    pub fn new(phase: Phase, error: KaraokeError) -> Self {
        Self { phase, error }
    }

    /// Whether the job stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, KaraokeError::Cancelled)
    }
}

/// Result of a successful job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobOutput {
    /// Final video.
    pub output: PathBuf,
    /// Duration of the backing track (and the video) in seconds.
    pub duration_secs: f64,
    /// Number of lyric lines rendered.
    pub segments: usize,
}

/// Cancellation flag plus optional status channel shared with a running job.
#[derive(Clone, Debug, Default)]
pub struct JobControl {
    cancel: Arc<AtomicBool>,
    percent: Arc<AtomicU8>,
    status: Option<mpsc::Sender<JobStatus>>,
}

impl JobControl {
    /// Control with no status channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish status records into `tx`.
    pub fn with_status(mut self, tx: mpsc::Sender<JobStatus>) -> Self {
        self.status = Some(tx);
        self
    }

    /// Request cancellation. Honored between phases and between lyric lines.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn check_cancelled(&self) -> KaraokeResult<()> {
        if self.is_cancelled() {
            Err(KaraokeError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn publish(&self, phase: Phase, percent: u8, message: impl Into<String>) {
        let percent = percent.min(100);
        self.percent.store(percent, Ordering::Relaxed);
        let message = message.into();
        tracing::debug!(%phase, percent, "{message}");
        if let Some(tx) = self.status.as_ref() {
            let _ = tx.send(JobStatus {
                phase,
                percent,
                message,
                error: None,
            });
        }
    }

    fn enter(
        &self,
        phase: Phase,
        percent: u8,
        message: impl Into<String>,
    ) -> Result<(), JobFailure> {
        self.check_cancelled()
            .map_err(|e| JobFailure::new(phase, e))?;
        let message = message.into();
        tracing::info!(%phase, "{message}");
        self.publish(phase, percent, message);
        Ok(())
    }

    fn finish(&self, result: &Result<JobOutput, JobFailure>) {
        let status = match result {
            Ok(out) => JobStatus {
                phase: Phase::Done,
                percent: 100,
                message: format!("wrote {}", out.output.display()),
                error: None,
            },
            Err(failure) => JobStatus {
                phase: Phase::Failed,
                percent: self.percent.load(Ordering::Relaxed),
                message: format!("failed while {}", failure.phase),
                error: Some(failure.error.to_string()),
            },
        };
        if let Some(tx) = self.status.as_ref() {
            let _ = tx.send(status);
        }
    }
}

const SEGMENTS_START_PERCENT: u8 = 5;
const SEGMENTS_END_PERCENT: u8 = 75;
const BACKGROUND_PERCENT: u8 = 80;
const COMPOSITING_PERCENT: u8 = 85;

fn segment_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return SEGMENTS_END_PERCENT;
    }
    let span = usize::from(SEGMENTS_END_PERCENT - SEGMENTS_START_PERCENT);
    SEGMENTS_START_PERCENT + (span * done.min(total) / total) as u8
}

/// Run `job` with the CPU caption renderer and the resolved caption font.
#[tracing::instrument(skip_all, fields(audio = %job.audio.display(), output = %job.output.display()))]
pub fn run_job(job: &Job, ctl: &JobControl) -> Result<JobOutput, JobFailure> {
    let result = prepare(job, ctl).and_then(|audio| {
        let render_cfg = Arc::new(job.config.render.clone());
        let font =
            resolve_font(&render_cfg.fonts).map_err(|e| JobFailure::new(Phase::Idle, e))?;
        let factory = move || CpuCaptionRenderer::new(Arc::clone(&render_cfg), &font);
        execute(job, &audio, &factory, ctl)
    });
    ctl.finish(&result);
    result
}

/// Run `job` with renderers produced by `factory`.
#[tracing::instrument(skip_all, fields(audio = %job.audio.display(), output = %job.output.display()))]
pub fn run_job_with<F: RendererFactory>(
    job: &Job,
    factory: &F,
    ctl: &JobControl,
) -> Result<JobOutput, JobFailure> {
    let result = prepare(job, ctl).and_then(|audio| execute(job, &audio, factory, ctl));
    ctl.finish(&result);
    result
}

/// Validate everything that can be checked before touching the disk.
fn prepare(job: &Job, ctl: &JobControl) -> Result<AudioInfo, JobFailure> {
    let idle = |e: KaraokeError| JobFailure::new(Phase::Idle, e);
    ctl.enter(Phase::Idle, 0, "validating inputs")?;

    job.config.render.validate().map_err(idle)?;
    job.lyrics.validate().map_err(idle)?;
    let audio = probe_audio(&job.audio).map_err(idle)?;
    if !is_ffmpeg_on_path() {
        return Err(idle(KaraokeError::encode(
            "ffmpeg is required for encoding, but was not found on PATH",
        )));
    }
    let last_end = job.lyrics.last_end_secs();
    if last_end > audio.duration_secs {
        tracing::warn!(
            last_end,
            audio_secs = audio.duration_secs,
            "lyrics run past the end of the audio; trailing captions are cut"
        );
    }
    Ok(audio)
}

fn execute<F: RendererFactory>(
    job: &Job,
    audio: &AudioInfo,
    factory: &F,
    ctl: &JobControl,
) -> Result<JobOutput, JobFailure> {
    let work = match job.opts.work_root.as_deref() {
        Some(root) => WorkDir::create_in(root),
        None => WorkDir::create(),
    }
    .map_err(|e| JobFailure::new(Phase::Idle, e))?;

    let result = execute_phases(job, audio, factory, ctl, work.path());
    drop(work);
    result
}

fn execute_phases<F: RendererFactory>(
    job: &Job,
    audio: &AudioInfo,
    factory: &F,
    ctl: &JobControl,
    work: &Path,
) -> Result<JobOutput, JobFailure> {
    let total = job.lyrics.len();
    ctl.enter(
        Phase::BuildingSegments,
        SEGMENTS_START_PERCENT,
        format!("rendering {total} lyric lines"),
    )?;
    let clips = build_segments(job, factory, ctl, work)
        .map_err(|e| JobFailure::new(Phase::BuildingSegments, e))?;

    ctl.enter(
        Phase::BuildingBackground,
        BACKGROUND_PERCENT,
        format!("rendering {:.2}s background", audio.duration_secs),
    )?;
    let background = factory
        .create()
        .and_then(|mut renderer| {
            build_background(audio.duration_secs, &mut renderer, &job.config, work)
        })
        .map_err(|e| JobFailure::new(Phase::BuildingBackground, e))?;

    ctl.enter(
        Phase::Compositing,
        COMPOSITING_PERCENT,
        format!("compositing {} clips", clips.len()),
    )?;
    compose(
        &CompositeRequest {
            background: &background,
            clips: &clips,
            audio: &audio.path,
            audio_duration_secs: audio.duration_secs,
            output: &job.output,
        },
        &job.config,
    )
    .map_err(|e| JobFailure::new(Phase::Compositing, e))?;

    Ok(JobOutput {
        output: job.output.clone(),
        duration_secs: audio.duration_secs,
        segments: total,
    })
}

fn build_thread_pool(threads: Option<usize>) -> KaraokeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(KaraokeError::input("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("karaoke-seg-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| KaraokeError::resource(format!("failed to build rayon thread pool: {e}")))
}

/// Move a worker's setup error out, leaving a marker for the rest of its split.
fn take_setup_error<R>(slot: &mut KaraokeResult<R>) -> KaraokeError {
    match std::mem::replace(
        slot,
        Err(KaraokeError::render("renderer setup failed on this worker")),
    ) {
        Err(e) => e,
        Ok(_) => KaraokeError::render("renderer setup failed on this worker"),
    }
}

fn build_segments<F: RendererFactory>(
    job: &Job,
    factory: &F,
    ctl: &JobControl,
    work: &Path,
) -> KaraokeResult<Vec<SegmentClip>> {
    let segments = &job.lyrics.segments;
    let total = segments.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let built = AtomicUsize::new(0);
    let on_built = |clip: &SegmentClip| {
        let n = built.fetch_add(1, Ordering::Relaxed) + 1;
        ctl.publish(
            Phase::BuildingSegments,
            segment_percent(n, total),
            format!("built line {} ({n}/{total})", clip.index + 1),
        );
    };

    if !job.opts.parallel {
        let mut renderer = factory.create()?;
        let mut clips = Vec::with_capacity(total);
        for (i, segment) in segments.iter().enumerate() {
            ctl.check_cancelled()?;
            let clip = build_segment(
                i,
                segment,
                job.lyrics.next_text(i),
                &mut renderer,
                &job.config,
                work,
            )?;
            on_built(&clip);
            clips.push(clip);
        }
        return Ok(clips);
    }

    // Setup errors surface here unchanged, before any worker starts.
    drop(factory.create()?);
    let pool = build_thread_pool(job.opts.threads.or_else(threads_from_env))?;
    let results: Vec<KaraokeResult<SegmentClip>> = pool.install(|| {
        segments
            .par_iter()
            .enumerate()
            .map_init(
                || factory.create(),
                |renderer, (i, segment)| -> KaraokeResult<SegmentClip> {
                    ctl.check_cancelled()?;
                    let renderer = match renderer {
                        Ok(r) => r,
                        Err(_) => return Err(take_setup_error(renderer)),
                    };
                    let clip = build_segment(
                        i,
                        segment,
                        job.lyrics.next_text(i),
                        renderer,
                        &job.config,
                        work,
                    )?;
                    on_built(&clip);
                    Ok(clip)
                },
            )
            .collect()
    });

    let mut clips = results.into_iter().collect::<KaraokeResult<Vec<_>>>()?;
    clips.sort_by_key(|c| c.index);
    Ok(clips)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/controller.rs"]
mod tests;
