use super::*;
use crate::foundation::core::{Canvas, Rgb8};
use crate::lyrics::{LyricSegment, LyricSet};
use crate::pipeline::job::PipelineOpts;
use crate::render::caption::CaptionRenderer;
use crate::render::frame::Frame;

struct Blank;

impl CaptionRenderer for Blank {
    fn render(&mut self, _: &str, _: f64, _: &str) -> KaraokeResult<Frame> {
        Ok(Frame::solid(Canvas { width: 1920, height: 1080 }, Rgb8::BLACK))
    }
}

fn blank_factory() -> impl RendererFactory<Renderer = Blank> {
    || -> KaraokeResult<Blank> { Ok(Blank) }
}

fn job_in(name: &str, lyrics: LyricSet) -> (Job, PathBuf) {
    let root = PathBuf::from("target").join("unit_controller").join(name);
    let _ = std::fs::remove_dir_all(&root);
    let job = Job::new(root.join("missing.mp3"), lyrics, root.join("out.mp4")).with_opts(
        PipelineOpts {
            work_root: Some(root.join("work")),
            ..PipelineOpts::default()
        },
    );
    (job, root)
}

fn drain(rx: &mpsc::Receiver<JobStatus>) -> Vec<JobStatus> {
    rx.try_iter().collect()
}

#[test]
fn phase_names_and_terminal_states() {
    assert_eq!(Phase::BuildingSegments.to_string(), "building_segments");
    assert!(Phase::Done.is_terminal());
    assert!(Phase::Failed.is_terminal());
    assert!(!Phase::Compositing.is_terminal());
}

#[test]
fn segment_percent_stays_inside_its_band() {
    assert_eq!(segment_percent(0, 10), SEGMENTS_START_PERCENT);
    assert_eq!(segment_percent(10, 10), SEGMENTS_END_PERCENT);
    assert_eq!(segment_percent(20, 10), SEGMENTS_END_PERCENT);
    assert_eq!(segment_percent(0, 0), SEGMENTS_END_PERCENT);
    assert!(segment_percent(5, 10) > SEGMENTS_START_PERCENT);
}

#[test]
fn control_publishes_and_cancels() {
    let (tx, rx) = mpsc::channel();
    let ctl = JobControl::new().with_status(tx);
    ctl.publish(Phase::BuildingSegments, 150, "hello");
    let got = drain(&rx);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].percent, 100);
    assert_eq!(got[0].message, "hello");

    assert!(!ctl.is_cancelled());
    ctl.clone().cancel();
    assert!(ctl.is_cancelled());
    assert!(matches!(ctl.check_cancelled(), Err(KaraokeError::Cancelled)));
}

#[test]
fn missing_audio_fails_in_idle_without_work_dir() {
    let lyrics = LyricSet::new(vec![LyricSegment::new(0.0, 1.0, "hi")]);
    let (job, root) = job_in("missing_audio", lyrics);
    let (tx, rx) = mpsc::channel();
    let ctl = JobControl::new().with_status(tx);

    let failure = run_job_with(&job, &blank_factory(), &ctl).unwrap_err();
    assert_eq!(failure.phase, Phase::Idle);
    assert!(matches!(failure.error, KaraokeError::Input(_)));
    assert!(!root.join("work").exists());
    assert!(!job.output.exists());

    let statuses = drain(&rx);
    assert_eq!(statuses.first().map(|s| s.phase), Some(Phase::Idle));
    let last = statuses.last().unwrap();
    assert_eq!(last.phase, Phase::Failed);
    assert!(last.error.as_deref().unwrap().contains("input error"));
}

#[test]
fn malformed_segment_is_an_input_error() {
    let lyrics = LyricSet::new(vec![LyricSegment::new(3.0, 3.0, "zero length")]);
    let (job, _) = job_in("malformed", lyrics);
    let failure = run_job_with(&job, &blank_factory(), &JobControl::new()).unwrap_err();
    assert_eq!(failure.phase, Phase::Idle);
    assert!(matches!(failure.error, KaraokeError::Input(_)));
}

#[test]
fn cancelled_before_start_does_nothing() {
    let (job, root) = job_in("cancel_early", LyricSet::default());
    let ctl = JobControl::new();
    ctl.cancel();
    let failure = run_job_with(&job, &blank_factory(), &ctl).unwrap_err();
    assert!(failure.is_cancelled());
    assert!(!root.join("work").exists());
}

#[test]
fn failure_exposes_original_error_as_source() {
    let failure = JobFailure::new(Phase::Compositing, KaraokeError::encode("exit 1: boom"));
    assert_eq!(
        failure.to_string(),
        "job failed while compositing: encode error: exit 1: boom"
    );
    let source = std::error::Error::source(&failure).unwrap();
    let inner = source.downcast_ref::<KaraokeError>().unwrap();
    assert_eq!(inner.kind(), "encode");
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(1)).is_ok());
}

#[test]
fn renderer_setup_error_is_identical_in_both_build_modes() {
    let failing = || -> KaraokeResult<Blank> { Err(KaraokeError::input("bad font config")) };
    let lyrics = LyricSet::new(vec![
        LyricSegment::new(0.0, 1.0, "one"),
        LyricSegment::new(1.0, 2.0, "two"),
    ]);
    let (sequential, root) = job_in("setup_error", lyrics);
    let parallel = sequential.clone().with_opts(PipelineOpts {
        parallel: true,
        threads: Some(2),
        work_root: Some(root.join("work")),
    });
    let ctl = JobControl::new();
    let work = root.join("work");

    let seq = build_segments(&sequential, &failing, &ctl, &work).unwrap_err();
    let par = build_segments(&parallel, &failing, &ctl, &work).unwrap_err();
    assert_eq!(seq.kind(), "input");
    assert_eq!(par.kind(), seq.kind());
    assert_eq!(par.to_string(), seq.to_string());
}

#[test]
fn worker_setup_error_is_moved_out_unchanged() {
    let mut slot: KaraokeResult<Blank> = Err(KaraokeError::input("bad font config"));
    let err = take_setup_error(&mut slot);
    assert_eq!(err.to_string(), "input error: bad font config");
    assert_eq!(take_setup_error(&mut slot).kind(), "render");
}
