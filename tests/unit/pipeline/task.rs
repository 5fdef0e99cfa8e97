use super::*;
use crate::lyrics::{LyricSegment, LyricSet};
use crate::pipeline::job::PipelineOpts;
use std::path::PathBuf;

fn missing_audio_job(name: &str) -> Job {
    let root = PathBuf::from("target").join("unit_task").join(name);
    Job::new(
        root.join("missing.wav"),
        LyricSet::new(vec![LyricSegment::new(0.0, 1.0, "la")]),
        root.join("out.mp4"),
    )
    .with_opts(PipelineOpts {
        work_root: Some(root.join("work")),
        ..PipelineOpts::default()
    })
}

#[test]
fn failing_job_reports_failed_status_and_error() {
    let mut handle = spawn_job(missing_audio_job("failing")).unwrap();
    let statuses: Vec<JobStatus> = handle.status().iter().collect();
    let last = statuses.last().unwrap();
    assert_eq!(last.phase, Phase::Failed);
    assert!(last.error.is_some());
    assert_eq!(handle.poll().map(|s| s.phase), None);

    let failure = handle.join().unwrap_err();
    assert_eq!(failure.phase, Phase::Idle);
    assert!(matches!(failure.error, KaraokeError::Input(_)));
}

#[test]
fn poll_keeps_latest_status() {
    let mut handle = spawn_job(missing_audio_job("poll")).unwrap();
    while !handle.is_finished() {
        std::thread::yield_now();
    }
    assert_eq!(handle.poll().map(|s| s.phase), Some(Phase::Failed));
    assert_eq!(handle.poll().map(|s| s.phase), Some(Phase::Failed));
    assert!(handle.join().is_err());
}
