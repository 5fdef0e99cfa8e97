use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::pipeline::controller::{
    JobControl, JobFailure, JobOutput, JobStatus, Phase, run_job, run_job_with,
};
use crate::pipeline::job::Job;
use crate::render::caption::RendererFactory;

/// Handle to a job running on its own thread.
///
/// Status records arrive in order and the channel closes once the terminal record has been
/// sent.
pub struct JobHandle {
    status: mpsc::Receiver<JobStatus>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<Result<JobOutput, JobFailure>>,
    latest: Option<JobStatus>,
}

impl JobHandle {
    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Status stream.
    pub fn status(&self) -> &mpsc::Receiver<JobStatus> {
        &self.status
    }

    /// Drain pending status records and return the most recent one seen so far.
    pub fn poll(&mut self) -> Option<&JobStatus> {
        if let Some(last) = self.status.try_iter().last() {
            self.latest = Some(last);
        }
        self.latest.as_ref()
    }

    /// Whether the job thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job to end.
    pub fn join(self) -> Result<JobOutput, JobFailure> {
        self.thread.join().unwrap_or_else(|_| {
            Err(JobFailure::new(
                Phase::Failed,
                KaraokeError::Other(anyhow::anyhow!("job thread panicked")),
            ))
        })
    }
}

fn spawn_with(
    run: impl FnOnce(&JobControl) -> Result<JobOutput, JobFailure> + Send + 'static,
) -> KaraokeResult<JobHandle> {
    let (tx, rx) = mpsc::channel();
    let ctl = JobControl::new().with_status(tx);
    let cancel = ctl.cancel_flag();

    let thread = std::thread::Builder::new()
        .name("karaoke-job".to_owned())
        .spawn(move || run(&ctl))
        .map_err(|e| KaraokeError::resource(format!("failed to spawn job thread: {e}")))?;

    Ok(JobHandle {
        status: rx,
        cancel,
        thread,
        latest: None,
    })
}

/// Run `job` on a background thread with the CPU caption renderer.
pub fn spawn_job(job: Job) -> KaraokeResult<JobHandle> {
    spawn_with(move |ctl| run_job(&job, ctl))
}

/// Run `job` on a background thread with renderers from `factory`.
pub fn spawn_job_with<F>(job: Job, factory: F) -> KaraokeResult<JobHandle>
where
    F: RendererFactory + Send + 'static,
{
    spawn_with(move |ctl| run_job_with(&job, &factory, ctl))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/task.rs"]
mod tests;
