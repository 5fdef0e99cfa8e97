use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{JobConfig, temp_base_dir};
use crate::foundation::error::{KaraokeError, KaraokeResult};
use crate::lyrics::LyricSet;

/// Options controlling how a job schedules its work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineOpts {
    /// Build per-line clips concurrently on a dedicated rayon pool.
    pub parallel: bool,
    /// Worker threads for parallel builds. `None` uses `KARAOKE_THREADS`, then rayon defaults.
    pub threads: Option<usize>,
    /// Base directory for the job work dir. `None` uses [`temp_base_dir`].
    pub work_root: Option<PathBuf>,
}

/// One render request: backing track, timed lyrics, destination, and settings.
#[derive(Clone, Debug)]
pub struct Job {
    /// Backing track.
    pub audio: PathBuf,
    /// Timed caption lines.
    pub lyrics: LyricSet,
    /// Final video path.
    pub output: PathBuf,
    /// Render and encode settings, immutable for the job.
    pub config: JobConfig,
    /// Scheduling options.
    pub opts: PipelineOpts,
}

impl Job {
    /// Job with default settings.
    pub fn new(audio: impl Into<PathBuf>, lyrics: LyricSet, output: impl Into<PathBuf>) -> Self {
        Self {
            audio: audio.into(),
            lyrics,
            output: output.into(),
            config: JobConfig::default(),
            opts: PipelineOpts::default(),
        }
    }

    /// Replace the job settings.
    pub fn with_config(mut self, config: JobConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the scheduling options.
    pub fn with_opts(mut self, opts: PipelineOpts) -> Self {
        self.opts = opts;
        self
    }
}

static WORK_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Uniquely named scratch directory owned by one job, removed on drop.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Create a fresh directory under [`temp_base_dir`].
    pub fn create() -> KaraokeResult<Self> {
        Self::create_in(&temp_base_dir())
    }

    /// Create a fresh directory under `base`.
    pub fn create_in(base: &Path) -> KaraokeResult<Self> {
        std::fs::create_dir_all(base).map_err(|e| {
            KaraokeError::resource(format!(
                "failed to create work dir base '{}': {e}",
                base.display()
            ))
        })?;

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = WORK_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = base.join(format!("karaoke_{}_{nanos}_{seq}", std::process::id()));

        std::fs::create_dir(&path).map_err(|e| {
            KaraokeError::resource(format!(
                "failed to create work dir '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "work dir created");
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, reporting failure.
    pub fn close(mut self) -> KaraokeResult<()> {
        self.removed = true;
        std::fs::remove_dir_all(&self.path).map_err(|e| {
            KaraokeError::resource(format!(
                "failed to remove work dir '{}': {e}",
                self.path.display()
            ))
        })
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), "failed to remove work dir: {e}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
