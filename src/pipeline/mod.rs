//! Job orchestration: validation, per-line clips, background, final composite.
//!
//! A job moves through [`Phase::Idle`], [`Phase::BuildingSegments`],
//! [`Phase::BuildingBackground`], [`Phase::Compositing`] and ends in [`Phase::Done`] or
//! [`Phase::Failed`]. Each job owns a private [`WorkDir`] that is removed when the job ends,
//! whatever the outcome.

pub(crate) mod controller;
pub(crate) mod job;
pub(crate) mod task;

pub use controller::Phase;
pub use job::WorkDir;
