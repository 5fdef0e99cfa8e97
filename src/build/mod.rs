//! Per-line caption clips and the full-length background clip.

pub(crate) mod background;
pub(crate) mod segment;
