//! Shared primitives: time/canvas/color types, the error taxonomy, and pixel math.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
