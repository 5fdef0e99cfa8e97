//! Caption frame rendering.

pub(crate) mod caption;
pub(crate) mod frame;
