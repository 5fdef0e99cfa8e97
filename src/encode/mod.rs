//! Encoding sinks and `ffmpeg` process plumbing.
//!
//! Sinks consume rendered caption frames in order and leave an intermediate clip on disk.

/// `ffmpeg` invocation helpers and the raw-pipe sink.
pub(crate) mod ffmpeg;
/// Frame sink trait and the image-sequence and in-memory sinks.
pub(crate) mod sink;
