use super::*;
use crate::encode::ffmpeg::is_ffmpeg_on_path;
use crate::foundation::core::{Canvas, Rgb8};

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::default(),
    }
}

fn frame(width: u32, height: u32) -> Frame {
    Frame::solid(Canvas { width, height }, Rgb8::WHITE)
}

#[test]
fn in_memory_sink_collects_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(0, &frame(2, 2)).unwrap();
    sink.push_frame(1, &frame(2, 2)).unwrap();
    sink.end().unwrap();
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config(), Some(cfg(2, 2)));
    assert!(sink.is_finished());
}

#[test]
fn in_memory_sink_rejects_out_of_order_and_mismatched_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(3, &frame(2, 2)).unwrap();
    assert!(sink.push_frame(3, &frame(2, 2)).is_err());
    assert!(sink.push_frame(4, &frame(4, 2)).is_err());
}

#[test]
fn in_memory_sink_requires_begin() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(0, &frame(2, 2)).is_err());
}

#[test]
fn image_sequence_sink_requires_contiguous_indices() {
    let dir = PathBuf::from("target").join("unit_sink").join("gaps");
    let mut sink = ImageSequenceSink::new(
        dir.join("frames"),
        dir.join("out.mp4"),
        &EncodeSettings::default(),
    );
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(0, &frame(2, 2)).unwrap();
    assert!(sink.frame_path(0).is_file());
    assert!(sink.push_frame(2, &frame(2, 2)).is_err());
    drop(sink);
    assert!(!dir.join("frames").exists());
}

#[test]
fn image_sequence_sink_with_no_frames_fails_on_end() {
    let dir = PathBuf::from("target").join("unit_sink").join("empty");
    let mut sink = ImageSequenceSink::new(
        dir.join("frames"),
        dir.join("out.mp4"),
        &EncodeSettings::default(),
    );
    sink.begin(cfg(2, 2)).unwrap();
    assert!(sink.end().is_err());
}

#[test]
fn image_sequence_sink_encodes_and_cleans_up() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = PathBuf::from("target").join("unit_sink").join("encode");
    let out = dir.join("out.mp4");
    let _ = std::fs::remove_file(&out);

    let mut sink = ImageSequenceSink::new(dir.join("frames"), &out, &EncodeSettings::default());
    sink.begin(cfg(16, 16)).unwrap();
    for i in 0..4 {
        sink.push_frame(i, &frame(16, 16)).unwrap();
    }
    sink.end().unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!dir.join("frames").exists());
}
