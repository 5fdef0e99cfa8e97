use super::*;

fn clip(index: usize, start: f64, end: f64) -> SegmentClip {
    SegmentClip {
        index,
        path: PathBuf::from(format!("segment_{index:04}.mp4")),
        start_offset: start,
        end_offset: end,
        frame_count: 30,
    }
}

#[test]
fn empty_graph_passes_background_through() {
    assert_eq!(overlay_filter_graph(&[]), "[0:v]format=yuv420p[vout]");
}

#[test]
fn clips_are_shifted_and_windowed() {
    let graph = overlay_filter_graph(&[clip(0, 1.0, 3.0)]);
    assert_eq!(
        graph,
        "[1:v]setpts=PTS-STARTPTS+1.000000/TB[s0];\
         [0:v][s0]overlay=eof_action=pass:enable='between(t,1.000000,3.000000)'[v0];\
         [v0]format=yuv420p[vout]"
    );
}

#[test]
fn later_clips_overlay_on_top_of_earlier_ones() {
    let graph = overlay_filter_graph(&[clip(0, 1.0, 3.0), clip(1, 2.0, 4.0)]);
    let first = graph.find("[0:v][s0]overlay").unwrap();
    let second = graph.find("[v0][s1]overlay").unwrap();
    assert!(first < second);
    assert!(graph.contains("[2:v]setpts=PTS-STARTPTS+2.000000/TB[s1]"));
    assert!(graph.ends_with("[v1]format=yuv420p[vout]"));
}

#[test]
fn partial_path_is_a_sibling() {
    assert_eq!(
        partial_output_path(Path::new("out/song.mp4")),
        PathBuf::from("out/song.partial.mp4")
    );
    assert_eq!(
        partial_output_path(Path::new("video")),
        PathBuf::from("video.partial")
    );
}

#[test]
fn compose_rejects_bad_audio_duration() {
    let req = CompositeRequest {
        background: Path::new("bg.mp4"),
        clips: &[],
        audio: Path::new("a.mp3"),
        audio_duration_secs: 0.0,
        output: Path::new("target/unit_composite/out.mp4"),
    };
    assert!(matches!(
        compose(&req, &JobConfig::default()),
        Err(KaraokeError::Input(_))
    ));
}

#[test]
fn failed_encode_leaves_no_output() {
    if !crate::encode::ffmpeg::is_ffmpeg_on_path() {
        return;
    }
    let out = PathBuf::from("target").join("unit_composite").join("broken.mp4");
    let _ = std::fs::remove_file(&out);
    let req = CompositeRequest {
        background: Path::new("target/unit_composite/missing_bg.mp4"),
        clips: &[],
        audio: Path::new("target/unit_composite/missing.mp3"),
        audio_duration_secs: 1.0,
        output: &out,
    };
    let err = compose(&req, &JobConfig::default()).unwrap_err();
    assert!(matches!(err, KaraokeError::Encode(_)));
    assert!(!out.exists());
    assert!(!partial_output_path(&out).exists());
}
