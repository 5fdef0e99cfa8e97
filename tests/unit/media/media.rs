use super::*;

fn parse(json: &str) -> ProbeOut {
    serde_json::from_str(json).unwrap()
}

#[test]
fn missing_file_is_input_error() {
    let err = probe_audio(Path::new("target/definitely/missing.mp3")).unwrap_err();
    assert!(matches!(err, KaraokeError::Input(_)));
}

#[test]
fn prefers_format_duration_over_stream() {
    let out = parse(
        r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "png"},
                {"codec_type": "audio", "codec_name": "mp3", "duration": "1.0"}
            ],
            "format": {"duration": "183.456000"}
        }"#,
    );
    let info = audio_info_from_probe(Path::new("song.mp3"), out).unwrap();
    assert!((info.duration_secs - 183.456).abs() < 1e-9);
    assert_eq!(info.path, PathBuf::from("song.mp3"));
}

#[test]
fn falls_back_to_stream_duration() {
    let out = parse(r#"{"streams": [{"codec_type": "audio", "duration": "4.5"}], "format": {}}"#);
    let info = audio_info_from_probe(Path::new("a.wav"), out).unwrap();
    assert_eq!(info.duration_secs, 4.5);
}

#[test]
fn no_audio_stream_is_input_error() {
    let out = parse(r#"{"streams": [{"codec_type": "video"}], "format": {"duration": "3"}}"#);
    assert!(matches!(
        audio_info_from_probe(Path::new("v.mp4"), out),
        Err(KaraokeError::Input(_))
    ));
}

#[test]
fn zero_duration_is_input_error() {
    let out = parse(r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "0.0"}}"#);
    assert!(matches!(
        audio_info_from_probe(Path::new("a.wav"), out),
        Err(KaraokeError::Input(_))
    ));
}
