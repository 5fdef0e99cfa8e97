use super::*;

#[test]
fn parses_interchange_json() {
    let set = LyricSet::from_json_str(
        r#"{"segments":[{"start":0,"end":2,"text":"Hello"},{"start":2,"end":4.5,"text":"World"}],"language":"en"}"#,
    )
    .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.language.as_deref(), Some("en"));
    assert_eq!(set.segments[1], LyricSegment::new(2.0, 4.5, "World"));
    assert_eq!(set.last_end_secs(), 4.5);
}

#[test]
fn language_is_optional() {
    let set = LyricSet::from_json_str(r#"{"segments":[]}"#).unwrap();
    assert!(set.is_empty());
    assert!(set.language.is_none());
    assert!(set.validate().is_ok());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = LyricSet::from_json_str(r#"{"segments":[{"start":0}]}"#).unwrap_err();
    assert!(matches!(err, KaraokeError::Serde(_)));
}

#[test]
fn validate_rejects_non_increasing_segments() {
    let set = LyricSet::new(vec![
        LyricSegment::new(0.0, 1.0, "ok"),
        LyricSegment::new(3.0, 3.0, "zero length"),
    ]);
    let err = set.validate().unwrap_err();
    assert!(matches!(err, KaraokeError::Input(_)));
    assert!(err.to_string().contains("segment 1"));

    assert!(LyricSegment::new(2.0, 1.0, "backwards").validate().is_err());
    assert!(LyricSegment::new(-1.0, 1.0, "negative").validate().is_err());
    assert!(LyricSegment::new(0.0, f64::INFINITY, "inf").validate().is_err());
}

#[test]
fn next_text_is_empty_after_last_line() {
    let set = LyricSet::new(vec![
        LyricSegment::new(0.0, 2.0, "Hello"),
        LyricSegment::new(2.0, 4.0, "World"),
    ]);
    assert_eq!(set.next_text(0), "World");
    assert_eq!(set.next_text(1), "");
}
