use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(KaraokeError::input("x").to_string().contains("input error:"));
    assert!(
        KaraokeError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        KaraokeError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        KaraokeError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        KaraokeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(KaraokeError::Cancelled.to_string(), "job cancelled");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KaraokeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), "other");
}
