use super::*;

#[test]
fn garbage_bytes_are_a_render_error() {
    let err = FontHandle::from_bytes(vec![0u8; 64], FontOrigin::System).unwrap_err();
    assert!(matches!(err, KaraokeError::Render(_)));
}

#[test]
fn missing_font_file_is_reported() {
    assert!(FontHandle::from_path(Path::new("target/definitely/missing.ttf")).is_err());
}

#[test]
fn builtin_candidates_are_non_empty() {
    assert!(!builtin_font_candidates().is_empty());
}

#[test]
fn unusable_configured_fonts_fall_through() {
    // Only meaningful where some font exists; otherwise resolution legitimately fails.
    let bogus = vec![PathBuf::from("target/nope/a.ttf"), PathBuf::from("target/nope/b.otf")];
    match resolve_font(&bogus) {
        Ok(font) => {
            assert!(!(*font.shared_bytes()).as_ref().is_empty());
            assert_ne!(font.origin(), &FontOrigin::File(PathBuf::from("target/nope/a.ttf")));
        }
        Err(e) => assert!(matches!(e, KaraokeError::Render(_))),
    }
}

#[test]
fn glyph_fonts_share_the_loaded_bytes() {
    let Ok(font) = resolve_font(&[]) else {
        return;
    };
    let a = font.to_glyph_font();
    let b = font.clone().to_glyph_font();
    let shared = font.shared_bytes();
    let base = (*shared).as_ref().as_ptr();
    assert_eq!(a.data.data().as_ptr(), base);
    assert_eq!(b.data.data().as_ptr(), base);
    assert_eq!(a.index, b.index);
}
