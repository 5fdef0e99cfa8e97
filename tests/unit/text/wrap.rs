use super::*;

/// Every character is 10px wide.
struct Mono;

impl TextMeasure for Mono {
    fn text_width(&mut self, text: &str) -> KaraokeResult<f32> {
        Ok(text.chars().count() as f32 * 10.0)
    }
}

#[test]
fn fits_on_one_line() {
    let lines = wrap_text("hello world", 200.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["hello world"]);
}

#[test]
fn breaks_between_words() {
    // "aaa bbb" is 70px, "aaa bbb ccc" is 110px.
    let lines = wrap_text("aaa bbb ccc ddd", 70.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
}

#[test]
fn exact_fit_is_allowed() {
    let lines = wrap_text("abcde fghij", 110.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["abcde fghij"]);
}

#[test]
fn oversized_word_gets_its_own_line() {
    let lines = wrap_text("hi supercalifragilistic yo", 50.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
}

#[test]
fn collapses_repeated_whitespace() {
    let lines = wrap_text("  one \t two  ", 1000.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["one two"]);
}

#[test]
fn wordless_text_is_returned_as_is() {
    assert_eq!(wrap_text("", 10.0, &mut Mono).unwrap(), vec![""]);
    assert_eq!(wrap_text("   ", 10.0, &mut Mono).unwrap(), vec!["   "]);
}

#[test]
fn multibyte_words_wrap_by_width() {
    let lines = wrap_text("আমার সোনার বাংলা", 100.0, &mut Mono).unwrap();
    assert_eq!(lines, vec!["আমার সোনার", "বাংলা"]);
}

#[test]
fn char_count_includes_line_separators() {
    let lines = vec!["ab".to_owned(), "cde".to_owned()];
    assert_eq!(wrapped_char_count(&lines), 6);
    assert_eq!(wrapped_char_count(&[]), 0);
}

#[test]
fn measure_errors_propagate() {
    struct Broken;
    impl TextMeasure for Broken {
        fn text_width(&mut self, _: &str) -> KaraokeResult<f32> {
            Err(crate::foundation::error::KaraokeError::render("boom"))
        }
    }
    assert!(wrap_text("a b", 10.0, &mut Broken).is_err());
}
