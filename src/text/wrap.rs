use crate::foundation::error::KaraokeResult;

/// Measures rendered line widths in pixels.
pub trait TextMeasure {
    /// Width of `text` when drawn on a single line.
    fn text_width(&mut self, text: &str) -> KaraokeResult<f32>;
}

/// Greedy word wrap.
///
/// Words are split on whitespace and appended to the current line while the joined line still
/// fits within `max_width_px`. A single word wider than the limit gets a line of its own. Text
/// without any words comes back unchanged as one line, so the result is never empty.
pub fn wrap_text(
    text: &str,
    max_width_px: f32,
    measure: &mut dyn TextMeasure,
) -> KaraokeResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&candidate)? <= max_width_px {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_owned();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(text.to_owned());
    }
    Ok(lines)
}

/// Number of characters in the wrapped stream, counting one separator between lines.
pub fn wrapped_char_count(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|l| l.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
