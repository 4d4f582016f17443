//! Word wrapping and wrapped-height measurement.

use crate::font_metrics::FontMetrics;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

pub fn line_height(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Greedy word wrap. Words are appended to the current line while the
/// measured width stays within `max_width`. A single word that is too
/// wide for an entire line on its own is force-split character by
/// character, so pathological unbroken tokens cannot overflow the box.
///
/// Empty input yields exactly one empty line, never zero lines.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32, metrics: &FontMetrics) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if metrics.string_width(word, font_size) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = split_long_word(word, font_size, max_width, metrics, &mut lines);
            continue;
        }

        let tentative = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if metrics.string_width(&tentative, font_size) > max_width && !current.is_empty() {
            lines.push(current);
            current = word.to_string();
        } else {
            current = tentative;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Push full-width chunks of an overlong word, returning the leftover
/// piece as the new current line.
fn split_long_word(
    word: &str,
    font_size: f32,
    max_width: f32,
    metrics: &FontMetrics,
    lines: &mut Vec<String>,
) -> String {
    let mut piece = String::new();
    for ch in word.chars() {
        let mut tentative = piece.clone();
        tentative.push(ch);
        if !piece.is_empty() && metrics.string_width(&tentative, font_size) > max_width {
            lines.push(std::mem::take(&mut piece));
            piece.push(ch);
        } else {
            piece = tentative;
        }
    }
    piece
}

/// Rendered height of a wrapped paragraph. Empty text still occupies
/// one line.
pub fn wrapped_height(text: &str, font_size: f32, max_width: f32, metrics: &FontMetrics) -> f32 {
    wrap_text(text, font_size, max_width, metrics).len() as f32 * line_height(font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 500 units per char at 10pt = 5pt per char.
    fn metrics() -> FontMetrics {
        FontMetrics::fixed(500)
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let lines = wrap_text("hello world", 10.0, 100.0, &metrics());
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn wraps_at_word_boundaries_in_order() {
        // 10 chars fit per line (50pt / 5pt).
        let lines = wrap_text("aaaa bbbb cccc dddd", 10.0, 50.0, &metrics());
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn rejoined_lines_reproduce_the_text() {
        let input = "the quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_text(input, 10.0, 60.0, &metrics());
        assert_eq!(lines.join(" "), input);
        for line in &lines {
            assert!(metrics().string_width(line, 10.0) <= 60.0);
        }
    }

    #[test]
    fn overlong_word_is_split_by_characters() {
        // 6 chars per line; an 11-char token must break mid-word.
        let lines = wrap_text("abcdefghijk", 10.0, 30.0, &metrics());
        assert_eq!(lines, vec!["abcdef", "ghijk"]);
        // Concatenating (no spaces at forced splits) restores the token.
        assert_eq!(lines.concat(), "abcdefghijk");
    }

    #[test]
    fn overlong_word_after_normal_words() {
        let lines = wrap_text("ok abcdefghijk done", 10.0, 30.0, &metrics());
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "abcdef");
        assert_eq!(lines[2], "ghijk");
        assert_eq!(lines[3], "done");
    }

    #[test]
    fn empty_text_is_one_line_high() {
        let lines = wrap_text("", 10.0, 100.0, &metrics());
        assert_eq!(lines, vec![""]);
        let h = wrapped_height("", 10.0, 100.0, &metrics());
        assert!((h - 12.0).abs() < 0.001);
    }

    #[test]
    fn wrapped_height_counts_lines() {
        let h = wrapped_height("aaaa bbbb cccc dddd", 10.0, 50.0, &metrics());
        assert!((h - 24.0).abs() < 0.001);
    }
}
