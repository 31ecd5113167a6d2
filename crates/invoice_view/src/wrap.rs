//! Greedy line wrapping at Unicode line break opportunities (UAX #14)

use capture_engine::{FontSpec, TextMeasure};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Split `text` into lines no wider than `max_width`.
///
/// Explicit newlines always break. A single word wider than the line is
/// split between characters. Trailing whitespace is dropped from each line.
/// Empty input yields one empty line.
pub fn wrap_text(
    text: &str,
    font: &FontSpec,
    max_width: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (offset, opportunity) in linebreaks(text) {
        let segment = &text[start..offset];
        start = offset;

        let mandatory = opportunity == BreakOpportunity::Mandatory;
        let segment = if mandatory {
            segment.trim_end_matches(['\n', '\r', '\u{2028}', '\u{2029}', '\u{0B}', '\u{0C}', '\u{85}'])
        } else {
            segment
        };

        let candidate = format!("{}{}", current, segment);
        if measure.measure(candidate.trim_end(), font) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current.trim_end().to_string());
            current = segment.to_string();
        }

        // A lone segment can still overflow: split it by characters
        while measure.measure(current.trim_end(), font) > max_width {
            let (head, tail) = split_to_width(&current, font, max_width, measure);
            if tail.is_empty() {
                break;
            }
            lines.push(head);
            current = tail;
        }

        if mandatory {
            lines.push(current.trim_end().to_string());
            current.clear();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Longest prefix that fits (at least one character) and the remainder
fn split_to_width(
    text: &str,
    font: &FontSpec,
    max_width: f32,
    measure: &dyn TextMeasure,
) -> (String, String) {
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let next = idx + ch.len_utf8();
        if end > 0 && measure.measure(&text[..next], font) > max_width {
            break;
        }
        end = next;
    }
    (text[..end].to_string(), text[end..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_engine::ApproxMeasure;

    /// 10px per character
    fn font() -> FontSpec {
        FontSpec::new("sans-serif", 10.0)
    }

    fn measure() -> ApproxMeasure {
        ApproxMeasure {
            regular_em: 1.0,
            bold_em: 1.0,
        }
    }

    #[test]
    fn test_fits_on_one_line() {
        assert_eq!(wrap_text("hola mundo", &font(), 200.0, &measure()), vec!["hola mundo"]);
    }

    #[test]
    fn test_wraps_at_spaces() {
        let lines = wrap_text("uno dos tres cuatro", &font(), 80.0, &measure());
        assert_eq!(lines, vec!["uno dos", "tres", "cuatro"]);
    }

    #[test]
    fn test_honours_newlines() {
        let lines = wrap_text("a\n\nb", &font(), 100.0, &measure());
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_splits_long_words() {
        let lines = wrap_text("abcdefghij", &font(), 40.0, &measure());
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(wrap_text("", &font(), 100.0, &measure()), vec![""]);
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let text = "Desarrollo de software a la medida para el módulo de facturación electrónica";
        for line in wrap_text(text, &font(), 120.0, &measure()) {
            assert!(measure().measure(&line, &font()) <= 120.0, "{line:?}");
        }
    }
}
