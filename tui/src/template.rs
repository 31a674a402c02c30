//! Template placeholder support for editable message text.
//!
//! A placeholder is the literal pattern `{{name}}` where `name` is any
//! character sequence not containing `}}` (it may be empty). Placeholders are
//! purely presentational: they carry no identity and are rescanned from the
//! raw text whenever it changes.

use std::ops::Range;

/// Byte spans of every placeholder in `text`.
///
/// Matching is non-overlapping and leftmost-first: each `{{` is closed by the
/// nearest following `}}`, then scanning resumes after it. Equivalent to the
/// non-greedy pattern `\{\{.*?\}\}` with `.` also matching newlines. Single
/// linear scan, cheap enough to run per keystroke.
pub fn placeholder_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(open) = text[at..].find("{{") {
        let open = at + open;
        let Some(close) = text[open + 2..].find("}}") else {
            break;
        };
        let end = open + 2 + close + 2;
        spans.push(open..end);
        at = end;
    }
    spans
}

/// Build the literal token for a placeholder name: `city` -> `{{city}}`.
pub fn placeholder_token(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_spans_in_order() {
        let text = "a {{x}} b {{y}} c";
        assert_eq!(placeholder_spans(text), vec![2..7, 10..15]);
        assert_eq!(&text[2..7], "{{x}}");
        assert_eq!(&text[10..15], "{{y}}");
    }

    #[test]
    fn empty_name_is_a_placeholder() {
        assert_eq!(placeholder_spans("{{}}"), vec![0..4]);
    }

    #[test]
    fn adjacent_placeholders_do_not_overlap() {
        assert_eq!(placeholder_spans("{{a}}{{b}}"), vec![0..5, 5..10]);
    }

    #[test]
    fn unterminated_open_matches_nothing() {
        assert_eq!(placeholder_spans("{{x"), Vec::<std::ops::Range<usize>>::new());
        assert_eq!(placeholder_spans("x}}"), Vec::<std::ops::Range<usize>>::new());
    }

    #[test]
    fn inner_braces_close_at_the_nearest_terminator() {
        // Lazy matching: the first `{{` is closed by the first `}}`.
        assert_eq!(placeholder_spans("{{a{{b}}"), vec![0..8]);
    }

    #[test]
    fn spans_may_cross_newlines() {
        assert_eq!(placeholder_spans("{{a\nb}}"), vec![0..7]);
    }

    #[test]
    fn builds_literal_tokens() {
        assert_eq!(placeholder_token("city"), "{{city}}");
        assert_eq!(placeholder_token(""), "{{}}");
    }
}
