//! Syntax highlighting for fenced code blocks in assistant replies.
//!
//! Wraps [syntect] with the [two_face] grammar and theme bundles to provide
//! ~250-language syntax highlighting.
//!
//! **Guardrails:** inputs exceeding 512 KB or 10 000 lines are rejected early
//! (returns `None`) to prevent pathological CPU/memory usage. Callers must
//! fall back to plain unstyled text.

use ratatui::style::Color as RtColor;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::FontStyle;
use syntect::highlighting::Style as SyntectStyle;
use syntect::highlighting::Theme;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use two_face::theme::EmbeddedThemeName;

const MAX_HIGHLIGHT_BYTES: usize = 512 * 1024;
const MAX_HIGHLIGHT_LINES: usize = 10_000;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        two_face::theme::extra()
            .get(EmbeddedThemeName::CatppuccinMocha)
            .clone()
    })
}

/// Convert a syntect `Style` to a ratatui `Style`.
///
/// Syntax highlighting themes inherently produce RGB colors, so `Color::Rgb`
/// is used here even though the rest of the widget sticks to ANSI colors.
fn convert_style(syn_style: SyntectStyle) -> Style {
    let mut rt_style = Style::default();

    let fg = syn_style.foreground;
    if fg.a > 0 {
        rt_style = rt_style.fg(RtColor::Rgb(fg.r, fg.g, fg.b));
    }
    // Intentionally skip background to avoid overwriting terminal bg.

    if syn_style.font_style.contains(FontStyle::BOLD) {
        rt_style.add_modifier |= Modifier::BOLD;
    }
    // Intentionally skip italic and underline; many terminals render them
    // poorly, and themes use underline on type scopes where it distracts.

    rt_style
}

/// Try to find a syntect `SyntaxReference` for the given language identifier.
///
/// two-face's extended syntax set resolves most names and extensions
/// directly; only a few aliases need patching.
fn find_syntax(lang: &str) -> Option<&'static SyntaxReference> {
    let ss = syntax_set();

    let patched = match lang {
        "csharp" | "c-sharp" => "c#",
        "golang" => "go",
        "python3" => "python",
        "shell" => "bash",
        _ => lang,
    };

    if let Some(s) = ss.find_syntax_by_token(patched) {
        return Some(s);
    }
    if let Some(s) = ss.find_syntax_by_name(patched) {
        return Some(s);
    }
    let lower = patched.to_ascii_lowercase();
    if let Some(s) = ss
        .syntaxes()
        .iter()
        .find(|s| s.name.to_ascii_lowercase() == lower)
    {
        return Some(s);
    }
    ss.find_syntax_by_extension(lang)
}

/// Highlight a fenced code block. Returns `None` when the language is unknown
/// or the input trips a guardrail; the caller renders the literal text then.
pub(crate) fn highlight_code_block(lang: &str, code: &str) -> Option<Vec<Line<'static>>> {
    if lang.is_empty() || code.len() > MAX_HIGHLIGHT_BYTES {
        return None;
    }
    let line_count = code.lines().count();
    if line_count > MAX_HIGHLIGHT_LINES {
        return None;
    }

    let syntax = find_syntax(lang)?;
    let ss = syntax_set();
    let mut highlighter = HighlightLines::new(syntax, theme());

    let mut lines: Vec<Line<'static>> = Vec::with_capacity(line_count);
    for line in LinesWithEndings::from(code) {
        let regions = highlighter.highlight_line(line, ss).ok()?;
        let spans: Vec<Span<'static>> = regions
            .into_iter()
            .map(|(style, text)| {
                Span::styled(text.trim_end_matches('\n').to_string(), convert_style(style))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back() {
        assert!(highlight_code_block("not-a-language-xyz", "fn main() {}").is_none());
        assert!(highlight_code_block("", "plain").is_none());
    }

    #[test]
    fn oversized_input_falls_back() {
        let big = "x\n".repeat(MAX_HIGHLIGHT_LINES + 1);
        assert!(highlight_code_block("rust", &big).is_none());
    }

    #[test]
    fn known_language_produces_one_line_per_input_line() {
        let lines = highlight_code_block("rust", "fn main() {}\nlet x = 1;\n");
        if let Some(lines) = lines {
            assert_eq!(lines.len(), 2);
        }
    }
}
