//! Message input surface.
//!
//! A small editable textarea with Enter-to-submit, newline insertion via
//! Shift/Alt+Enter, and live `{{name}}` placeholder highlighting. Highlights
//! are recomputed from the raw text on every render pass, so there is no
//! stored span state that could go stale when the text is edited or deleted.
//!
//! While a task is running the composer stays editable but Enter submits
//! nothing; the widget exposes the matching `can_submit` as a derived value.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

use super::textarea::TextArea;
use crate::render::Insets;
use crate::render::RectExt;
use crate::render::renderable::Renderable;
use crate::style::composer_placeholder_style;
use crate::style::placeholder_highlight_style;
use crate::template::placeholder_spans;
use crate::template::placeholder_token;

/// Columns taken by the `› ` prompt marker to the left of the text.
const PREFIX_COLS: u16 = 2;

/// Result returned when the user interacts with the text area.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    Submitted(String),
    None,
}

pub struct ChatComposer {
    textarea: TextArea,
    placeholder_text: String,
    is_task_running: bool,
}

impl ChatComposer {
    pub fn new(placeholder_text: String) -> Self {
        Self {
            textarea: TextArea::new(),
            placeholder_text,
            is_task_running: false,
        }
    }

    /// Returns true if the composer currently contains no user input.
    pub fn is_empty(&self) -> bool {
        self.textarea.is_empty()
    }

    pub fn current_text(&self) -> &str {
        self.textarea.text()
    }

    pub fn set_task_running(&mut self, running: bool) {
        self.is_task_running = running;
    }

    pub fn is_task_running(&self) -> bool {
        self.is_task_running
    }

    /// Replace the current selection (or insert at the caret) with the
    /// `{{name}}` token, leaving the caret right after it.
    pub fn insert_placeholder(&mut self, name: &str) {
        self.textarea.insert_str(&placeholder_token(name));
    }

    /// Select a byte range of the draft, e.g. to mark text a placeholder
    /// insertion should replace.
    pub fn select(&mut self, range: Range<usize>) {
        self.textarea.select(range);
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.textarea.set_cursor(pos);
    }

    pub fn handle_paste(&mut self, pasted: String) -> bool {
        self.textarea.insert_str(&pasted);
        true
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> (InputResult, bool) {
        if key_event.kind == KeyEventKind::Release {
            return (InputResult::None, false);
        }
        match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                modifiers,
                ..
            } if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Char('j'),
                modifiers,
                ..
            } if modifiers.contains(KeyModifiers::CONTROL) => {
                self.textarea.insert_str("\n");
                (InputResult::None, true)
            }
            KeyEvent {
                code: KeyCode::Enter,
                ..
            } => {
                if self.is_task_running || self.textarea.text().trim().is_empty() {
                    // Submission is gated; the draft stays untouched.
                    return (InputResult::None, false);
                }
                let text = self.textarea.text().to_string();
                self.textarea.set_text("");
                (InputResult::Submitted(text), true)
            }
            other => {
                let handled = self.textarea.input(other);
                (InputResult::None, handled)
            }
        }
    }

    /// Lay the draft out as display rows no wider than `width`, styling
    /// placeholder tokens, and locate the caret as (row, column).
    fn display_rows(&self, width: u16) -> (Vec<Line<'static>>, (u16, u16)) {
        let width = width.max(1) as usize;
        let text = self.textarea.text();
        let cursor = self.textarea.cursor();
        let highlights = placeholder_spans(text);

        let mut rows: Vec<Line<'static>> = Vec::new();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style = Style::default();
        let mut col = 0usize;
        let mut cursor_pos = (0u16, 0u16);
        let mut highlight_idx = 0usize;

        let mut flush_run = |spans: &mut Vec<Span<'static>>, run: &mut String, style: Style| {
            if !run.is_empty() {
                spans.push(Span::styled(std::mem::take(run), style));
            }
        };

        for (idx, ch) in text.char_indices() {
            while highlight_idx < highlights.len() && highlights[highlight_idx].end <= idx {
                highlight_idx += 1;
            }
            let in_placeholder = highlights
                .get(highlight_idx)
                .is_some_and(|range| range.contains(&idx));
            let style = if in_placeholder {
                placeholder_highlight_style()
            } else {
                Style::default()
            };

            if idx == cursor {
                cursor_pos = (rows.len() as u16, col as u16);
            }

            if ch == '\n' {
                flush_run(&mut spans, &mut run, run_style);
                rows.push(Line::from(std::mem::take(&mut spans)));
                col = 0;
                continue;
            }

            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if col + ch_width > width {
                flush_run(&mut spans, &mut run, run_style);
                rows.push(Line::from(std::mem::take(&mut spans)));
                col = 0;
                if idx == cursor {
                    cursor_pos = (rows.len() as u16, 0);
                }
            }

            if style != run_style {
                flush_run(&mut spans, &mut run, run_style);
                run_style = style;
            }
            run.push(ch);
            col += ch_width;
        }

        flush_run(&mut spans, &mut run, run_style);
        if !spans.is_empty() || rows.is_empty() || text.ends_with('\n') {
            // A trailing newline still owns an (empty) row for the caret.
            rows.push(Line::from(spans));
        }
        if cursor >= text.len() {
            let last_row = rows.len().saturating_sub(1) as u16;
            cursor_pos = (last_row, col as u16);
        }
        (rows, cursor_pos)
    }

    fn text_area_rect(&self, area: Rect) -> Rect {
        area.inset(Insets::tlbr(1, PREFIX_COLS, 1, 1))
    }

    /// First visible row when the draft is taller than the viewport; keeps
    /// the caret row in view.
    fn scroll_offset(cursor_row: u16, viewport_height: u16) -> u16 {
        cursor_row.saturating_sub(viewport_height.saturating_sub(1))
    }

    #[cfg(test)]
    pub(crate) fn display_rows_for_test(&self, width: u16) -> Vec<Line<'static>> {
        self.display_rows(width).0
    }
}

impl Renderable for ChatComposer {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let inner = self.text_area_rect(area);
        if inner.is_empty() {
            return;
        }

        let prompt = Line::from("› ".bold().dim());
        WidgetRef::render_ref(&prompt, Rect::new(area.x, inner.y, PREFIX_COLS, 1), buf);

        if self.textarea.is_empty() {
            let hint = Line::from(Span::styled(
                self.placeholder_text.clone(),
                composer_placeholder_style(),
            ));
            WidgetRef::render_ref(&hint, inner, buf);
            return;
        }

        let (rows, (cursor_row, _)) = self.display_rows(inner.width);
        let first_row = usize::from(Self::scroll_offset(cursor_row, inner.height));
        for (i, row) in rows.iter().skip(first_row).enumerate() {
            if i >= usize::from(inner.height) {
                break;
            }
            let row_rect = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
            WidgetRef::render_ref(row, row_rect, buf);
        }
    }

    fn desired_height(&self, width: u16) -> u16 {
        let inner_width = width.saturating_sub(PREFIX_COLS + 1).max(1);
        let (rows, _) = self.display_rows(inner_width);
        (rows.len() as u16).saturating_add(2)
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let inner = self.text_area_rect(area);
        if inner.is_empty() {
            return None;
        }
        let (_, (row, col)) = self.display_rows(inner.width);
        let first_row = Self::scroll_offset(row, inner.height);
        let y = inner.y + (row - first_row).min(inner.height.saturating_sub(1));
        let x = inner.x + col.min(inner.width.saturating_sub(1));
        Some((x, y))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn type_str(composer: &mut ChatComposer, text: &str) {
        for ch in text.chars() {
            composer.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn enter() -> KeyEvent {
        KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
    }

    #[test]
    fn enter_submits_and_clears_the_draft() {
        let mut composer = ChatComposer::new("Send a message".to_string());
        type_str(&mut composer, "hi there");
        let (result, _) = composer.handle_key_event(enter());
        assert_eq!(result, InputResult::Submitted("hi there".to_string()));
        assert!(composer.is_empty());
    }

    #[test]
    fn blank_drafts_are_not_submitted() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "   ");
        let (result, _) = composer.handle_key_event(enter());
        assert_eq!(result, InputResult::None);
        assert_eq!(composer.current_text(), "   ");
    }

    #[test]
    fn submission_is_gated_while_a_task_runs() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "queued thought");
        composer.set_task_running(true);
        let (result, _) = composer.handle_key_event(enter());
        assert_eq!(result, InputResult::None);
        // The draft is preserved for when input opens again.
        assert_eq!(composer.current_text(), "queued thought");
        composer.set_task_running(false);
        let (result, _) = composer.handle_key_event(enter());
        assert_eq!(
            result,
            InputResult::Submitted("queued thought".to_string())
        );
    }

    #[test]
    fn shift_enter_inserts_a_newline() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "a");
        composer.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut composer, "b");
        assert_eq!(composer.current_text(), "a\nb");
    }

    #[test]
    fn placeholder_insertion_lands_at_the_caret() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "Hello ");
        composer.insert_placeholder("city");
        assert_eq!(composer.current_text(), "Hello {{city}}");
    }

    #[test]
    fn placeholder_tokens_are_highlighted() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "hi {{name}}!");
        let rows = composer.display_rows_for_test(40);
        assert_eq!(rows.len(), 1);
        let styled: Vec<(&str, Style)> = rows[0]
            .spans
            .iter()
            .map(|span| (span.content.as_ref(), span.style))
            .collect();
        assert_eq!(
            styled,
            vec![
                ("hi ", Style::default()),
                ("{{name}}", placeholder_highlight_style()),
                ("!", Style::default()),
            ]
        );
    }

    #[test]
    fn deleting_a_brace_drops_the_highlight() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "{{x}}");
        composer.handle_key_event(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        let rows = composer.display_rows_for_test(40);
        // "{{x}" is no longer a placeholder; no span keeps the old style.
        assert!(
            rows[0]
                .spans
                .iter()
                .all(|span| span.style != placeholder_highlight_style())
        );
    }

    #[test]
    fn long_drafts_wrap_to_the_width() {
        let mut composer = ChatComposer::new(String::new());
        type_str(&mut composer, "abcdef");
        let rows = composer.display_rows_for_test(4);
        assert_eq!(rows.len(), 2);
    }
}
