//! Minimal editable text buffer backing the composer.
//!
//! Offsets are byte offsets into the UTF-8 text and are kept on char
//! boundaries at all times. A selection is a cursor plus an anchor; edits
//! that take a selection replace it and leave the caret after the inserted
//! text, touching nothing outside the edited range.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use std::ops::Range;

#[derive(Debug, Default)]
pub(crate) struct TextArea {
    text: String,
    cursor: usize,
    selection_anchor: Option<usize>,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
        self.selection_anchor = None;
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = self.clamp_to_boundary(pos);
        self.selection_anchor = None;
    }

    /// Select `range` (clamped to char boundaries); the caret lands on the
    /// end of the range.
    pub fn select(&mut self, range: Range<usize>) {
        let start = self.clamp_to_boundary(range.start);
        let end = self.clamp_to_boundary(range.end);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection_anchor = Some(start);
        self.cursor = end;
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.selection_anchor?;
        let (start, end) = if anchor <= self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        };
        if start == end { None } else { Some(start..end) }
    }

    /// Insert at the caret, or replace the selection when one exists. The
    /// caret ends up immediately after the inserted text.
    pub fn insert_str(&mut self, s: &str) {
        if let Some(selection) = self.selection() {
            self.text.replace_range(selection.clone(), s);
            self.cursor = selection.start + s.len();
        } else {
            self.text.insert_str(self.cursor, s);
            self.cursor += s.len();
        }
        self.selection_anchor = None;
    }

    /// Handle an editing key. Returns true when the event changed the buffer
    /// or the caret.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_str(c.encode_utf8(&mut [0u8; 4]));
                true
            }
            KeyCode::Backspace => self.delete_backward(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => {
                self.set_cursor(self.prev_boundary(self.cursor));
                true
            }
            KeyCode::Right => {
                self.set_cursor(self.next_boundary(self.cursor));
                true
            }
            KeyCode::Home => {
                self.set_cursor(self.line_start(self.cursor));
                true
            }
            KeyCode::End => {
                self.set_cursor(self.line_end(self.cursor));
                true
            }
            KeyCode::Up => self.move_vertically(-1),
            KeyCode::Down => self.move_vertically(1),
            _ => false,
        }
    }

    fn delete_backward(&mut self) -> bool {
        if let Some(selection) = self.selection() {
            self.text.replace_range(selection.clone(), "");
            self.cursor = selection.start;
            self.selection_anchor = None;
            return true;
        }
        if self.cursor == 0 {
            return false;
        }
        let prev = self.prev_boundary(self.cursor);
        self.text.replace_range(prev..self.cursor, "");
        self.cursor = prev;
        true
    }

    fn delete_forward(&mut self) -> bool {
        if let Some(selection) = self.selection() {
            self.text.replace_range(selection.clone(), "");
            self.cursor = selection.start;
            self.selection_anchor = None;
            return true;
        }
        if self.cursor == self.text.len() {
            return false;
        }
        let next = self.next_boundary(self.cursor);
        self.text.replace_range(self.cursor..next, "");
        true
    }

    fn move_vertically(&mut self, delta: i32) -> bool {
        let line_start = self.line_start(self.cursor);
        let column = self.text[line_start..self.cursor].chars().count();
        let target_start = if delta < 0 {
            if line_start == 0 {
                return false;
            }
            self.line_start(line_start - 1)
        } else {
            let line_end = self.line_end(self.cursor);
            if line_end == self.text.len() {
                return false;
            }
            line_end + 1
        };
        let target_end = self.line_end(target_start);
        let mut pos = target_start;
        for _ in 0..column {
            if pos >= target_end {
                break;
            }
            pos = self.next_boundary(pos);
        }
        self.set_cursor(pos.min(target_end));
        true
    }

    fn prev_boundary(&self, pos: usize) -> usize {
        self.text[..pos]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self, pos: usize) -> usize {
        self.text[pos..]
            .chars()
            .next()
            .map_or(pos, |c| pos + c.len_utf8())
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.text[pos..].find('\n').map_or(self.text.len(), |i| pos + i)
    }

    fn clamp_to_boundary(&self, pos: usize) -> usize {
        let mut p = pos.min(self.text.len());
        while p > 0 && !self.text.is_char_boundary(p) {
            p -= 1;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn inserts_at_the_caret_and_leaves_it_after() {
        let mut ta = TextArea::new();
        ta.set_text("Hello ");
        ta.insert_str("{{city}}");
        assert_eq!(ta.text(), "Hello {{city}}");
        assert_eq!(ta.cursor(), ta.text().len());
    }

    #[test]
    fn replaces_the_selection_only() {
        let mut ta = TextArea::new();
        ta.set_text("send to NAME please");
        ta.select(8..12);
        ta.insert_str("{{name}}");
        assert_eq!(ta.text(), "send to {{name}} please");
        assert_eq!(ta.cursor(), 16);
        assert_eq!(ta.selection(), None);
    }

    #[test]
    fn backspace_removes_whole_characters() {
        let mut ta = TextArea::new();
        ta.set_text("héllo");
        ta.set_cursor(3); // after the two-byte é
        assert!(ta.input(key(KeyCode::Backspace)));
        assert_eq!(ta.text(), "hllo");
        assert_eq!(ta.cursor(), 1);
    }

    #[test]
    fn home_and_end_are_line_scoped() {
        let mut ta = TextArea::new();
        ta.set_text("ab\ncd");
        ta.set_cursor(4);
        ta.input(key(KeyCode::Home));
        assert_eq!(ta.cursor(), 3);
        ta.input(key(KeyCode::End));
        assert_eq!(ta.cursor(), 5);
    }

    #[test]
    fn vertical_movement_keeps_the_column() {
        let mut ta = TextArea::new();
        ta.set_text("abcd\nef");
        ta.set_cursor(1);
        ta.input(key(KeyCode::Down));
        assert_eq!(ta.cursor(), 6);
        ta.input(key(KeyCode::Up));
        assert_eq!(ta.cursor(), 1);
    }

    #[test]
    fn control_chars_are_not_inserted() {
        let mut ta = TextArea::new();
        let mut ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        ev.kind = KeyEventKind::Press;
        assert!(!ta.input(ev));
        assert_eq!(ta.text(), "");
    }
}
