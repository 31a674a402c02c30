//! Transcript cells for the chat widget.
//!
//! Represents an event to display in the conversation history. Returns its
//! `Vec<Line<'static>>` representation to make it easier to display in a
//! scrollable list.

use palaver_protocol::Sender;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;

use crate::render::line_utils::prefix_lines;
use crate::render::renderable::Renderable;
use crate::style::system_notice_style;
use crate::style::typing_indicator_style;
use crate::style::user_message_style;
use crate::transcript::TranscriptEntry;

pub trait HistoryCell: std::fmt::Debug + Send + Sync {
    fn display_lines(&self, width: u16) -> Vec<Line<'static>>;

    fn desired_height(&self, width: u16) -> u16 {
        Paragraph::new(Text::from(self.display_lines(width)))
            .wrap(Wrap { trim: false })
            .line_count(width)
            .try_into()
            .unwrap_or(0)
    }
}

impl Renderable for Box<dyn HistoryCell> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        let lines = self.display_lines(area.width);
        let y = if area.height == 0 {
            0
        } else {
            let overflow = lines.len().saturating_sub(usize::from(area.height));
            u16::try_from(overflow).unwrap_or(u16::MAX)
        };
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((y, 0))
            .render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        HistoryCell::desired_height(self.as_ref(), width)
    }
}

#[derive(Debug)]
pub struct UserHistoryCell {
    pub message: String,
}

impl HistoryCell for UserHistoryCell {
    fn display_lines(&self, width: u16) -> Vec<Line<'static>> {
        let style = user_message_style();
        let content = wrap_plain_lines(&self.message, width, style);

        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(Line::from(""));
        lines.extend(prefix_lines(content, "› ".bold().dim(), "  ".into()));
        lines
    }
}

pub fn new_user_prompt(message: String) -> UserHistoryCell {
    UserHistoryCell { message }
}

/// An engine reply, already converted to rich text by the markdown renderer.
#[derive(Debug)]
pub struct AssistantMessageCell {
    lines: Vec<Line<'static>>,
}

impl HistoryCell for AssistantMessageCell {
    fn display_lines(&self, _width: u16) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(Line::from(""));
        lines.extend(prefix_lines(
            self.lines.clone(),
            "• ".dim(),
            "  ".into(),
        ));
        lines
    }
}

pub fn new_assistant_reply(rendered: Text<'static>) -> AssistantMessageCell {
    AssistantMessageCell {
        lines: rendered.lines,
    }
}

/// A notice the widget itself injects into the conversation, e.g. when the
/// engine failed to produce a reply.
#[derive(Debug)]
pub struct SystemNoticeCell {
    message: String,
}

impl HistoryCell for SystemNoticeCell {
    fn display_lines(&self, width: u16) -> Vec<Line<'static>> {
        let style = system_notice_style();
        let content = wrap_plain_lines(&self.message, width, style);

        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(Line::from(""));
        lines.extend(prefix_lines(content, Span::styled("■ ", style), "  ".into()));
        lines
    }
}

pub fn new_system_notice(message: String) -> SystemNoticeCell {
    SystemNoticeCell { message }
}

/// Transient cell shown below the transcript while a reply is pending.
#[derive(Debug)]
pub struct TypingIndicatorCell;

impl HistoryCell for TypingIndicatorCell {
    fn display_lines(&self, _width: u16) -> Vec<Line<'static>> {
        vec![
            Line::from(""),
            vec!["• ".dim(), Span::styled("typing…", typing_indicator_style())].into(),
        ]
    }
}

/// Word-wrap raw message text to the width left of a two-column prefix and a
/// one-column right margin.
fn wrap_plain_lines(message: &str, width: u16, style: Style) -> Vec<Line<'static>> {
    let wrap_width = usize::from(width.saturating_sub(3)).max(1);
    message
        .lines()
        .flat_map(|line| {
            if line.is_empty() {
                vec![Line::from("").style(style)]
            } else {
                textwrap::wrap(line, wrap_width)
                    .into_iter()
                    .map(|piece| Line::from(piece.to_string()).style(style))
                    .collect()
            }
        })
        .collect()
}

/// Build the display cell for a transcript entry: the color policy and shape
/// are chosen here, by sender, so callers never branch on message kind.
pub fn cell_for_entry(entry: &TranscriptEntry) -> Box<dyn HistoryCell> {
    match entry.message.sender {
        Sender::User => Box::new(new_user_prompt(entry.message.content.clone())),
        Sender::Assistant => match &entry.rendered {
            Some(rendered) => Box::new(new_assistant_reply(rendered.clone())),
            None => Box::new(new_assistant_reply(Text::from(
                entry.message.content.clone(),
            ))),
        },
        Sender::System => Box::new(new_system_notice(entry.message.content.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_protocol::ChatMessage;
    use pretty_assertions::assert_eq;

    fn to_strings(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.clone())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect()
    }

    #[test]
    fn user_cell_prefixes_every_line() {
        let cell = new_user_prompt("one\ntwo".to_string());
        assert_eq!(to_strings(&cell.display_lines(20)), vec!["", "› one", "  two"]);
    }

    #[test]
    fn system_notice_keeps_the_message_text() {
        let cell = new_system_notice("engine exploded".to_string());
        let lines = to_strings(&cell.display_lines(40));
        assert_eq!(lines, vec!["", "■ engine exploded"]);
    }

    #[test]
    fn entries_map_to_cells_by_sender() {
        let entry = TranscriptEntry {
            message: ChatMessage::user("hello"),
            rendered: None,
        };
        let lines = to_strings(&cell_for_entry(&entry).display_lines(20));
        assert_eq!(lines, vec!["", "› hello"]);
    }

    #[test]
    fn typing_indicator_is_two_lines() {
        assert_eq!(TypingIndicatorCell.display_lines(20).len(), 2);
    }
}
