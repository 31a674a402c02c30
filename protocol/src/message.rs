//! Message value model shared by the widget and its hosts.

use serde::Deserialize;
use serde::Serialize;

/// Which way a message crossed the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Who authored a message.
///
/// `System` is reserved for notices the widget itself injects into the
/// conversation (e.g. an engine failure), not for anything the user or the
/// engine said.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// One exchanged message. Immutable once constructed: corrections are
/// expressed by appending new messages, never by editing old ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub direction: Direction,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            direction: Direction::Outgoing,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            direction: Direction::Incoming,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            direction: Direction::Incoming,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructors_pair_sender_with_direction() {
        assert_eq!(ChatMessage::user("q").direction, Direction::Outgoing);
        assert_eq!(ChatMessage::assistant("a").direction, Direction::Incoming);
        let notice = ChatMessage::system("n");
        assert_eq!(notice.direction, Direction::Incoming);
        assert_eq!(notice.sender, Sender::System);
    }

    #[test]
    fn serializes_with_snake_case_tags() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap_or_default();
        assert_eq!(
            json,
            r#"{"sender":"user","direction":"outgoing","content":"hi"}"#
        );
    }
}
