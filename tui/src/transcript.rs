//! Ordered record of the conversation plus the transient typing indicator.
//!
//! The transcript is append-only and insertion order is conversation order;
//! nothing ever reorders or edits an entry. All mutation happens on the UI
//! context (the widget enforces this), so the type itself holds no locks.

use palaver_protocol::ChatMessage;
use ratatui::text::Text;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    /// A second typing indicator was requested while one is already visible.
    /// This is a programming error in the caller, not a runtime condition.
    #[error("typing indicator is already visible")]
    IndicatorAlreadyVisible,
}

/// One transcript row: the immutable message and, when the raw content is not
/// displayed verbatim, its precomputed display form.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub message: ChatMessage,
    pub rendered: Option<Text<'static>>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    typing_indicator: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message whose raw content is displayed as-is.
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(TranscriptEntry {
            message,
            rendered: None,
        });
    }

    /// Append a message together with its precomputed display form.
    pub fn push_rendered(&mut self, message: ChatMessage, rendered: Text<'static>) {
        self.entries.push(TranscriptEntry {
            message,
            rendered: Some(rendered),
        });
    }

    /// Show the typing indicator. It is not an entry: it displays after every
    /// message and never appears in [`Transcript::snapshot`], which also
    /// keeps it last for as long as it is visible.
    pub fn show_typing_indicator(&mut self) -> Result<(), TranscriptError> {
        if self.typing_indicator {
            return Err(TranscriptError::IndicatorAlreadyVisible);
        }
        self.typing_indicator = true;
        Ok(())
    }

    /// Hide the typing indicator; no-op when it is not visible.
    pub fn hide_typing_indicator(&mut self) {
        self.typing_indicator = false;
    }

    pub fn typing_indicator_visible(&self) -> bool {
        self.typing_indicator
    }

    /// The conversation so far, in insertion order, indicator excluded.
    pub fn snapshot(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
