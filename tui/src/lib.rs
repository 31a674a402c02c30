// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod bottom_pane;
mod chatwidget;
mod history_cell;
mod markdown;
mod render;
mod style;
mod template;
mod transcript;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use bottom_pane::ChatComposer;
pub use bottom_pane::InputResult;
pub use chatwidget::ChatWidget;
pub use chatwidget::ChatWidgetParams;
pub use chatwidget::ConversationState;
pub use chatwidget::REPLY_FAILURE_NOTICE;
pub use chatwidget::WidgetError;
pub use history_cell::HistoryCell;
pub use render::renderable::Renderable;
pub use template::placeholder_spans;
pub use template::placeholder_token;
pub use transcript::Transcript;
pub use transcript::TranscriptEntry;
pub use transcript::TranscriptError;

pub use markdown::render_markdown_text;
