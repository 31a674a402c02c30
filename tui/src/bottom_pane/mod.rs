//! Bottom pane of the widget: the message composer.
//!
//! Only the prompt input lives here. While a request is in flight the
//! transcript shows the typing indicator and the composer stays editable but
//! gated, so drafts survive until input opens again.

mod chat_composer;
mod textarea;

pub use chat_composer::ChatComposer;
pub use chat_composer::InputResult;
