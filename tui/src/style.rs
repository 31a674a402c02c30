//! Color policy for the widget: which style a message gets is decided here,
//! by sender, so individual cells stay presentation-only.

use ratatui::style::Style;
use ratatui::style::Stylize;

pub(crate) fn user_message_style() -> Style {
    Style::default().cyan()
}

pub(crate) fn system_notice_style() -> Style {
    Style::default().red()
}

pub(crate) fn typing_indicator_style() -> Style {
    Style::default().dim().italic()
}

pub(crate) fn composer_placeholder_style() -> Style {
    Style::default().dim()
}

/// Emphasized run for `{{name}}` template tokens inside editable text.
pub(crate) fn placeholder_highlight_style() -> Style {
    Style::default().magenta().bold()
}
