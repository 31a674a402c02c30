//! The conversation controller: gates input, dispatches the engine off the
//! UI context, and reconciles completions back into the transcript.
//!
//! All transcript and state mutation happens on the UI-owning context, i.e.
//! in the host's event loop, which forwards key events here and hands
//! [`AppEvent::EngineReplyReady`] back to [`ChatWidget::on_engine_reply`].
//! The background task only computes the reply; it never touches shared
//! state. Because `AwaitingReply` blocks further submissions, at most one
//! invocation is outstanding and completions cannot reorder.
//!
//! There is no cancellation or timeout: an engine that never completes
//! leaves the widget in `AwaitingReply`. That matches the dispatch model
//! (fire, then reconcile exactly one completion) and is a known limitation.

use std::sync::Arc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use palaver_protocol::ChatMessage;
use palaver_protocol::EngineError;
use palaver_protocol::SharedEngine;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use thiserror::Error;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::bottom_pane::ChatComposer;
use crate::bottom_pane::InputResult;
use crate::history_cell::HistoryCell;
use crate::history_cell::TypingIndicatorCell;
use crate::history_cell::cell_for_entry;
use crate::markdown::render_markdown_text;
use crate::render::renderable::ColumnRenderable;
use crate::render::renderable::Renderable;
use crate::transcript::Transcript;

/// Prepended to the engine's error message in the system notice that keeps
/// the conversation usable after a failed turn.
pub const REPLY_FAILURE_NOTICE: &str = "The reply could not be produced: ";

/// Lines scrolled per PageUp/PageDown press.
const SCROLL_STEP: u16 = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetError {
    /// Submitting requires a reply engine, so constructing a widget without
    /// one is a configuration error, surfaced immediately.
    #[error("no chat engine was configured")]
    EngineNotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingReply,
}

pub struct ChatWidgetParams {
    pub app_event_tx: AppEventSender,
    pub engine: Option<SharedEngine>,
    pub placeholder_text: String,
}

pub struct ChatWidget {
    app_event_tx: AppEventSender,
    engine: SharedEngine,
    transcript: Transcript,
    state: ConversationState,
    composer: ChatComposer,
    /// Lines scrolled up from the bottom of the transcript; 0 follows new
    /// messages.
    scroll_offset: u16,
}

impl ChatWidget {
    pub fn new(params: ChatWidgetParams) -> Result<Self, WidgetError> {
        let ChatWidgetParams {
            app_event_tx,
            engine,
            placeholder_text,
        } = params;
        let engine = engine.ok_or(WidgetError::EngineNotConfigured)?;
        Ok(Self {
            app_event_tx,
            engine,
            transcript: Transcript::new(),
            state: ConversationState::Idle,
            composer: ChatComposer::new(placeholder_text),
            scroll_offset: 0,
        })
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &ChatComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut ChatComposer {
        &mut self.composer
    }

    /// Whether a submission would currently be accepted. Recomputed from the
    /// conversation state and the draft on every call so it can never drift
    /// from either.
    pub fn can_submit(&self) -> bool {
        self.state == ConversationState::Idle && !self.composer.current_text().trim().is_empty()
    }

    /// Replace the composer selection (or insert at its caret) with a
    /// `{{name}}` token.
    pub fn insert_placeholder(&mut self, name: &str) {
        self.composer.insert_placeholder(name);
        self.app_event_tx.send(AppEvent::RequestFrame);
    }

    /// Route a key event: transcript scrolling first, then the composer. A
    /// submitted draft goes straight to [`ChatWidget::submit`]. Returns true
    /// when the visible state changed.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        match key_event.code {
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(SCROLL_STEP);
                true
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                true
            }
            _ => {
                let (result, needs_redraw) = self.composer.handle_key_event(key_event);
                match result {
                    InputResult::Submitted(text) => {
                        self.submit(&text);
                        true
                    }
                    InputResult::None => needs_redraw,
                }
            }
        }
    }

    pub fn handle_paste(&mut self, pasted: String) -> bool {
        self.composer.handle_paste(pasted)
    }

    /// Start a conversation turn.
    ///
    /// Blank input is a silent no-op. While a reply is pending the call is
    /// rejected: input gating makes that unreachable from the composer, so
    /// the check is a defensive invariant against hosts calling in directly.
    /// Otherwise the raw text is appended as the user's message, the typing
    /// indicator appears, and the engine is dispatched on a background
    /// context; this method returns without waiting.
    pub fn submit(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.state == ConversationState::AwaitingReply {
            tracing::warn!("submit ignored: a reply is already pending");
            return;
        }

        self.transcript.push(ChatMessage::user(text));
        self.state = ConversationState::AwaitingReply;
        if let Err(err) = self.transcript.show_typing_indicator() {
            // Unreachable while the state machine holds; never fatal.
            tracing::error!("transcript invariant violated: {err}");
        }
        self.composer.set_task_running(true);
        self.scroll_offset = 0;
        self.app_event_tx.send(AppEvent::RequestFrame);
        self.dispatch_engine(text.to_string());
    }

    /// Apply a completed engine invocation. Must be called from the host's
    /// event loop, which is what keeps every mutation on the UI context.
    pub fn on_engine_reply(&mut self, result: Result<String, EngineError>) {
        self.transcript.hide_typing_indicator();
        match result {
            Ok(reply) => {
                let rendered = render_markdown_text(&reply);
                self.transcript
                    .push_rendered(ChatMessage::assistant(reply), rendered);
            }
            Err(err) => {
                tracing::error!("chat engine failed: {err}");
                self.transcript
                    .push(ChatMessage::system(format!("{REPLY_FAILURE_NOTICE}{err}")));
            }
        }
        self.state = ConversationState::Idle;
        self.composer.set_task_running(false);
        self.scroll_offset = 0;
        self.app_event_tx.send(AppEvent::RequestFrame);
    }

    fn dispatch_engine(&self, prompt: String) {
        let engine = Arc::clone(&self.engine);
        let app_event_tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || engine.reply(&prompt)).await {
                Ok(result) => result,
                Err(join_error) => Err(EngineError::Stopped(join_error.to_string())),
            };
            app_event_tx.send(AppEvent::EngineReplyReady(result));
        });
    }

    fn transcript_cells(&self) -> Vec<Box<dyn HistoryCell>> {
        let mut cells: Vec<Box<dyn HistoryCell>> =
            self.transcript.snapshot().iter().map(cell_for_entry).collect();
        if self.transcript.typing_indicator_visible() {
            cells.push(Box::new(TypingIndicatorCell));
        }
        cells
    }

    fn render_transcript(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let cells = self.transcript_cells();
        if cells.is_empty() {
            return;
        }

        let total = cells
            .iter()
            .map(|cell| Renderable::desired_height(cell, area.width))
            .fold(0u16, u16::saturating_add);
        if total <= area.height && self.scroll_offset == 0 {
            ColumnRenderable::with(cells).render(area, buf);
            return;
        }

        // Taller than the viewport: flatten and show the tail, adjusted by
        // the scroll offset, so the newest messages stay in view.
        let lines: Vec<Line<'static>> = cells
            .iter()
            .flat_map(|cell| cell.display_lines(area.width))
            .collect();
        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
        let wrapped_total = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);
        let max_offset = wrapped_total.saturating_sub(area.height);
        let offset = self.scroll_offset.min(max_offset);
        paragraph.scroll((max_offset - offset, 0)).render(area, buf);
    }

    fn layout_areas(&self, area: Rect) -> [Rect; 2] {
        let composer_height = self
            .composer
            .desired_height(area.width)
            .min(area.height);
        Layout::vertical([Constraint::Min(0), Constraint::Length(composer_height)]).areas(area)
    }
}

impl Renderable for ChatWidget {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let [transcript_area, composer_area] = self.layout_areas(area);
        self.render_transcript(transcript_area, buf);
        self.composer.render(composer_area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.transcript_cells()
            .iter()
            .map(|cell| Renderable::desired_height(cell, width))
            .fold(0u16, u16::saturating_add)
            .saturating_add(self.composer.desired_height(width))
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let [_, composer_area] = self.layout_areas(area);
        self.composer.cursor_pos(composer_area)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use palaver_protocol::Direction;
    use palaver_protocol::Sender;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn test_widget(engine: SharedEngine) -> (ChatWidget, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let widget = ChatWidget::new(ChatWidgetParams {
            app_event_tx: AppEventSender::new(tx),
            engine: Some(engine),
            placeholder_text: "Send a message".to_string(),
        })
        .unwrap();
        (widget, rx)
    }

    fn uppercase_engine() -> SharedEngine {
        Arc::new(|prompt: &str| Ok::<_, EngineError>(prompt.to_uppercase()))
    }

    /// Drain app events until the pending completion is applied, the way a
    /// host event loop would.
    async fn complete_turn(widget: &mut ChatWidget, rx: &mut UnboundedReceiver<AppEvent>) {
        while let Some(event) = rx.recv().await {
            if let AppEvent::EngineReplyReady(result) = event {
                widget.on_engine_reply(result);
                return;
            }
        }
        panic!("engine completion never arrived");
    }

    fn transcript_contents(widget: &ChatWidget) -> Vec<(Sender, String)> {
        widget
            .transcript()
            .snapshot()
            .iter()
            .map(|entry| (entry.message.sender, entry.message.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn uppercase_turn_round_trips() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        widget.submit("hi");
        assert_eq!(widget.state(), ConversationState::AwaitingReply);
        assert!(widget.transcript().typing_indicator_visible());

        complete_turn(&mut widget, &mut rx).await;

        assert_eq!(
            transcript_contents(&widget),
            vec![
                (Sender::User, "hi".to_string()),
                (Sender::Assistant, "HI".to_string()),
            ]
        );
        assert_eq!(widget.state(), ConversationState::Idle);
        assert!(!widget.transcript().typing_indicator_visible());
    }

    #[tokio::test]
    async fn failed_turn_recovers_with_a_system_notice() {
        let engine: SharedEngine =
            Arc::new(|_: &str| Err::<String, _>(EngineError::Failed("boom".to_string())));
        let (mut widget, mut rx) = test_widget(engine);
        widget.submit("hi");
        complete_turn(&mut widget, &mut rx).await;

        let contents = transcript_contents(&widget);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].0, Sender::System);
        assert!(contents[1].1.contains("boom"));
        assert_eq!(widget.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn panicking_engine_behaves_like_a_failure() {
        let engine: SharedEngine =
            Arc::new(|_: &str| -> Result<String, EngineError> { panic!("kaboom") });
        let (mut widget, mut rx) = test_widget(engine);
        widget.submit("hi");
        complete_turn(&mut widget, &mut rx).await;

        let contents = transcript_contents(&widget);
        assert_eq!(contents[1].0, Sender::System);
        assert_eq!(widget.state(), ConversationState::Idle);
    }

    #[tokio::test]
    async fn blank_submission_is_a_no_op() {
        let (mut widget, _rx) = test_widget(uppercase_engine());
        widget.submit("   \n ");
        assert_eq!(widget.transcript().len(), 0);
        assert_eq!(widget.state(), ConversationState::Idle);
        assert!(!widget.transcript().typing_indicator_visible());
    }

    #[tokio::test]
    async fn second_submission_is_rejected_while_awaiting() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        widget.submit("first");
        widget.submit("second");
        assert_eq!(widget.transcript().len(), 1);

        complete_turn(&mut widget, &mut rx).await;
        assert_eq!(
            transcript_contents(&widget),
            vec![
                (Sender::User, "first".to_string()),
                (Sender::Assistant, "FIRST".to_string()),
            ]
        );

        // The rejected submission must not have started a second dispatch.
        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, AppEvent::EngineReplyReady(_)));
        }
    }

    #[tokio::test]
    async fn transcript_grows_by_exactly_two_per_turn() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        for (i, prompt) in ["a", "b", "c"].iter().enumerate() {
            widget.submit(prompt);
            assert_eq!(widget.transcript().len(), i * 2 + 1);
            complete_turn(&mut widget, &mut rx).await;
            assert_eq!(widget.transcript().len(), i * 2 + 2);
        }
    }

    #[tokio::test]
    async fn replies_carry_a_rendered_form() {
        let engine: SharedEngine =
            Arc::new(|_: &str| Ok::<_, EngineError>("**bold** reply".to_string()));
        let (mut widget, mut rx) = test_widget(engine);
        widget.submit("hi");
        complete_turn(&mut widget, &mut rx).await;

        let entry = &widget.transcript().snapshot()[1];
        assert_eq!(entry.message.direction, Direction::Incoming);
        assert!(entry.rendered.is_some());
        // Outgoing user messages keep their raw content only.
        assert!(widget.transcript().snapshot()[0].rendered.is_none());
    }

    #[tokio::test]
    async fn missing_engine_is_a_configuration_error() {
        let (tx, _rx) = unbounded_channel();
        let result = ChatWidget::new(ChatWidgetParams {
            app_event_tx: AppEventSender::new(tx),
            engine: None,
            placeholder_text: String::new(),
        });
        assert!(matches!(result, Err(WidgetError::EngineNotConfigured)));
    }

    #[tokio::test]
    async fn can_submit_is_derived_from_state_and_draft() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        assert!(!widget.can_submit());

        for ch in "hi".chars() {
            widget.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        assert!(widget.can_submit());

        widget.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        // Draft cleared and a reply pending: both conditions now gate.
        assert!(!widget.can_submit());

        complete_turn(&mut widget, &mut rx).await;
        assert!(!widget.can_submit());
    }

    #[tokio::test]
    async fn enter_while_awaiting_preserves_the_draft() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        widget.submit("hi");
        for ch in "draft".chars() {
            widget.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        widget.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(widget.composer().current_text(), "draft");
        assert_eq!(widget.transcript().len(), 1);
        complete_turn(&mut widget, &mut rx).await;
    }

    #[tokio::test]
    async fn renders_the_conversation_into_a_buffer() {
        let (mut widget, mut rx) = test_widget(uppercase_engine());
        widget.submit("hi");
        complete_turn(&mut widget, &mut rx).await;

        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let rows: Vec<String> = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect();
        assert!(rows.iter().any(|row| row.contains("› hi")));
        assert!(rows.iter().any(|row| row.contains("• HI")));
    }
}
