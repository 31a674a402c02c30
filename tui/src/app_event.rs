//! Application-level events used to coordinate UI actions.

use palaver_protocol::EngineError;

#[derive(Debug)]
pub enum AppEvent {
    /// Result of a completed engine invocation. The background task only
    /// computes this value; the host must hand it back to
    /// [`ChatWidget::on_engine_reply`](crate::ChatWidget::on_engine_reply)
    /// on its event loop so all state mutation stays on the UI context.
    EngineReplyReady(Result<String, EngineError>),

    /// Ask the host to redraw. Sent after transcript mutations and state
    /// transitions so the visible surface never lags the model.
    RequestFrame,
}
