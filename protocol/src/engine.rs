//! Contract between the widget and the pluggable reply backend.
//!
//! An engine is a synchronous function from the user's utterance to a reply.
//! It runs on a background context and must not touch UI state; it either
//! returns the reply text or fails with an [`EngineError`]. Retries, if any,
//! are the engine's own business.

use std::sync::Arc;

use thiserror::Error;

/// Failure raised by a [`ChatEngine`] instead of a reply.
///
/// This is the only expected runtime failure mode of a conversation turn.
/// The widget recovers from it locally; it never propagates to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine reported a failure with the given message.
    #[error("{0}")]
    Failed(String),

    /// The background invocation died before producing a result
    /// (e.g. the engine panicked).
    #[error("engine stopped unexpectedly: {0}")]
    Stopped(String),
}

/// A pluggable reply function.
///
/// Implementations must be callable from a background thread. Plain closures
/// work via the blanket impl:
///
/// ```
/// use palaver_protocol::{ChatEngine, EngineError};
///
/// let engine = |prompt: &str| Ok::<_, EngineError>(prompt.to_uppercase());
/// assert_eq!(engine.reply("hi"), Ok("HI".to_string()));
/// ```
pub trait ChatEngine: Send + Sync {
    fn reply(&self, prompt: &str) -> Result<String, EngineError>;
}

impl<F> ChatEngine for F
where
    F: Fn(&str) -> Result<String, EngineError> + Send + Sync,
{
    fn reply(&self, prompt: &str) -> Result<String, EngineError> {
        self(prompt)
    }
}

/// Shared handle to an engine, cloneable into background tasks.
pub type SharedEngine = Arc<dyn ChatEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn closure_engines_satisfy_the_trait() {
        let upper: SharedEngine = Arc::new(|prompt: &str| Ok::<_, EngineError>(prompt.to_uppercase()));
        assert_eq!(upper.reply("hi"), Ok("HI".to_string()));
    }

    #[test]
    fn failure_display_is_the_raw_message() {
        let err = EngineError::Failed("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }
}
