mod engine;
mod message;

pub use engine::ChatEngine;
pub use engine::EngineError;
pub use engine::SharedEngine;
pub use message::ChatMessage;
pub use message::Direction;
pub use message::Sender;
