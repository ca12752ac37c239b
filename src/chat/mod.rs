//! Prompt-writing assistant.

mod assistant;
mod provider;
#[cfg(feature = "gemini")]
pub mod providers;
mod types;

pub use assistant::{ChatAssistant, EMPTY_REPLY, GREETING};
pub use provider::ChatProvider;
pub use types::{ChatTurn, Role};
