//! Chat provider trait.

use crate::chat::types::ChatTurn;
use crate::error::Result;
use async_trait::async_trait;

/// A remote service that answers prompt-writing questions.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends `message` after the prior `transcript` and returns the reply text.
    async fn send(&self, transcript: &[ChatTurn], message: &str) -> Result<String>;
}
