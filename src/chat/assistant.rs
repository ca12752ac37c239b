//! The chat assistant widget state.

use crate::chat::provider::ChatProvider;
use crate::chat::types::ChatTurn;
use crate::classify::CHAT_FALLBACK;
use std::sync::Arc;

/// First assistant turn of every transcript.
pub const GREETING: &str = "Hi! I'm the Vex AI assistant. Need help with a prompt? Just ask!";

/// Reply used when the service answers with no text.
pub const EMPTY_REPLY: &str = "I'm sorry, I couldn't process that request.";

/// Transcript plus the provider that extends it.
///
/// Failures never leave this type: they become one assistant turn holding
/// [`CHAT_FALLBACK`].
pub struct ChatAssistant {
    provider: Arc<dyn ChatProvider>,
    transcript: Vec<ChatTurn>,
    loading: bool,
}

impl ChatAssistant {
    /// Creates an assistant whose transcript starts with [`GREETING`].
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            transcript: vec![ChatTurn::assistant(GREETING)],
            loading: false,
        }
    }

    /// All turns so far, oldest first.
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Whether a reply is being awaited.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Sends `input` and appends the reply.
    ///
    /// Blank input, or input while a reply is pending, is ignored and returns
    /// false.
    pub async fn send(&mut self, input: &str) -> bool {
        let message = input.trim();
        if message.is_empty() || self.loading {
            return false;
        }

        let prior_len = self.transcript.len();
        self.transcript.push(ChatTurn::user(message));
        self.loading = true;

        let reply = match self
            .provider
            .send(&self.transcript[..prior_len], message)
            .await
        {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("chat request failed: {e}");
                CHAT_FALLBACK.to_string()
            }
        };

        self.transcript.push(ChatTurn::assistant(reply));
        self.loading = false;
        true
    }
}
