//! Chat providers.

mod gemini;

pub use gemini::{GeminiChatProvider, GeminiChatProviderBuilder, SYSTEM_INSTRUCTION};
