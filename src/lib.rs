#![warn(missing_docs)]
//! vexgen - prompt-to-image studio for Gemini image models.
//!
//! The crate models one studio session: a prompt editor with aspect ratio and
//! resolution pickers, an optional reference image, a single in-flight
//! generation request, a newest-first history, and a chat assistant that
//! helps write prompts.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vexgen::{EnvCredentialSelector, GeminiProvider, Studio, User};
//!
//! #[tokio::main]
//! async fn main() -> vexgen::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let mut studio = Studio::new(Arc::new(provider), Arc::new(EnvCredentialSelector::new()));
//!     studio.start(User::new("me", "Me", "me@example.com")).await;
//!
//!     studio.state_mut().set_prompt("A red fox in fresh snow");
//!     studio.submit().await;
//!
//!     if let Some(result) = studio.state().current_result() {
//!         result.image.save("fox.png")?;
//!     } else if let Some(error) = studio.state().error() {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): HTTP providers for the Gemini API
//! - `cli`: the `vex` command-line front end

pub mod chat;
pub mod classify;
pub mod credential;
mod error;
pub mod image;
pub mod session;
mod studio;

// Re-export error types at crate root
pub use error::{Result, VexError};

pub use chat::{ChatAssistant, ChatProvider, ChatTurn, Role};
pub use classify::{ErrorClassifier, Failure, FailureKind, MarkerClassifier};
pub use credential::{CredentialSelector, EnvCredentialSelector};
pub use image::{
    AspectRatio, GenerationRequest, GenerationResult, ImageFormat, ImageProvider, ImageSize,
    InlineImage, RequestBuilder,
};
pub use session::{Phase, SessionState, User};
pub use studio::Studio;

#[cfg(feature = "gemini")]
pub use chat::providers::{GeminiChatProvider, GeminiChatProviderBuilder};

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::chat::{ChatAssistant, ChatProvider};
    pub use crate::credential::CredentialSelector;
    pub use crate::error::{Result, VexError};
    pub use crate::image::{GenerationRequest, ImageProvider, InlineImage};
    pub use crate::session::SessionState;
    pub use crate::studio::Studio;

    #[cfg(feature = "gemini")]
    pub use crate::chat::providers::GeminiChatProvider;

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiProvider;
}
