//! API credential lookup and the credential-selection capability.

use crate::error::{Result, VexError};
use async_trait::async_trait;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Returns the explicit key, or the one from [`API_KEY_ENV`].
pub(crate) fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
        .ok_or_else(|| VexError::Auth(format!("{API_KEY_ENV} not set and no API key provided")))
}

/// An environment-provided flow for choosing the API credential.
///
/// The studio asks it once when a session starts and again whenever a
/// generation fails with a credential problem. Opening the picker is
/// fire-and-forget: its completion is awaited, its outcome is not checked.
#[async_trait]
pub trait CredentialSelector: Send + Sync {
    /// Whether a credential is currently selected.
    async fn has_selected_credential(&self) -> bool;

    /// Asks the user to select (or re-select) a credential.
    async fn open_picker(&self);
}

/// Credential selector backed by the process environment.
///
/// There is no interactive picker here; "opening" it logs how to supply a key.
#[derive(Debug, Clone)]
pub struct EnvCredentialSelector {
    var: String,
}

impl EnvCredentialSelector {
    /// Watches [`API_KEY_ENV`].
    pub fn new() -> Self {
        Self::with_var(API_KEY_ENV)
    }

    /// Watches a custom environment variable.
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialSelector for EnvCredentialSelector {
    async fn has_selected_credential(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    async fn open_picker(&self) {
        tracing::warn!(
            var = %self.var,
            "API key needs to be (re)selected: export {} with a key from a paid project, see https://ai.google.dev/gemini-api/docs/billing",
            self.var
        );
    }
}
