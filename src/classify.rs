//! Classification of image generation failures into user-facing outcomes.

use crate::error::VexError;

/// Phrase the service uses when the selected key points at nothing usable.
pub const CREDENTIAL_MARKER: &str = "Requested entity was not found";

/// Message shown when a credential problem is detected.
pub const CREDENTIAL_MESSAGE: &str = "API Key issue detected. Please re-select a valid project key.";

/// Message shown when a failure carries no text of its own.
pub const GENERIC_FALLBACK: &str = "Failed to generate image.";

/// Assistant reply appended when a chat request fails.
pub const CHAT_FALLBACK: &str = "Error connecting to brain. Try again later.";

/// Kind of a classified generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The credential is invalid or unselected; the picker should be reopened.
    Credential,
    /// Any other failure.
    Generic,
}

/// A failure ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Text for the error banner.
    pub message: String,
}

impl Failure {
    /// A credential failure with the fixed remediation message.
    pub fn credential() -> Self {
        Self {
            kind: FailureKind::Credential,
            message: CREDENTIAL_MESSAGE.to_string(),
        }
    }

    /// A generic failure; falls back to [`GENERIC_FALLBACK`] without a message.
    pub fn generic(message: Option<String>) -> Self {
        Self {
            kind: FailureKind::Generic,
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FALLBACK.to_string()),
        }
    }

    /// Whether the credential picker should be reopened.
    pub fn needs_credential(&self) -> bool {
        self.kind == FailureKind::Credential
    }
}

/// Decides how a generation failure is presented.
pub trait ErrorClassifier: Send + Sync {
    /// Classifies `error`.
    fn classify(&self, error: &VexError) -> Failure;
}

/// Classifies by looking for [`CREDENTIAL_MARKER`] in the failure message.
///
/// The match depends on the service's exact wording. A structured error code
/// would be a better signal once the API exposes one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerClassifier;

impl ErrorClassifier for MarkerClassifier {
    fn classify(&self, error: &VexError) -> Failure {
        let message = error.message();
        match message {
            Some(ref m) if m.contains(CREDENTIAL_MARKER) => Failure::credential(),
            _ => Failure::generic(message),
        }
    }
}
