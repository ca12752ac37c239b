//! Error types for image generation and prompt assistance.

use serde::Deserialize;
use std::time::Duration;

/// Longest error body kept in a message before truncation.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while talking to the remote services.
#[derive(Debug, thiserror::Error)]
pub enum VexError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited (retry after {retry_after:?}): {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service answered but no part carried image data.
    #[error("Generation failed. The model did not return an image part.")]
    NoImagePart,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving or reading an image file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A failure that carried no description at all.
    #[error("unspecified service failure")]
    Unspecified,
}

impl VexError {
    /// Human-readable message of this failure.
    ///
    /// Errors that came from the service yield its message untouched, so
    /// callers can show or match on the service's own wording; `Display` adds
    /// a category prefix for logs. [`VexError::Unspecified`] and empty remote
    /// messages have no message.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Api { message, .. }
            | Self::RateLimited { message, .. }
            | Self::Auth(message)
            | Self::ContentBlocked(message) => {
                (!message.is_empty()).then(|| message.clone())
            }
            Self::Unspecified => None,
            other => Some(other.to_string()),
        }
    }
}

/// Result type alias for vexgen operations.
pub type Result<T> = std::result::Result<T, VexError>;

/// Trims an error body to a loggable size and strips key material from URLs.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const REDACTED: &str = "key=[redacted]";

    let mut cleaned = text.trim().to_string();
    let mut from = 0;
    while let Some(offset) = cleaned[from..].find("key=") {
        let start = from + offset;
        let rest = &cleaned[start + 4..];
        let end = rest
            .find(|c: char| c == '&' || c == '"' || c.is_whitespace())
            .unwrap_or(rest.len());
        cleaned.replace_range(start..start + 4 + end, REDACTED);
        from = start + REDACTED.len();
    }
    if cleaned.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
        cleaned.push_str("...");
    }
    cleaned
}

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
}

/// Maps a non-success Google API response onto [`VexError`].
///
/// The `message` of the Google error envelope is preserved as-is; a body that
/// is not an envelope is kept (sanitized) as the message.
pub(crate) fn parse_api_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> VexError {
    let message = match serde_json::from_str::<GoogleErrorEnvelope>(text) {
        Ok(envelope) => envelope.error.message,
        Err(_) => sanitize_error_message(text),
    };

    match status {
        429 => VexError::RateLimited {
            retry_after: parse_retry_after(headers).map(Duration::from_secs),
            message,
        },
        401 | 403 => VexError::Auth(message),
        _ => {
            let lower = message.to_lowercase();
            if lower.contains("safety") || lower.contains("prohibited") {
                VexError::ContentBlocked(message)
            } else {
                VexError::Api { status, message }
            }
        }
    }
}
