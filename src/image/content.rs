//! Gemini content parts and image extraction from `generateContent` responses.

use crate::error::{Result, VexError};
use crate::image::types::InlineImage;
use serde::{Deserialize, Serialize};

/// A single unit of content: plain text or inline binary data.
///
/// Parts the crate does not model (function calls, thought signatures with no
/// text, ...) are kept verbatim as [`Part::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Inline image (or other binary) data.
    InlineData {
        /// The encoded payload.
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Any other part shape.
    Other(serde_json::Value),
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an inline-data part.
    pub fn inline(image: InlineImage) -> Self {
        Self::InlineData {
            inline_data: image,
        }
    }
}

/// An ordered list of parts produced or consumed by one role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent on some responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Concatenates all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One alternative response from the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when generation was stopped early.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped (`STOP`, `SAFETY`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Feedback on the prompt itself, returned when it was blocked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason, if the prompt was blocked.
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human-readable explanation of the block.
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

/// Body of a `generateContent` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate responses, best first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Prompt feedback, present when the prompt was blocked.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Returns the concatenated text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()
            .map(Content::text)
    }
}

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

/// Finds the first inline image in the first candidate.
///
/// Leading text parts are skipped. Blocked prompts and safety stops are
/// reported as [`VexError::ContentBlocked`]; anything else without image data
/// is [`VexError::NoImagePart`].
pub fn extract_image(response: &GenerateContentResponse) -> Result<InlineImage> {
    // Blocked prompts come back as HTTP 200 with no candidates.
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
            return Err(VexError::ContentBlocked(msg));
        }
    }

    let candidate = response.candidates.first().ok_or(VexError::NoImagePart)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(VexError::ContentBlocked(format!(
                "Gemini safety filter stopped generation: {reason}"
            )));
        }
    }

    candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .find_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data.clone()),
            _ => None,
        })
        .ok_or(VexError::NoImagePart)
}
