//! Gemini (Google) chat provider.

use crate::chat::provider::ChatProvider;
use crate::chat::types::{ChatTurn, Role};
use crate::credential::resolve_api_key;
use crate::error::{parse_api_error, Result};
use crate::image::providers::DEFAULT_BASE_URL;
use crate::image::{Content, GenerateContentResponse, Part};
use async_trait::async_trait;
use serde::Serialize;

/// Default model for prompt assistance.
const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";

/// Persona given to the assistant.
pub const SYSTEM_INSTRUCTION: &str = "You are Vex AI assistant. You help users generate perfect image prompts. Suggest artistic styles, lighting, and composition details. Be concise and creative.";

/// Builder for GeminiChatProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiChatProviderBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    system_instruction: Option<String>,
}

impl GeminiChatProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the API base URL (proxies, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the assistant persona.
    pub fn system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(text.into());
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiChatProvider> {
        Ok(GeminiChatProvider {
            client: reqwest::Client::new(),
            api_key: resolve_api_key(self.api_key)?,
            model: self.model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            system_instruction: self
                .system_instruction
                .unwrap_or_else(|| SYSTEM_INSTRUCTION.to_string()),
        })
    }
}

/// Gemini chat provider.
pub struct GeminiChatProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiChatProvider {
    /// Creates a new `GeminiChatProviderBuilder`.
    pub fn builder() -> GeminiChatProviderBuilder {
        GeminiChatProviderBuilder::new()
    }

    fn build_request(&self, transcript: &[ChatTurn], message: &str) -> ChatRequest {
        // Gemini wants the conversation to open with a user turn.
        let mut contents: Vec<Content> = transcript
            .iter()
            .skip_while(|t| t.role == Role::Assistant)
            .map(|t| Content {
                role: Some(t.role.as_gemini_str().to_string()),
                parts: vec![Part::text(t.text.clone())],
            })
            .collect();
        contents.push(Content {
            role: Some(Role::User.as_gemini_str().to_string()),
            parts: vec![Part::text(message)],
        });

        ChatRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(self.system_instruction.clone())],
            },
            contents,
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    async fn send(&self, transcript: &[ChatTurn], message: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request(transcript, message);

        tracing::debug!(model = %self.model, turns = body.contents.len(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_api_error(status.as_u16(), &text, &headers));
        }

        let reply: GenerateContentResponse = response.json().await?;
        Ok(reply.text().unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}
