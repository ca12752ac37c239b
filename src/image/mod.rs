//! Image generation module.

pub mod content;
mod provider;
#[cfg(feature = "gemini")]
pub mod providers;
mod request;
mod types;

pub use content::{extract_image, Candidate, Content, GenerateContentResponse, Part};
pub use provider::ImageProvider;
pub use request::{GenerationRequest, RequestBuilder};
pub use types::{AspectRatio, GenerationResult, ImageFormat, ImageSize, InlineImage};
