//! Image generation providers.

mod gemini;

pub use gemini::{GeminiModel, GeminiProvider, GeminiProviderBuilder};

pub(crate) use gemini::DEFAULT_BASE_URL;
