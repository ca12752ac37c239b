//! Image provider trait.

use crate::error::Result;
use crate::image::request::GenerationRequest;
use crate::image::types::InlineImage;
use async_trait::async_trait;

/// A remote service that turns a [`GenerationRequest`] into an image.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image from the given request.
    ///
    /// Implementations must not retry on their own; a failure is reported to
    /// the caller as-is.
    async fn generate(&self, request: &GenerationRequest) -> Result<InlineImage>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
