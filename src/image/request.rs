//! Building validated generation requests from editor selections.

use crate::error::{Result, VexError};
use crate::image::content::Part;
use crate::image::types::{AspectRatio, ImageSize, InlineImage};
use serde::Serialize;

/// A validated request to generate an image.
///
/// Only [`RequestBuilder`] creates these, so the prompt is always trimmed and
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    aspect_ratio: AspectRatio,
    size: ImageSize,
    #[serde(skip)]
    reference_image: Option<InlineImage>,
}

impl GenerationRequest {
    /// Starts a builder for the given prompt.
    pub fn builder(prompt: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(prompt)
    }

    /// The trimmed prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Requested aspect ratio.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Requested resolution tier.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Reference image sent ahead of the prompt, if any.
    pub fn reference_image(&self) -> Option<&InlineImage> {
        self.reference_image.as_ref()
    }

    /// Returns true if this request edits a reference image.
    pub fn is_edit(&self) -> bool {
        self.reference_image.is_some()
    }

    /// Content parts in the order the service should read them: the reference
    /// image first, then the text instruction.
    pub fn parts(&self) -> Vec<Part> {
        let mut parts = Vec::with_capacity(2);
        if let Some(ref image) = self.reference_image {
            parts.push(Part::inline(image.clone()));
        }
        parts.push(Part::text(self.prompt.clone()));
        parts
    }
}

/// Assembles a [`GenerationRequest`] from the current selections.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RequestBuilder {
    prompt: String,
    aspect_ratio: AspectRatio,
    size: Option<ImageSize>,
    reference_image: Option<InlineImage>,
}

impl RequestBuilder {
    /// Creates a builder with the default ratio and no reference image.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets the aspect ratio.
    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the resolution tier. Unset means the smallest tier.
    pub fn size(mut self, size: Option<ImageSize>) -> Self {
        self.size = size;
        self
    }

    /// Attaches an already split reference image.
    pub fn reference_image(mut self, image: Option<InlineImage>) -> Self {
        self.reference_image = image;
        self
    }

    /// Attaches a reference image given as a `data:` URI.
    pub fn reference_data_url(mut self, url: &str) -> Result<Self> {
        self.reference_image = Some(InlineImage::from_data_url(url)?);
        Ok(self)
    }

    /// Validates the selections and produces the request.
    pub fn build(self) -> Result<GenerationRequest> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(VexError::InvalidRequest("prompt must not be empty".into()));
        }

        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            aspect_ratio: self.aspect_ratio,
            size: self.size.unwrap_or_default(),
            reference_image: self.reference_image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_prompts_are_refused() {
        for prompt in ["", "   ", "\n\t "] {
            assert!(matches!(
                RequestBuilder::new(prompt).build(),
                Err(VexError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn test_prompt_is_trimmed() {
        let req = RequestBuilder::new("  a red fox \n").build().unwrap();
        assert_eq!(req.prompt(), "a red fox");
    }

    #[test]
    fn test_size_defaults_to_1k() {
        let req = RequestBuilder::new("a red fox").build().unwrap();
        assert_eq!(req.size(), ImageSize::OneK);
        assert_eq!(req.aspect_ratio(), AspectRatio::Square);

        let req = RequestBuilder::new("a red fox")
            .size(Some(ImageSize::FourK))
            .aspect_ratio(AspectRatio::Landscape)
            .build()
            .unwrap();
        assert_eq!(req.size(), ImageSize::FourK);
        assert_eq!(req.aspect_ratio(), AspectRatio::Landscape);
    }

    #[test]
    fn test_text_only_parts() {
        let req = RequestBuilder::new("a red fox").build().unwrap();
        assert!(!req.is_edit());
        assert_eq!(req.parts(), vec![Part::text("a red fox")]);
    }

    #[test]
    fn test_reference_image_leads_the_parts() {
        let req = RequestBuilder::new("make it blue")
            .reference_data_url("data:image/jpeg;base64,/9j/4AAQ")
            .unwrap()
            .build()
            .unwrap();

        let parts = req.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::inline(InlineImage::new("image/jpeg", "/9j/4AAQ"))
        );
        assert_eq!(parts[1], Part::text("make it blue"));
    }

    #[test]
    fn test_reference_data_url_round_trip() {
        let original = InlineImage::new("image/webp", "UklGRgAAAABXRUJQ");
        let req = RequestBuilder::new("edit")
            .reference_data_url(&original.to_data_url())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.reference_image(), Some(&original));
    }

    #[test]
    fn test_bad_reference_is_rejected() {
        assert!(RequestBuilder::new("edit")
            .reference_data_url("https://example.com/cat.png")
            .is_err());
    }
}
