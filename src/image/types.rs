//! Core types for image generation.

use crate::error::{Result, VexError};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Looks up the format for a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios offered by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4 portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 4:3 landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 9:16 tall portrait aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 16:9 widescreen aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// Every selectable ratio, in picker order.
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::StandardPortrait,
        Self::Standard,
        Self::Portrait,
        Self::Landscape,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::StandardPortrait => "3:4",
            Self::Standard => "4:3",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = VexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| VexError::InvalidRequest(format!("unsupported aspect ratio: {s}")))
    }
}

/// Output resolution tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ImageSize {
    /// Roughly 1024px on the long edge.
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// Roughly 2048px on the long edge.
    #[serde(rename = "2K")]
    TwoK,
    /// Roughly 4096px on the long edge.
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// Every tier, smallest first.
    pub const ALL: [ImageSize; 3] = [Self::OneK, Self::TwoK, Self::FourK];

    /// Returns the tier label sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImageSize {
    type Err = VexError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == wanted)
            .ok_or_else(|| VexError::InvalidRequest(format!("unsupported image size: {s}")))
    }
}

/// An image carried inline as a MIME type plus a raw base64 payload.
///
/// This is both the wire shape of Gemini's `inlineData` and the renderable
/// resource held by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 payload, without any data URI prefix.
    pub data: String,
}

impl InlineImage {
    /// Creates an inline image from an already encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encodes raw image bytes, detecting the format from magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(bytes)
            .ok_or_else(|| VexError::Decode("Unknown image format".into()))?;
        Ok(Self::new(
            format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(bytes),
        ))
    }

    /// Splits a `data:<mime>;base64,<payload>` URI into its components.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| VexError::InvalidRequest("reference image is not a data URI".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| VexError::InvalidRequest("data URI has no payload".into()))?;
        let mime_type = meta.strip_suffix(";base64").ok_or_else(|| {
            VexError::InvalidRequest("data URI payload is not base64 encoded".into())
        })?;
        if mime_type.is_empty() || payload.is_empty() {
            return Err(VexError::InvalidRequest(
                "data URI is missing its MIME type or payload".into(),
            ));
        }
        Ok(Self::new(mime_type, payload))
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| VexError::Decode(e.to_string()))
    }

    /// Returns the known format for this image's MIME type.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// File name for this image: `stem` plus the extension of its MIME type.
    ///
    /// Unknown MIME types fall back to `.png`.
    pub fn default_file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format().unwrap_or_default().extension())
    }

    /// Decodes the payload and writes it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

/// A completed generation, as kept in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "generation results should be stored or displayed"]
pub struct GenerationResult {
    /// Unique identifier of this result.
    pub id: Uuid,
    /// The generated image.
    pub image: InlineImage,
    /// Prompt that produced the image.
    pub prompt: String,
    /// Aspect ratio the image was requested with.
    pub aspect_ratio: AspectRatio,
    /// Resolution tier the image was requested with.
    pub size: ImageSize,
    /// When the result was received.
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    /// Creates a result stamped with a fresh id and the current time.
    pub fn new(
        image: InlineImage,
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
        size: ImageSize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            prompt: prompt.into(),
            aspect_ratio,
            size,
            created_at: Utc::now(),
        }
    }
}
