//! Core types for image editing.

use crate::error::{EditVizError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mime type used when the content type of a file cannot be detected.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Looks up a format by MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Attempts to detect format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An image held as text-safe data: a mime type plus a base64 payload.
///
/// The two fields are kept apart from the moment of creation. Combining them
/// into a displayable `data:` reference is [`EncodedImage::to_data_url`], and
/// [`EncodedImage::from_data_url`] is its inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    mime_type: String,
    data: String,
}

impl EncodedImage {
    /// Creates an image from an already encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encodes raw bytes as base64.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Parses a `data:<mime>;base64,<payload>` reference.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| EditVizError::Decode("data URL must start with 'data:'".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditVizError::Decode("data URL has no payload separator".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| EditVizError::Decode("data URL is not base64 encoded".into()))?;
        if mime_type.is_empty() {
            return Err(EditVizError::Decode("data URL has no mime type".into()));
        }
        Ok(Self::new(mime_type, payload))
    }

    /// Returns the declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the known format for the declared MIME type, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Formats the image as a displayable data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| EditVizError::Decode(e.to_string()))
    }

    /// Approximate size of the decoded payload in bytes.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }

    /// Decodes the payload and writes it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"GIF89a\x01\x00"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"plain text"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(
            ImageFormat::from_path(Path::new("photos/cat.webp")),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_data_url_formatting() {
        let image = EncodedImage::new("image/png", "iVBORw0KGgo=");
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_data_url_parsing() {
        let image = EncodedImage::from_data_url("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.data(), "/9j/4AAQ");
        assert_eq!(image.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_data_url_parsing_rejects_malformed() {
        assert!(EncodedImage::from_data_url("image/png;base64,abc").is_err());
        assert!(EncodedImage::from_data_url("data:image/png;base64").is_err());
        assert!(EncodedImage::from_data_url("data:image/png,abc").is_err());
        assert!(EncodedImage::from_data_url("data:;base64,abc").is_err());
    }

    #[test]
    fn test_bytes_encode_and_decode() {
        let image = EncodedImage::from_bytes("image/png", &PNG_MAGIC);
        assert_eq!(image.decode().unwrap(), PNG_MAGIC.to_vec());
        assert_eq!(image.decoded_len(), PNG_MAGIC.len());

        let odd = EncodedImage::from_bytes("image/gif", b"GIF89a!");
        assert_eq!(odd.decoded_len(), 7);
    }

    #[test]
    fn test_decode_invalid_payload() {
        let image = EncodedImage::new("image/png", "not base64!!");
        assert!(matches!(image.decode(), Err(EditVizError::Decode(_))));
    }

    #[test]
    fn test_serializes_camel_case() {
        let image = EncodedImage::new("image/png", "AAAA");
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["data"], "AAAA");
    }
}
