//! Error types for image editing.

use std::path::PathBuf;
use std::time::Duration;

/// Message shown when generation is triggered without an image or prompt.
pub const MISSING_INPUT_MESSAGE: &str = "Please upload an image and enter a prompt.";

/// Message shown when the API answered but returned no image part.
pub const NO_IMAGE_DATA_MESSAGE: &str = "No image data found in the API response.";

/// Fallback for failures that carry no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str =
    "An unknown error occurred while communicating with the Gemini API.";

/// Maximum length of an error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while uploading or editing an image.
#[derive(Debug, thiserror::Error)]
pub enum EditVizError {
    /// Generation was triggered without an image or without a prompt.
    #[error("{}", MISSING_INPUT_MESSAGE)]
    MissingInput,

    /// The selected file could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dropped file does not look like an image.
    #[error("unsupported file type: {0} (expected an image)")]
    UnsupportedImage(String),

    /// The selected file exceeds the upload limit.
    #[error("file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid request parameters (e.g. unknown model).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response contained no inline image part.
    #[error("{}", NO_IMAGE_DATA_MESSAGE)]
    NoImageData,

    /// Failed to decode base64 data or a data URL.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g. saving the edited image).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A failure that exposed no message.
    #[error("{}", UNKNOWN_ERROR_MESSAGE)]
    Unknown,
}

impl EditVizError {
    /// Returns the text shown to the user in the error banner.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Builds an API error, falling back to [`EditVizError::Unknown`] when
    /// the service gave no message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Unknown
        } else {
            Self::Api { status, message }
        }
    }
}

/// Collapses whitespace and truncates an error body for display.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{truncated}...")
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, EditVizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_messages() {
        assert_eq!(
            EditVizError::MissingInput.user_message(),
            "Please upload an image and enter a prompt."
        );
        assert_eq!(
            EditVizError::NoImageData.user_message(),
            "No image data found in the API response."
        );
        assert_eq!(EditVizError::Unknown.user_message(), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_display() {
        let err = EditVizError::Api {
            status: 400,
            message: "Image too small".into(),
        };
        assert_eq!(err.to_string(), "API error: 400 - Image too small");

        let err = EditVizError::TooLarge {
            size: 20,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "file is 20 bytes, larger than the 10 byte limit"
        );
    }

    #[test]
    fn test_api_without_message_is_unknown() {
        assert!(matches!(EditVizError::api(500, "  "), EditVizError::Unknown));
        assert!(matches!(
            EditVizError::api(500, "backend error"),
            EditVizError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_read_error_names_path() {
        let err = EditVizError::Read {
            path: PathBuf::from("cat.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.user_message(), "could not read cat.png: missing");
    }

    #[test]
    fn test_sanitize_error_message() {
        assert_eq!(sanitize_error_message("  a\n  b\tc "), "a b c");

        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN + 10);
        let sanitized = sanitize_error_message(&long);
        assert!(sanitized.ends_with("..."));
        assert_eq!(sanitized.len(), MAX_ERROR_MESSAGE_LEN + 3);
    }
}
