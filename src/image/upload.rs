//! Turning user-selected files into [`EncodedImage`]s.

use crate::error::{EditVizError, Result};
use crate::image::types::{EncodedImage, ImageFormat, FALLBACK_MIME_TYPE};
use std::path::Path;

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// How a file reached the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSource {
    /// Picked through a file browser. The picker already filters for images,
    /// so the content type is not checked again.
    Browse,
    /// Dropped onto the drop zone. Must have an `image/*` content type.
    Drop,
}

/// Reads files and encodes them for the editing API.
#[derive(Debug, Clone)]
pub struct Uploader {
    max_bytes: Option<u64>,
}

impl Default for Uploader {
    fn default() -> Self {
        Self {
            max_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Uploader {
    /// Creates an uploader with the default size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size limit. `None` disables the check.
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns the configured size limit.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Reads the whole file at `path` and encodes it.
    pub async fn load(&self, path: impl AsRef<Path>, source: UploadSource) -> Result<EncodedImage> {
        let path = path.as_ref();
        let read_error = |source| EditVizError::Read {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        self.check_size(metadata.len())?;

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        let image = self.encode(&bytes, source, ImageFormat::from_path(path))?;

        tracing::debug!(
            path = %path.display(),
            mime_type = image.mime_type(),
            size = bytes.len(),
            ?source,
            "loaded image"
        );
        Ok(image)
    }

    /// Encodes bytes that are already in memory.
    ///
    /// `hint` is the format implied by the file name, used when the bytes
    /// themselves are not recognised.
    pub fn encode(
        &self,
        bytes: &[u8],
        source: UploadSource,
        hint: Option<ImageFormat>,
    ) -> Result<EncodedImage> {
        self.check_size(bytes.len() as u64)?;

        let format = ImageFormat::from_magic_bytes(bytes).or(hint);
        let mime_type = match (format, source) {
            (Some(format), _) => format.mime_type(),
            (None, UploadSource::Browse) => FALLBACK_MIME_TYPE,
            (None, UploadSource::Drop) => {
                return Err(EditVizError::UnsupportedImage(FALLBACK_MIME_TYPE.into()));
            }
        };

        Ok(EncodedImage::from_bytes(mime_type, bytes))
    }

    fn check_size(&self, size: u64) -> Result<()> {
        match self.max_bytes {
            Some(limit) if size > limit => Err(EditVizError::TooLarge { size, limit }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn temp_file(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_browse_png() {
        let file = temp_file(".png", &PNG_BYTES);
        let image = Uploader::new()
            .load(file.path(), UploadSource::Browse)
            .await
            .unwrap();

        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.decode().unwrap(), PNG_BYTES.to_vec());
    }

    #[tokio::test]
    async fn test_extension_used_when_bytes_unrecognised() {
        let file = temp_file(".jpg", b"not really a jpeg");
        let image = Uploader::new()
            .load(file.path(), UploadSource::Drop)
            .await
            .unwrap();

        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_drop_rejects_non_image() {
        let file = temp_file(".txt", b"hello world");
        let err = Uploader::new()
            .load(file.path(), UploadSource::Drop)
            .await
            .unwrap_err();

        assert!(matches!(err, EditVizError::UnsupportedImage(_)));
    }

    #[tokio::test]
    async fn test_browse_accepts_unknown_type() {
        let file = temp_file(".bin", b"\x00\x01\x02");
        let image = Uploader::new()
            .load(file.path(), UploadSource::Browse)
            .await
            .unwrap();

        assert_eq!(image.mime_type(), FALLBACK_MIME_TYPE);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let err = Uploader::new()
            .load(&path, UploadSource::Browse)
            .await
            .unwrap_err();

        match err {
            EditVizError::Read { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_size_limit() {
        let file = temp_file(".png", &PNG_BYTES);
        let err = Uploader::new()
            .with_max_bytes(Some(4))
            .load(file.path(), UploadSource::Browse)
            .await
            .unwrap_err();
        assert!(matches!(err, EditVizError::TooLarge { size: 12, limit: 4 }));

        let unlimited = Uploader::new().with_max_bytes(None);
        assert!(unlimited
            .load(file.path(), UploadSource::Browse)
            .await
            .is_ok());
    }

    #[test]
    fn test_default_limit() {
        assert_eq!(Uploader::new().max_bytes(), Some(10 * 1024 * 1024));
    }
}
