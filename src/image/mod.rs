//! Image encoding, uploading and the remote editing backend.

mod editor;
mod gemini;
mod types;
mod upload;

pub use editor::ImageEditor;
pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use types::{EncodedImage, ImageFormat, FALLBACK_MIME_TYPE};
pub use upload::{UploadSource, Uploader, DEFAULT_MAX_UPLOAD_BYTES};
