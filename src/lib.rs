#![warn(missing_docs)]
//! EditViz - prompt-driven image editing.
//!
//! Pick an image, describe the change in plain words, and get back an image
//! edited by Google's Gemini image models.
//!
//! The crate has three parts:
//!
//! - [`Uploader`] turns a file into an [`EncodedImage`] (mime type plus
//!   base64 payload).
//! - [`EditSession`] holds the [`UiState`] and drives one request at a time.
//! - [`ImageEditor`] is the remote call; [`GeminiEditor`] implements it.
//!
//! # Quick Start
//!
//! ```no_run
//! use editviz::{Config, EditSession, GeminiEditor, UploadSource, Uploader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> editviz::Result<()> {
//!     let config = Config::from_env()?;
//!     let editor = Arc::new(GeminiEditor::from_config(&config)?);
//!     let uploader = Uploader::new().with_max_bytes(config.max_upload_bytes);
//!
//!     let mut session = EditSession::new(editor);
//!     session.upload(&uploader, "street.jpg", UploadSource::Browse).await;
//!     session.set_prompt("Remove the car in the background");
//!     session.generate().await;
//!
//!     let state = session.state();
//!     match (state.edited_result(), state.last_error()) {
//!         (Some(image), _) => image.save("edited.png")?,
//!         (None, Some(message)) => eprintln!("{message}"),
//!         (None, None) => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `editviz` command-line front end.

pub mod config;
mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{
    EditVizError, Result, MISSING_INPUT_MESSAGE, NO_IMAGE_DATA_MESSAGE, UNKNOWN_ERROR_MESSAGE,
};

pub use config::Config;
pub use image::{
    EncodedImage, GeminiEditor, GeminiEditorBuilder, GeminiModel, ImageEditor, ImageFormat,
    UploadSource, Uploader,
};
pub use session::{EditSession, UiState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{EditVizError, Result};
    pub use crate::image::{EncodedImage, GeminiEditor, ImageEditor, UploadSource, Uploader};
    pub use crate::session::{EditSession, UiState};
}
