//! Editing session: the single holder of UI state.
//!
//! [`EditSession`] owns the current [`UiState`] and is the only thing that
//! mutates it. Every change is published on a [`watch`] channel so a display
//! can re-render, including while a request is outstanding.
//!
//! ```no_run
//! use editviz::{EditSession, GeminiEditor, UploadSource, Uploader};
//! use std::sync::Arc;
//!
//! # async fn run() -> editviz::Result<()> {
//! let editor = Arc::new(GeminiEditor::builder().build()?);
//! let mut session = EditSession::new(editor);
//!
//! session.upload(&Uploader::new(), "cat.png", UploadSource::Browse).await;
//! session.set_prompt("Make the sky look like a sunset");
//! session.generate().await;
//!
//! if let Some(url) = session.state().edited_image_url() {
//!     println!("edited image: {} characters", url.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::EditVizError;
use crate::image::{EncodedImage, ImageEditor, UploadSource, Uploader};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of everything the display needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    original_image: Option<EncodedImage>,
    edited_result: Option<EncodedImage>,
    prompt: String,
    is_busy: bool,
    last_error: Option<String>,
}

impl UiState {
    /// The image the user selected.
    pub fn original_image(&self) -> Option<&EncodedImage> {
        self.original_image.as_ref()
    }

    /// The image returned by the last successful request.
    pub fn edited_result(&self) -> Option<&EncodedImage> {
        self.edited_result.as_ref()
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// True while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    /// Message for the error banner.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Displayable reference for the original image.
    pub fn original_image_url(&self) -> Option<String> {
        self.original_image.as_ref().map(EncodedImage::to_data_url)
    }

    /// Displayable reference for the edited image.
    pub fn edited_image_url(&self) -> Option<String> {
        self.edited_result.as_ref().map(EncodedImage::to_data_url)
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        !self.is_busy && self.original_image.is_some() && has_prompt(&self.prompt)
    }

    /// Whether a new image may be selected.
    pub fn can_upload(&self) -> bool {
        !self.is_busy
    }
}

fn has_prompt(prompt: &str) -> bool {
    !prompt.is_empty()
}

/// Drives one image through upload, prompt and generation.
pub struct EditSession {
    editor: Arc<dyn ImageEditor>,
    state: watch::Sender<UiState>,
}

impl EditSession {
    /// Creates a session that sends requests through `editor`.
    pub fn new(editor: Arc<dyn ImageEditor>) -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self { editor, state }
    }

    /// Returns a receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Name of the backing editor.
    pub fn editor_name(&self) -> &str {
        self.editor.name()
    }

    /// Replaces the original image, clearing any previous result or error.
    pub fn select_image(&mut self, image: EncodedImage) {
        if self.state.borrow().is_busy {
            tracing::debug!("ignoring image selection while busy");
            return;
        }
        self.state.send_modify(|s| {
            s.original_image = Some(image);
            s.edited_result = None;
            s.last_error = None;
        });
    }

    /// Shows an upload failure. The current image is kept.
    pub fn report_upload_failure(&mut self, err: &EditVizError) {
        tracing::warn!(error = %err, "upload failed");
        let message = err.user_message();
        self.state.send_modify(|s| s.last_error = Some(message));
    }

    /// Loads `path` through `uploader` and selects it, or reports the failure.
    ///
    /// Returns true when a new image was selected.
    pub async fn upload(
        &mut self,
        uploader: &Uploader,
        path: impl AsRef<Path>,
        source: UploadSource,
    ) -> bool {
        if !self.state.borrow().can_upload() {
            return false;
        }
        match uploader.load(path, source).await {
            Ok(image) => {
                self.select_image(image);
                true
            }
            Err(err) => {
                self.report_upload_failure(&err);
                false
            }
        }
    }

    /// Loads `path`, sets `prompt` and generates, stopping at the first
    /// failure so its message stays in `last_error`.
    ///
    /// Returns true when an edited image was produced.
    pub async fn edit_file(
        &mut self,
        uploader: &Uploader,
        path: impl AsRef<Path>,
        prompt: impl Into<String>,
    ) -> bool {
        if !self.upload(uploader, path, UploadSource::Browse).await {
            return false;
        }
        self.set_prompt(prompt);
        self.generate().await;
        self.state.borrow().edited_result.is_some()
    }

    /// Sets the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.state.send_modify(|s| s.prompt = prompt);
    }

    /// Sends the current image and prompt to the editor.
    ///
    /// Without an image or prompt the fixed validation message is shown and
    /// nothing is sent. Otherwise exactly one request is issued and the
    /// session stays busy until it resolves.
    pub async fn generate(&mut self) {
        let request = {
            let state = self.state.borrow();
            if state.is_busy {
                return;
            }
            state
                .original_image
                .clone()
                .filter(|_| has_prompt(&state.prompt))
                .map(|image| (image, state.prompt.clone()))
        };
        let Some((image, prompt)) = request else {
            self.fail(&EditVizError::MissingInput);
            return;
        };

        self.state.send_modify(|s| {
            s.is_busy = true;
            s.last_error = None;
            s.edited_result = None;
        });
        tracing::debug!(editor = self.editor.name(), "edit request sent");

        let outcome = self.editor.edit(&image, &prompt).await;

        match outcome {
            Ok(edited) => {
                tracing::info!(mime_type = edited.mime_type(), "edit resolved");
                self.state.send_modify(|s| {
                    s.is_busy = false;
                    s.edited_result = Some(edited);
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "edit failed");
                self.fail(&err);
            }
        }
    }

    fn fail(&mut self, err: &EditVizError) {
        let message = err.user_message();
        self.state.send_modify(|s| {
            s.is_busy = false;
            s.last_error = Some(message);
        });
    }
}
