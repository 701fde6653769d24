//! Image editor trait.

use crate::error::Result;
use crate::image::types::EncodedImage;
use async_trait::async_trait;

/// A remote service that edits an image according to a text instruction.
///
/// Implementations issue exactly one request per call and never retry.
/// Every failure is returned as an [`EditVizError`](crate::EditVizError)
/// whose [`user_message`](crate::EditVizError::user_message) can be shown
/// verbatim.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends `image` with `prompt` and returns the edited image.
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}
