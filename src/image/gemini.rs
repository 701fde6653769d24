//! Gemini (Google) image editing backend.

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{sanitize_error_message, EditVizError, Result};
use crate::image::editor::ImageEditor;
use crate::image::types::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// All variants, in display order.
    pub const ALL: [GeminiModel; 2] = [Self::NanoBanana, Self::NanoBananaPro];

    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }

    /// Returns the short name accepted on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::NanoBanana => "nano-banana",
            Self::NanoBananaPro => "nano-banana-pro",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = EditVizError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.short_name().eq_ignore_ascii_case(s) || m.as_str() == s)
            .ok_or_else(|| {
                EditVizError::Config(format!(
                    "unknown model '{s}' (expected nano-banana or nano-banana-pro)"
                ))
            })
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the environment (see [`Config`]).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API root (defaults to the public Gemini endpoint).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a request timeout. Without one a request waits indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the editor, resolving the API key.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => Config::from_env()?.api_key,
        };

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(GeminiEditor {
            client: client.build()?,
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: self.timeout,
        })
    }
}

/// Gemini image editing backend.
///
/// Built once at startup and shared with the session as an
/// [`ImageEditor`].
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Builds an editor from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder()
            .api_key(config.api_key.clone())
            .model(config.model)
            .base_url(config.base_url.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str()
        )
    }

    async fn edit_impl(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage> {
        let start = Instant::now();
        let body = GeminiRequest::edit(image, prompt);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = image.mime_type(),
            input_bytes = image.decoded_len(),
            "sending Gemini edit request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(|e| self.transport_error(e))?;
        let edited = gemini_response.into_image()?;

        tracing::info!(
            model = self.model.as_str(),
            mime_type = edited.mime_type(),
            output_bytes = edited.decoded_len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini edit complete"
        );
        Ok(edited)
    }

    fn transport_error(&self, err: reqwest::Error) -> EditVizError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => EditVizError::Timeout(timeout),
            _ if err.is_decode() => EditVizError::Decode(err.to_string()),
            _ => EditVizError::Network(err),
        }
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage> {
        self.edit_impl(image, prompt).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Maps a non-success response to an error carrying the service's message.
fn parse_error(status: u16, text: &str) -> EditVizError {
    let message = serde_json::from_str::<GeminiErrorResponse>(text)
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| text.to_string());
    let message = sanitize_error_message(&message);

    match status {
        401 | 403 if !message.is_empty() => EditVizError::Auth(message),
        401 | 403 => EditVizError::Auth("invalid API key".into()),
        404 if !message.is_empty() => EditVizError::InvalidRequest(message),
        404 => EditVizError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        ),
        _ => EditVizError::api(status, message),
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - either inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    /// Image first, then the instruction, asking for an image back.
    fn edit(image: &EncodedImage, prompt: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.data().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiResponse {
    /// Returns the first inline image part of the first candidate.
    fn into_image(self) -> Result<EncodedImage> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            tracing::warn!(?block_reason, "Gemini response has no candidates");
            return Err(EditVizError::NoImageData);
        };

        let finish_reason = candidate.finish_reason;
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        let mut texts = Vec::new();
        for part in parts {
            if let Some(inline) = part.inline_data {
                return Ok(EncodedImage::new(inline.mime_type, inline.data));
            }
            if let Some(text) = part.text {
                texts.push(text);
            }
        }

        tracing::warn!(
            ?block_reason,
            ?finish_reason,
            text = %texts.join(" "),
            "Gemini response has no inline image part"
        );
        Err(EditVizError::NoImageData)
    }
}
