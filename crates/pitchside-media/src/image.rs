//! Gemini `generateContent` image client.

use base64::Engine as _;
use pitchside_core::AppConfig;
use serde::Deserialize;

use crate::error::MediaError;
use crate::http::{truncate, ReconnectingHttp};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const IMAGE_TIMEOUT_SECS: u64 = 120;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

#[derive(Clone)]
pub struct ImageSettings {
    pub api_key: String,
    pub model: String,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl ImageSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        Some(Self {
            api_key: config.google_api_key.clone()?,
            model: config.image_model.clone(),
            max_attempts: config.max_attempts,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }
}

impl std::fmt::Debug for ImageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSettings")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Decoded image bytes with the MIME type reported by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

pub struct ImageClient {
    settings: ImageSettings,
    base_url: String,
    http: ReconnectingHttp,
}

impl ImageClient {
    /// # Errors
    ///
    /// Returns [`MediaError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: ImageSettings) -> Result<Self, MediaError> {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    /// Client against a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(settings: ImageSettings, base_url: &str) -> Result<Self, MediaError> {
        Ok(Self {
            settings,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: ReconnectingHttp::new(IMAGE_TIMEOUT_SECS)?,
        })
    }

    /// Generates one image for `prompt`.
    ///
    /// Returns `Ok(None)` when the model answers without inline image data.
    ///
    /// # Errors
    ///
    /// - [`MediaError::Status`] / [`MediaError::Http`] after retries.
    /// - [`MediaError::Deserialize`] for an unexpected body.
    /// - [`MediaError::Decode`] / [`MediaError::NotAnImage`] if the inline
    ///   data is not a base64 JPEG or PNG.
    pub async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, MediaError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.settings.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });

        let text = retry_with_backoff(
            self.settings.max_attempts,
            self.settings.backoff_base_ms,
            move || self.http.rebuild(),
            move || {
                let url = url.clone();
                let body = body.clone();
                async move {
                    let response = self
                        .http
                        .current()
                        .await
                        .post(&url)
                        .header("x-goog-api-key", self.settings.api_key.as_str())
                        .json(&body)
                        .send()
                        .await?;
                    let status = response.status();
                    let text = response.text().await?;
                    if !status.is_success() {
                        return Err(MediaError::Status {
                            service: "image generation",
                            status: status.as_u16(),
                            body: truncate(&text, 500),
                        });
                    }
                    Ok(text)
                }
            },
        )
        .await?;

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| MediaError::Deserialize {
                context: format!("generateContent({})", self.settings.model),
                source: e,
            })?;

        let Some(inline) = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
        else {
            tracing::info!(model = %self.settings.model, "image model returned no inline image");
            return Ok(None);
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(inline.data.trim())?;
        if !looks_like_image(&bytes) {
            return Err(MediaError::NotAnImage(bytes.len()));
        }

        Ok(Some(GeneratedImage {
            bytes,
            mime_type: inline.mime_type,
        }))
    }
}

/// JPEG or PNG magic bytes.
#[must_use]
pub fn looks_like_image(bytes: &[u8]) -> bool {
    bytes.starts_with(JPEG_MAGIC) || bytes.starts_with(PNG_MAGIC)
}
