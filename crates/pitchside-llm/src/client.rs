use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pitchside_core::AppConfig;
use reqwest::Client;
use tokio::sync::RwLock;

use crate::error::LlmError;
use crate::retry::retry_with_backoff;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Connection and retry settings for [`LlmClient`].
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl LlmSettings {
    /// Settings from application config, or `None` when no API key is set.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.llm_api_key.clone()?;
        Some(Self {
            api_key,
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            timeout_secs: config.llm_timeout_secs,
            max_attempts: config.max_attempts,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish()
    }
}

/// Chat-completions client.
///
/// The inner `reqwest::Client` sits behind a lock so it can be replaced
/// before a retry.
pub struct LlmClient {
    settings: LlmSettings,
    http: RwLock<Client>,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let http = build_http(settings.timeout_secs)?;
        Ok(Self {
            settings: LlmSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
            http: RwLock::new(http),
        })
    }

    /// Same as [`LlmClient::new`] with the base URL overridden, for pointing
    /// at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(settings: LlmSettings, base_url: &str) -> Result<Self, LlmError> {
        Self::new(LlmSettings {
            base_url: base_url.to_string(),
            ..settings
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Sends a single user prompt, optionally preceded by a system message.
    ///
    /// # Errors
    ///
    /// See [`LlmClient::chat`].
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        self.chat(&messages).await
    }

    /// Sends `messages` and returns the first choice's content, trimmed.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Http`] / [`LlmError::Status`] once retries are exhausted
    ///   or on a non-transient failure.
    /// - [`LlmError::Deserialize`] if the body is not a chat-completions
    ///   response.
    /// - [`LlmError::EmptyResponse`] if there is no content.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let attempts = AtomicU32::new(0);
        let this = self;
        let attempts_ref = &attempts;
        retry_with_backoff(
            self.settings.max_attempts,
            self.settings.backoff_base_ms,
            move || async move {
                if attempts_ref.fetch_add(1, Ordering::SeqCst) > 0 {
                    this.reconnect().await?;
                }
                this.send(messages).await
            },
        )
        .await
    }

    async fn reconnect(&self) -> Result<(), LlmError> {
        let fresh = build_http(self.settings.timeout_secs)?;
        *self.http.write().await = fresh;
        tracing::debug!(base_url = %self.settings.base_url, "rebuilt LLM HTTP client");
        Ok(())
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let http = self.http.read().await.clone();
        let url = format!("{}/chat/completions", self.settings.base_url);
        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
        };

        let response = http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: url.clone(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(model = %self.settings.model, chars = content.len(), "LLM response received");
        Ok(content)
    }
}

fn build_http(timeout_secs: u64) -> Result<Client, LlmError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent("pitchside/0.1 (article-pipeline)")
        .build()?)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
