//! Supabase Storage REST client.
//!
//! Objects are addressed as `{bucket}/{path}`. Uploads overwrite
//! (`x-upsert: true`), existence is a `HEAD` on the authenticated object
//! URL, and the public URL is derived without a request.

use pitchside_core::AppConfig;
use reqwest::StatusCode;

use crate::error::MediaError;
use crate::http::{truncate, ReconnectingHttp};
use crate::retry::retry_with_backoff;

const STORAGE_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct StorageSettings {
    /// Project URL without a trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub key: String,
    pub bucket: String,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl StorageSettings {
    /// `None` unless both `SUPABASE_URL` and `SUPABASE_KEY` are configured.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        Some(Self {
            url: config.supabase_url.clone()?,
            key: config.supabase_key.clone()?,
            bucket: config.image_bucket.clone(),
            max_attempts: config.max_attempts,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("url", &self.url)
            .field("key", &"[redacted]")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

pub struct StorageClient {
    settings: StorageSettings,
    http: ReconnectingHttp,
}

impl StorageClient {
    /// # Errors
    ///
    /// Returns [`MediaError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: StorageSettings) -> Result<Self, MediaError> {
        Ok(Self {
            settings: StorageSettings {
                url: settings.url.trim_end_matches('/').to_string(),
                ..settings
            },
            http: ReconnectingHttp::new(STORAGE_TIMEOUT_SECS)?,
        })
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    /// Public URL of `path` in the configured bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.settings.url, self.settings.bucket, path
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.settings.url, self.settings.bucket, path
        )
    }

    /// Uploads `bytes` to `path`, replacing any existing object, and
    /// returns the public URL.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Status`] or [`MediaError::Http`] once retries
    /// are exhausted or on a non-transient failure.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MediaError> {
        let url = self.object_url(path);
        retry_with_backoff(
            self.settings.max_attempts,
            self.settings.backoff_base_ms,
            move || self.http.rebuild(),
            move || {
                let url = url.clone();
                let bytes = bytes.clone();
                async move {
                    let response = self
                        .http
                        .current()
                        .await
                        .post(&url)
                        .bearer_auth(&self.settings.key)
                        .header("apikey", &self.settings.key)
                        .header("x-upsert", "true")
                        .header(reqwest::header::CONTENT_TYPE, content_type)
                        .body(bytes)
                        .send()
                        .await?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(MediaError::Status {
                            service: "storage",
                            status: status.as_u16(),
                            body: truncate(&body, 500),
                        });
                    }
                    Ok(())
                }
            },
        )
        .await?;

        tracing::debug!(bucket = %self.settings.bucket, path, "uploaded object");
        Ok(self.public_url(path))
    }

    /// Whether an object exists at `path`.
    ///
    /// Storage answers a missing object with 404, or 400 on some
    /// deployments; both read as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Status`] for other non-2xx statuses, or
    /// [`MediaError::Http`] on network failure after retries.
    pub async fn exists(&self, path: &str) -> Result<bool, MediaError> {
        let url = self.object_url(path);
        retry_with_backoff(
            self.settings.max_attempts,
            self.settings.backoff_base_ms,
            move || self.http.rebuild(),
            move || {
                let url = url.clone();
                async move {
                    let response = self
                        .http
                        .current()
                        .await
                        .head(&url)
                        .bearer_auth(&self.settings.key)
                        .header("apikey", &self.settings.key)
                        .send()
                        .await?;
                    match response.status() {
                        s if s.is_success() => Ok(true),
                        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
                        s => Err(MediaError::Status {
                            service: "storage",
                            status: s.as_u16(),
                            body: String::new(),
                        }),
                    }
                }
            },
        )
        .await
    }
}
