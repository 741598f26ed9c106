use std::time::Duration;

use reqwest::Client;
use tokio::sync::RwLock;

use crate::error::MediaError;

/// A `reqwest::Client` that can be swapped out before a retry.
pub(crate) struct ReconnectingHttp {
    timeout_secs: u64,
    inner: RwLock<Client>,
}

impl ReconnectingHttp {
    pub(crate) fn new(timeout_secs: u64) -> Result<Self, MediaError> {
        Ok(Self {
            timeout_secs,
            inner: RwLock::new(build(timeout_secs)?),
        })
    }

    pub(crate) async fn current(&self) -> Client {
        self.inner.read().await.clone()
    }

    pub(crate) async fn rebuild(&self) -> Result<(), MediaError> {
        *self.inner.write().await = build(self.timeout_secs)?;
        tracing::debug!("rebuilt media HTTP client");
        Ok(())
    }
}

fn build(timeout_secs: u64) -> Result<Client, MediaError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent("pitchside/0.1 (article-pipeline)")
        .build()?)
}

/// Truncates an error body for inclusion in [`MediaError::Status`].
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
