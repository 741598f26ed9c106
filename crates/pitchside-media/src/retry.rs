use std::future::Future;
use std::time::Duration;

use crate::error::MediaError;

const MAX_DELAY_MS: u64 = 60_000;

/// Timeouts, connection failures, 429 and 5xx.
pub(crate) fn is_retriable(err: &MediaError) -> bool {
    match err {
        MediaError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        MediaError::Status { status, .. } => *status == 429 || (500..600).contains(status),
        MediaError::Deserialize { .. } | MediaError::Decode(_) | MediaError::NotAnImage(_) => {
            false
        }
    }
}

/// Runs `operation` up to `max_attempts` times in total, sleeping
/// `backoff_base_ms * 2^(n-1)` (±25 %, capped at 60 s) before retry `n`.
/// `on_retry` runs before each retry.
pub(crate) async fn retry_with_backoff<T, F, Fut, R, RFut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    mut on_retry: R,
    mut operation: F,
) -> Result<T, MediaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MediaError>>,
    R: FnMut() -> RFut,
    RFut: Future<Output = Result<(), MediaError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "media transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                on_retry().await?;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn status(code: u16) -> MediaError {
        MediaError::Status {
            service: "storage",
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn classifies_statuses() {
        assert!(is_retriable(&status(502)));
        assert!(is_retriable(&status(429)));
        assert!(!is_retriable(&status(403)));
        assert!(!is_retriable(&MediaError::NotAnImage(4)));
    }

    #[tokio::test]
    async fn rebuilds_before_each_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let rebuilds = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let r = Arc::clone(&rebuilds);
        let result = retry_with_backoff(
            3,
            0,
            || {
                let r = Arc::clone(&r);
                async move {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(status(500))
                    } else {
                        Ok("done")
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(rebuilds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_error_skips_rebuild() {
        let rebuilds = Arc::new(AtomicU32::new(0));
        let r = Arc::clone(&rebuilds);
        let result: Result<(), _> = retry_with_backoff(
            3,
            0,
            || {
                let r = Arc::clone(&r);
                async move {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            || async { Err(status(404)) },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(rebuilds.load(Ordering::SeqCst), 0);
    }
}
