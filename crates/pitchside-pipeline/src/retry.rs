//! Retry for store calls.
//!
//! Only dropped connections and pool-acquire timeouts are retried; sqlx's
//! pool replaces broken connections on the next acquire.

use std::future::Future;
use std::time::Duration;

use crate::error::PipelineError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &PipelineError) -> bool {
    match err {
        PipelineError::Store(e) => e.is_transient(),
        _ => false,
    }
}

/// Runs `operation` up to `max_attempts` times in total, sleeping
/// `backoff_base_ms * 2^(n-1)` (±25 %, capped at 60 s) before retry `n`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
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
                    "transient store error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}
