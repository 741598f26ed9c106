//! Processing state machine.
//!
//! ```text
//! (no row) --start--> in_progress --complete--> completed
//!                         |  ^
//!                       fail  start
//!                         v  |
//!                        failed
//! ```
//!
//! `start` is allowed from any state; the batch only offers fixtures that
//! are not `completed`.

use uuid::Uuid;

use crate::error::PipelineError;
use crate::traits::FixtureStore;

/// A fresh execution id, `run_<32 hex chars>`.
#[must_use]
pub fn new_execution_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Marks the fixture `in_progress` under a new execution id.
///
/// Returns `(processing_id, execution_id)`.
///
/// # Errors
///
/// Propagates the store error; the caller routes it to [`fail`].
pub async fn start(
    store: &dyn FixtureStore,
    fixture_id: Uuid,
) -> Result<(Uuid, String), PipelineError> {
    let execution_id = new_execution_id();
    let processing_id = store.start_processing(fixture_id, &execution_id).await?;
    tracing::info!(%fixture_id, %processing_id, %execution_id, "processing started");
    Ok((processing_id, execution_id))
}

/// Marks the fixture `completed`.
///
/// A missing status row is logged and treated as success.
///
/// # Errors
///
/// Propagates any other store error.
pub async fn complete(
    store: &dyn FixtureStore,
    fixture_id: Uuid,
    articles_generated: u32,
    topics_generated: u32,
) -> Result<(), PipelineError> {
    match store
        .complete_processing(fixture_id, articles_generated, topics_generated)
        .await
    {
        Ok(()) => {
            tracing::info!(
                %fixture_id,
                articles_generated,
                topics_generated,
                "processing completed"
            );
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::error!(%fixture_id, "no processing status row to complete");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Marks the fixture `failed`. Never fails: store errors are logged.
pub async fn fail(store: &dyn FixtureStore, fixture_id: Uuid, message: &str) {
    match store.fail_processing(fixture_id, message).await {
        Ok(()) => tracing::warn!(%fixture_id, error = message, "processing failed"),
        Err(e) => tracing::error!(
            %fixture_id,
            error = message,
            store_error = %e,
            "could not record processing failure"
        ),
    }
}
