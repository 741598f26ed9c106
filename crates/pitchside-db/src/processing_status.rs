//! Database operations for `fixture_processing_status`.
//!
//! One row per fixture, enforced by the `UNIQUE (fixture_id)` constraint.
//! A fixture with no row is [`ProcessingState::Unprocessed`].

use chrono::{DateTime, Utc};
use pitchside_core::ProcessingState;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `fixture_processing_status` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessingStatusRow {
    pub id: Uuid,
    pub fixture_id: Uuid,
    pub processing_status: String,
    pub crew_execution_id: String,
    pub articles_generated: i32,
    pub topics_generated: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingStatusRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if the stored status is unrecognised.
    pub fn state(&self) -> Result<ProcessingState, DbError> {
        Ok(ProcessingState::from_db(Some(&self.processing_status))?)
    }
}

/// Ids of fixtures whose processing finished successfully.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_completed_fixture_ids(pool: &PgPool) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT fixture_id FROM fixture_processing_status \
         WHERE processing_status = 'completed'",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Fetches the status row for a fixture, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_processing_status(
    pool: &PgPool,
    fixture_id: Uuid,
) -> Result<Option<ProcessingStatusRow>, DbError> {
    let row = sqlx::query_as::<_, ProcessingStatusRow>(
        "SELECT id, fixture_id, processing_status, crew_execution_id, articles_generated, \
                topics_generated, error_message, created_at, updated_at \
         FROM fixture_processing_status \
         WHERE fixture_id = $1",
    )
    .bind(fixture_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Current state for a fixture; a missing row maps to
/// [`ProcessingState::Unprocessed`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::InvalidRow`]
/// if the stored status is unrecognised.
pub async fn get_processing_state(
    pool: &PgPool,
    fixture_id: Uuid,
) -> Result<ProcessingState, DbError> {
    match get_processing_status(pool, fixture_id).await? {
        Some(row) => row.state(),
        None => Ok(ProcessingState::Unprocessed),
    }
}

/// Marks a fixture `in_progress` under a new execution id and returns the
/// row id.
///
/// Inserts the row on first use; on later attempts the existing row is
/// overwritten in the same statement, counters reset and any previous
/// error cleared.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn start_processing(
    pool: &PgPool,
    fixture_id: Uuid,
    execution_id: &str,
) -> Result<Uuid, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO fixture_processing_status \
             (fixture_id, processing_status, crew_execution_id) \
         VALUES ($1, 'in_progress', $2) \
         ON CONFLICT (fixture_id) DO UPDATE \
         SET processing_status = 'in_progress', \
             crew_execution_id = EXCLUDED.crew_execution_id, \
             articles_generated = 0, \
             topics_generated = 0, \
             error_message = NULL, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(fixture_id)
    .bind(execution_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Marks a fixture `completed` with its output counts.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the fixture has no status row, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_processing(
    pool: &PgPool,
    fixture_id: Uuid,
    articles_generated: i32,
    topics_generated: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE fixture_processing_status \
         SET processing_status = 'completed', articles_generated = $1, \
             topics_generated = $2, updated_at = NOW() \
         WHERE fixture_id = $3",
    )
    .bind(articles_generated)
    .bind(topics_generated)
    .bind(fixture_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Marks a fixture `failed` and records the error.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the fixture has no status row, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_processing(
    pool: &PgPool,
    fixture_id: Uuid,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE fixture_processing_status \
         SET processing_status = 'failed', error_message = $1, updated_at = NOW() \
         WHERE fixture_id = $2",
    )
    .bind(error_message)
    .bind(fixture_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
