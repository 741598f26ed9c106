//! Database operations for `fixtures`.
//!
//! Rows are inserted by the ingestion job. This service reads them and
//! writes only the score pair.

use chrono::{DateTime, Utc};
use pitchside_core::{Fixture, Score};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const FIXTURE_COLUMNS: &str = "id, competition, season, match_date, match_time, home_team, \
     away_team, home_score, away_score, status, venue, matchday, round, created_at, updated_at";

/// A row from the `fixtures` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FixtureRow {
    pub id: Uuid,
    pub competition: String,
    pub season: String,
    /// Raw stored text; parsed by the completion classifier.
    pub match_date: String,
    pub match_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: String,
    pub venue: Option<String>,
    pub matchday: Option<i32>,
    pub round: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FixtureRow {
    #[must_use]
    pub fn into_fixture(self) -> Fixture {
        Fixture {
            id: self.id,
            competition: self.competition,
            season: self.season,
            match_date: self.match_date,
            match_time: self.match_time,
            home_team: self.home_team,
            away_team: self.away_team,
            score: Score::from_columns(self.home_score, self.away_score),
            status: self.status,
            venue: self.venue,
            matchday: self.matchday,
            round: self.round,
        }
    }
}

/// Returns every fixture ordered by kickoff date and time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_fixtures(pool: &PgPool) -> Result<Vec<FixtureRow>, DbError> {
    let rows = sqlx::query_as::<_, FixtureRow>(&format!(
        "SELECT {FIXTURE_COLUMNS} FROM fixtures ORDER BY match_date, match_time NULLS FIRST, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single fixture by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_fixture(pool: &PgPool, id: Uuid) -> Result<FixtureRow, DbError> {
    sqlx::query_as::<_, FixtureRow>(&format!(
        "SELECT {FIXTURE_COLUMNS} FROM fixtures WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Writes both score columns in one statement and bumps `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the fixture does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_fixture_score(pool: &PgPool, id: Uuid, score: Score) -> Result<(), DbError> {
    let home = i32::try_from(score.home).unwrap_or(i32::MAX);
    let away = i32::try_from(score.away).unwrap_or(i32::MAX);

    let result = sqlx::query(
        "UPDATE fixtures \
         SET home_score = $1, away_score = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(home)
    .bind(away)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fixtures with no stored score, optionally narrowed to a single id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_fixtures_missing_scores(
    pool: &PgPool,
    fixture_id: Option<Uuid>,
) -> Result<Vec<FixtureRow>, DbError> {
    let rows = sqlx::query_as::<_, FixtureRow>(&format!(
        "SELECT {FIXTURE_COLUMNS} FROM fixtures \
         WHERE home_score IS NULL AND away_score IS NULL \
           AND ($1::uuid IS NULL OR id = $1) \
         ORDER BY match_date, id"
    ))
    .bind(fixture_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
