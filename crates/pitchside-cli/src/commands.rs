//! Command handlers for the CLI.
//!
//! Called from `main` once config is loaded and the pool is connected.

use chrono::Utc;
use pitchside_core::AppConfig;
use pitchside_pipeline::{FixtureStore, PgStore, Pipeline};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) fn print_config(config: &AppConfig) {
    println!("{config:#?}");
    let missing = config.missing_integrations();
    if missing.is_empty() {
        println!("all integrations configured");
    }
    for (var, purpose) in missing {
        println!("not set: {var} ({purpose})");
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Generate articles for every eligible fixture, then backfill images.
///
/// With `dry_run` the eligible fixtures are listed and nothing is written.
///
/// # Errors
///
/// Returns an error if the LLM is not configured or the fixture list cannot
/// be loaded. Per-fixture failures are recorded and counted, not returned.
pub(crate) async fn run_process(
    pool: PgPool,
    config: &AppConfig,
    dry_run: bool,
    skip_images: bool,
) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();

    if dry_run {
        let store = PgStore::new(pool, config.max_attempts, config.retry_backoff_base_ms);
        let fixtures = store.list_fixtures().await?;
        let completed = store.completed_fixture_ids().await?;
        let eligible = pitchside_core::select_eligible(fixtures, &completed, now);
        println!("dry-run: {} fixtures eligible", eligible.len());
        for fixture in &eligible {
            println!("  {} {} ({})", fixture.id, fixture.label(), fixture.match_date);
        }
        return Ok(());
    }

    let pipeline = Pipeline::from_config(pool, config)?;
    if skip_images {
        tracing::info!("image backfill skipped by --skip-images");
        let summary = pipeline.process(now).await?;
        print_json(&summary)?;
    } else {
        let summary = pipeline.run_cycle(now).await?;
        print_json(&summary)?;
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the LLM is not configured or the fixture list cannot
/// be loaded.
pub(crate) async fn run_scores(
    pool: PgPool,
    config: &AppConfig,
    fixture: Option<Uuid>,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(pool, config)?;
    let summary = pipeline.backfill_scores(fixture).await?;
    print_json(&summary)
}

/// # Errors
///
/// Returns an error if the article list cannot be loaded.
pub(crate) async fn run_images(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(pool, config)?;
    match pipeline.backfill_images().await? {
        Some(summary) => print_json(&summary)?,
        None => println!("image backfill skipped: storage or image credentials not set"),
    }
    Ok(())
}

/// Verify the database is reachable and report unconfigured integrations.
///
/// # Errors
///
/// Returns an error if the database ping fails.
pub(crate) async fn run_check(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    pitchside_db::health_check(pool).await?;
    println!("database: ok");

    let fixtures = pitchside_db::list_fixtures(pool).await?;
    let completed = pitchside_db::list_completed_fixture_ids(pool).await?;
    println!(
        "fixtures: {} total, {} processed",
        fixtures.len(),
        completed.len()
    );

    let missing = config.missing_integrations();
    if missing.is_empty() {
        println!("integrations: all configured");
    }
    for (var, purpose) in missing {
        println!("integrations: {var} not set ({purpose})");
    }
    Ok(())
}
