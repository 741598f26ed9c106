//! Batch processing of completed fixtures.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use pitchside_core::{select_eligible, AppConfig, Fixture, ProcessingState};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::export::export_markdown;
use crate::model::WorkflowOutput;
use crate::reconcile::reconcile_score;
use crate::state;
use crate::traits::{ArticleWorkflow, FixtureStore, TextCompletion};

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Passed to the workflow as the target article length.
    pub article_length: String,
    /// `None` disables markdown export.
    pub articles_dir: Option<PathBuf>,
    pub inter_fixture_delay: Duration,
}

impl ProcessorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            article_length: config.article_length.clone(),
            articles_dir: config.articles_dir.clone(),
            inter_fixture_delay: Duration::from_millis(config.inter_fixture_delay_ms),
        }
    }
}

/// What happened to one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureOutcome {
    Completed { articles_created: usize },
    /// Already `completed` when re-checked just before starting.
    Skipped,
    Failed { error: String },
}

/// Totals for one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub eligible: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub articles_created: usize,
}

pub struct Processor {
    store: Arc<dyn FixtureStore>,
    llm: Arc<dyn TextCompletion>,
    workflow: Arc<dyn ArticleWorkflow>,
    settings: ProcessorSettings,
}

impl Processor {
    #[must_use]
    pub fn new(
        store: Arc<dyn FixtureStore>,
        llm: Arc<dyn TextCompletion>,
        workflow: Arc<dyn ArticleWorkflow>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            store,
            llm,
            workflow,
            settings,
        }
    }

    /// Process every fixture that is completed at `now` and not yet
    /// processed, one at a time.
    ///
    /// Per-fixture failures are recorded on the fixture and counted; they do
    /// not abort the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the fixture list or the set of completed ids
    /// cannot be loaded.
    pub async fn run_once(&self, now: NaiveDateTime) -> Result<RunSummary, PipelineError> {
        let fixtures = self.store.list_fixtures().await?;
        let completed = self.store.completed_fixture_ids().await?;
        let total = fixtures.len();
        let eligible = select_eligible(fixtures, &completed, now);

        let mut summary = RunSummary {
            eligible: eligible.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            total,
            already_processed = completed.len(),
            eligible = summary.eligible,
            "processing run started"
        );

        for (index, fixture) in eligible.iter().enumerate() {
            if index > 0 && !self.settings.inter_fixture_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_fixture_delay).await;
            }
            match self.process_fixture(fixture).await {
                FixtureOutcome::Completed { articles_created } => {
                    summary.processed += 1;
                    summary.articles_created += articles_created;
                }
                FixtureOutcome::Skipped => summary.skipped += 1,
                FixtureOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        tracing::info!(
            eligible = summary.eligible,
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            articles_created = summary.articles_created,
            "processing run finished"
        );
        Ok(summary)
    }

    /// Run one fixture through start, workflow, reconciliation, persistence
    /// and completion. Any error after `start` marks the fixture `failed`.
    pub async fn process_fixture(&self, fixture: &Fixture) -> FixtureOutcome {
        match self.store.processing_state(fixture.id).await {
            Ok(ProcessingState::Completed) => {
                tracing::info!(fixture_id = %fixture.id, "fixture already completed; skipping");
                return FixtureOutcome::Skipped;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(fixture_id = %fixture.id, error = %e, "could not read processing state");
                return FixtureOutcome::Failed {
                    error: e.to_string(),
                };
            }
        }

        let processing_id = match state::start(self.store.as_ref(), fixture.id).await {
            Ok((processing_id, _)) => processing_id,
            Err(e) => {
                let error = e.to_string();
                state::fail(self.store.as_ref(), fixture.id, &error).await;
                return FixtureOutcome::Failed { error };
            }
        };

        tracing::info!(
            fixture_id = %fixture.id,
            fixture = %fixture.label(),
            match_date = %fixture.match_date,
            "processing fixture"
        );

        let result = async {
            let output = self
                .workflow
                .generate(fixture, &self.settings.article_length)
                .await?;
            self.reconcile(fixture, &output).await;
            let created = self.persist(fixture, processing_id, &output).await?;
            state::complete(
                self.store.as_ref(),
                fixture.id,
                count(created),
                count(output.topics.len()),
            )
            .await?;
            Ok::<_, PipelineError>(created)
        }
        .await;

        match result {
            Ok(articles_created) => FixtureOutcome::Completed { articles_created },
            Err(e) => {
                let error = e.to_string();
                state::fail(self.store.as_ref(), fixture.id, &error).await;
                FixtureOutcome::Failed { error }
            }
        }
    }

    async fn reconcile(&self, fixture: &Fixture, output: &WorkflowOutput) {
        if output.match_data.trim().is_empty() {
            tracing::debug!(fixture_id = %fixture.id, "no match data to reconcile");
            return;
        }
        let result =
            reconcile_score(self.store.as_ref(), self.llm.as_ref(), fixture, &output.match_data)
                .await;
        if result.updated {
            tracing::info!(
                fixture_id = %fixture.id,
                old = result.old_score.as_deref().unwrap_or("none"),
                new = result.found_score.as_deref().unwrap_or("none"),
                "score updated during processing"
            );
        } else {
            tracing::debug!(fixture_id = %fixture.id, found = result.found, message = %result.message, "score reconciliation finished");
        }
    }

    async fn persist(
        &self,
        fixture: &Fixture,
        processing_id: Uuid,
        output: &WorkflowOutput,
    ) -> Result<usize, PipelineError> {
        let stored = self
            .store
            .replace_articles(fixture.id, processing_id, &output.articles)
            .await?;

        let Some(dir) = &self.settings.articles_dir else {
            return Ok(stored.len());
        };
        for article in &stored {
            match export_markdown(dir, article, fixture, Utc::now()) {
                Ok(path) => {
                    let path = path.display().to_string();
                    if let Err(e) = self.store.set_article_file_path(article.id, &path).await {
                        tracing::warn!(article_id = %article.id, error = %e, "could not record article file path");
                    }
                }
                Err(e) => {
                    tracing::warn!(article_id = %article.id, error = %e, "markdown export failed");
                }
            }
        }
        Ok(stored.len())
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
