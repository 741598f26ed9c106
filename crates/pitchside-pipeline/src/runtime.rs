//! Wiring of the concrete clients into one runnable pipeline.

use std::sync::Arc;

use chrono::NaiveDateTime;
use pitchside_core::AppConfig;
use pitchside_llm::{LlmClient, LlmSettings};
use pitchside_media::{ImageClient, ImageSettings, StorageClient, StorageSettings};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::images::{ImageBackfill, ImageBackfillSummary};
use crate::processor::{Processor, ProcessorSettings, RunSummary};
use crate::scores::{backfill_scores, ScoreBackfillSummary};
use crate::store::PgStore;
use crate::traits::{FixtureStore, TextCompletion};
use crate::workflow::PromptChainWorkflow;

/// Result of one scheduled cycle: article processing, then image backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub processing: RunSummary,
    /// `None` when image backfill is not configured or failed.
    pub images: Option<ImageBackfillSummary>,
}

pub struct Pipeline {
    store: Arc<dyn FixtureStore>,
    llm: Option<Arc<dyn TextCompletion>>,
    images: Option<ImageBackfill>,
    settings: ProcessorSettings,
    max_articles: usize,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn FixtureStore>,
        llm: Option<Arc<dyn TextCompletion>>,
        images: Option<ImageBackfill>,
        settings: ProcessorSettings,
        max_articles: usize,
    ) -> Self {
        Self {
            store,
            llm,
            images,
            settings,
            max_articles,
        }
    }

    /// Build the pipeline against Postgres and whichever external services
    /// `config` has credentials for.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(pool: PgPool, config: &AppConfig) -> Result<Self, PipelineError> {
        let store: Arc<dyn FixtureStore> = Arc::new(PgStore::new(
            pool,
            config.max_attempts,
            config.retry_backoff_base_ms,
        ));

        let llm = match LlmSettings::from_app_config(config) {
            Some(settings) => {
                let client: Arc<dyn TextCompletion> = Arc::new(LlmClient::new(settings)?);
                Some(client)
            }
            None => None,
        };

        let images = match (
            StorageSettings::from_app_config(config),
            ImageSettings::from_app_config(config),
        ) {
            (Some(storage), Some(image)) => Some(ImageBackfill::new(
                Arc::clone(&store),
                Arc::new(ImageClient::new(image)?),
                Arc::new(StorageClient::new(storage)?),
            )),
            _ => None,
        };

        Ok(Self::new(
            store,
            llm,
            images,
            ProcessorSettings::from_app_config(config),
            config.max_articles_per_fixture,
        ))
    }

    fn llm(&self) -> Result<&Arc<dyn TextCompletion>, PipelineError> {
        self.llm
            .as_ref()
            .ok_or(PipelineError::NotConfigured("OPENAI_API_KEY"))
    }

    /// A batch processor using the prompt-chain workflow.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotConfigured`] without an LLM key.
    pub fn processor(&self) -> Result<Processor, PipelineError> {
        let llm = self.llm()?;
        let workflow = PromptChainWorkflow::new(Arc::clone(llm), self.max_articles);
        Ok(Processor::new(
            Arc::clone(&self.store),
            Arc::clone(llm),
            Arc::new(workflow),
            self.settings.clone(),
        ))
    }

    /// # Errors
    ///
    /// See [`Processor::run_once`].
    pub async fn process(&self, now: NaiveDateTime) -> Result<RunSummary, PipelineError> {
        self.processor()?.run_once(now).await
    }

    /// Runs the image backfill, or returns `Ok(None)` when storage or image
    /// credentials are missing.
    ///
    /// # Errors
    ///
    /// See [`ImageBackfill::run`].
    pub async fn backfill_images(&self) -> Result<Option<ImageBackfillSummary>, PipelineError> {
        let Some(images) = &self.images else {
            tracing::info!("image storage or generation not configured; skipping image backfill");
            return Ok(None);
        };
        images.run().await.map(Some)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotConfigured`] without an LLM key, or the
    /// error from [`backfill_scores`].
    pub async fn backfill_scores(
        &self,
        fixture_id: Option<Uuid>,
    ) -> Result<ScoreBackfillSummary, PipelineError> {
        let llm = self.llm()?;
        backfill_scores(self.store.as_ref(), llm.as_ref(), fixture_id).await
    }

    /// Process articles, then backfill images. An image backfill failure is
    /// logged and does not fail the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the processing run cannot start.
    pub async fn run_cycle(&self, now: NaiveDateTime) -> Result<CycleSummary, PipelineError> {
        let processing = self.process(now).await?;
        let images = match self.backfill_images().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "image backfill failed");
                None
            }
        };
        Ok(CycleSummary { processing, images })
    }
}
