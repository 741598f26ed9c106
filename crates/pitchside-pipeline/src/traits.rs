//! Seams between the pipeline and its collaborators.

use std::collections::HashSet;

use async_trait::async_trait;
use pitchside_core::{Fixture, ProcessingState, Score};
use pitchside_media::GeneratedImage;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{DraftArticle, StoredArticle, WorkflowOutput};

/// Fixture, processing-status and article persistence.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    async fn list_fixtures(&self) -> Result<Vec<Fixture>, PipelineError>;

    /// Ids of fixtures whose processing status is `completed`.
    async fn completed_fixture_ids(&self) -> Result<HashSet<Uuid>, PipelineError>;

    async fn processing_state(&self, fixture_id: Uuid) -> Result<ProcessingState, PipelineError>;

    /// Upserts the status row to `in_progress` and returns its id.
    async fn start_processing(
        &self,
        fixture_id: Uuid,
        execution_id: &str,
    ) -> Result<Uuid, PipelineError>;

    async fn complete_processing(
        &self,
        fixture_id: Uuid,
        articles_generated: u32,
        topics_generated: u32,
    ) -> Result<(), PipelineError>;

    async fn fail_processing(&self, fixture_id: Uuid, message: &str) -> Result<(), PipelineError>;

    /// Writes both score columns together.
    async fn update_score(&self, fixture_id: Uuid, score: Score) -> Result<(), PipelineError>;

    async fn fixtures_missing_scores(
        &self,
        fixture_id: Option<Uuid>,
    ) -> Result<Vec<Fixture>, PipelineError>;

    /// Replaces the fixture's articles with `drafts`, stored under
    /// `processing_id`. All or nothing: on error the previous articles stay.
    async fn replace_articles(
        &self,
        fixture_id: Uuid,
        processing_id: Uuid,
        drafts: &[DraftArticle],
    ) -> Result<Vec<StoredArticle>, PipelineError>;

    async fn set_article_file_path(
        &self,
        article_id: Uuid,
        path: &str,
    ) -> Result<(), PipelineError>;

    async fn list_articles(&self) -> Result<Vec<StoredArticle>, PipelineError>;

    async fn articles_for_fixture(
        &self,
        fixture_id: Uuid,
    ) -> Result<Vec<StoredArticle>, PipelineError>;
}

/// A single-turn text completion.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, PipelineError>;
}

/// Produces articles for one fixture.
#[async_trait]
pub trait ArticleWorkflow: Send + Sync {
    async fn generate(
        &self,
        fixture: &Fixture,
        target_length: &str,
    ) -> Result<WorkflowOutput, PipelineError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// `Ok(None)` when the generator produced no image.
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, PipelineError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, PipelineError>;

    /// Returns the public URL of the uploaded object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PipelineError>;
}
