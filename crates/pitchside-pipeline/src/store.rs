use std::collections::HashSet;

use async_trait::async_trait;
use pitchside_core::{Fixture, ProcessingState, Score};
use pitchside_db::{GeneratedArticleRow, NewGeneratedArticle};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{DraftArticle, StoredArticle};
use crate::retry::retry_with_backoff;
use crate::traits::FixtureStore;

/// Postgres-backed [`FixtureStore`]. Each call is retried on transient
/// connection errors.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    max_attempts: u32,
    backoff_base_ms: u64,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool, max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            pool,
            max_attempts,
            backoff_base_ms,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn into_stored(row: GeneratedArticleRow) -> StoredArticle {
    StoredArticle {
        id: row.id,
        fixture_id: row.fixture_id,
        processing_id: row.processing_id,
        title: row.title,
        content: row.content,
        article_type: row.article_type,
        word_count: u32::try_from(row.word_count).unwrap_or(0),
        file_path: row.file_path,
        created_at: row.created_at,
    }
}

#[async_trait]
impl FixtureStore for PgStore {
    async fn list_fixtures(&self) -> Result<Vec<Fixture>, PipelineError> {
        let rows = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::list_fixtures(&self.pool).await?)
        })
        .await?;
        Ok(rows.into_iter().map(pitchside_db::FixtureRow::into_fixture).collect())
    }

    async fn completed_fixture_ids(&self) -> Result<HashSet<Uuid>, PipelineError> {
        let ids = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::list_completed_fixture_ids(&self.pool).await?)
        })
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn processing_state(&self, fixture_id: Uuid) -> Result<ProcessingState, PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::get_processing_state(&self.pool, fixture_id).await?)
        })
        .await
    }

    async fn start_processing(
        &self,
        fixture_id: Uuid,
        execution_id: &str,
    ) -> Result<Uuid, PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::start_processing(&self.pool, fixture_id, execution_id).await?)
        })
        .await
    }

    async fn complete_processing(
        &self,
        fixture_id: Uuid,
        articles_generated: u32,
        topics_generated: u32,
    ) -> Result<(), PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::complete_processing(
                &self.pool,
                fixture_id,
                to_i32(articles_generated),
                to_i32(topics_generated),
            )
            .await?)
        })
        .await
    }

    async fn fail_processing(&self, fixture_id: Uuid, message: &str) -> Result<(), PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::fail_processing(&self.pool, fixture_id, message).await?)
        })
        .await
    }

    async fn update_score(&self, fixture_id: Uuid, score: Score) -> Result<(), PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::update_fixture_score(&self.pool, fixture_id, score).await?)
        })
        .await
    }

    async fn fixtures_missing_scores(
        &self,
        fixture_id: Option<Uuid>,
    ) -> Result<Vec<Fixture>, PipelineError> {
        let rows = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::list_fixtures_missing_scores(&self.pool, fixture_id).await?)
        })
        .await?;
        Ok(rows.into_iter().map(pitchside_db::FixtureRow::into_fixture).collect())
    }

    async fn replace_articles(
        &self,
        fixture_id: Uuid,
        processing_id: Uuid,
        drafts: &[DraftArticle],
    ) -> Result<Vec<StoredArticle>, PipelineError> {
        let batch: Vec<NewGeneratedArticle<'_>> = drafts
            .iter()
            .map(|d| NewGeneratedArticle {
                title: &d.title,
                content: &d.content,
                article_type: &d.article_type,
                word_count: to_i32(d.word_count),
            })
            .collect();
        // Idempotent: a retry after an ambiguous commit leaves one copy.
        let rows = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(
                pitchside_db::replace_fixture_articles(&self.pool, fixture_id, processing_id, &batch)
                    .await?,
            )
        })
        .await?;
        Ok(rows.into_iter().map(into_stored).collect())
    }

    async fn set_article_file_path(
        &self,
        article_id: Uuid,
        path: &str,
    ) -> Result<(), PipelineError> {
        retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::set_article_file_path(&self.pool, article_id, path).await?)
        })
        .await
    }

    async fn list_articles(&self) -> Result<Vec<StoredArticle>, PipelineError> {
        let rows = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::list_articles(&self.pool).await?)
        })
        .await?;
        Ok(rows.into_iter().map(into_stored).collect())
    }

    async fn articles_for_fixture(
        &self,
        fixture_id: Uuid,
    ) -> Result<Vec<StoredArticle>, PipelineError> {
        let rows = retry_with_backoff(self.max_attempts, self.backoff_base_ms, || async {
            Ok(pitchside_db::list_articles_for_fixture(&self.pool, fixture_id).await?)
        })
        .await?;
        Ok(rows.into_iter().map(into_stored).collect())
    }
}
