use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An article produced by the workflow, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftArticle {
    pub title: String,
    pub content: String,
    pub article_type: String,
    pub word_count: u32,
}

/// Everything one workflow run produced for a fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOutput {
    pub articles: Vec<DraftArticle>,
    pub topics: Vec<String>,
    /// Raw match text from the data-collection step; input to score
    /// reconciliation.
    pub match_data: String,
}

/// A persisted article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: Uuid,
    pub fixture_id: Uuid,
    pub processing_id: Uuid,
    pub title: String,
    pub content: String,
    pub article_type: String,
    pub word_count: u32,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredArticle {
    /// Object path of the article's header image in the bucket.
    #[must_use]
    pub fn image_path(&self) -> String {
        format!("{}.jpg", self.id)
    }
}
