use pitchside_core::CoreError;
use pitchside_db::DbError;
use pitchside_llm::LlmError;
use pitchside_media::MediaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("workflow error: {0}")]
    Workflow(String),

    #[error("export error for {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("front matter serialization failed: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Store failure caused by a missing row.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Store(DbError::NotFound))
    }
}
