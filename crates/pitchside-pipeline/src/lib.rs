//! Fixture processing pipeline.
//!
//! Everything here talks to the outside world through the seam traits in
//! [`traits`], so the state machine, score reconciliation and batch logic
//! can be exercised against in-memory fakes. [`PgStore`] and the adapters in
//! [`adapters`] bind the seams to Postgres, the chat client and the media
//! clients.

pub mod adapters;
pub mod error;
pub mod export;
pub mod images;
pub mod model;
pub mod processor;
pub mod reconcile;
pub(crate) mod retry;
pub mod runtime;
pub mod scores;
pub mod state;
pub mod store;
pub mod traits;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::PipelineError;
pub use images::{ImageBackfill, ImageBackfillSummary};
pub use model::{DraftArticle, StoredArticle, WorkflowOutput};
pub use processor::{FixtureOutcome, Processor, ProcessorSettings, RunSummary};
pub use reconcile::reconcile_score;
pub use runtime::{CycleSummary, Pipeline};
pub use scores::{backfill_scores, ScoreBackfillSummary};
pub use store::PgStore;
pub use traits::{ArticleWorkflow, FixtureStore, ImageGenerator, ImageStore, TextCompletion};
pub use workflow::PromptChainWorkflow;
