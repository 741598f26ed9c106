//! Domain types and pure logic for the Pitchside fixture pipeline.
//!
//! Nothing in this crate performs I/O beyond reading environment variables
//! in [`load_app_config`]. The completion classifier and the score-verdict
//! parser live here so they can be tested without a database or an LLM.

pub mod app_config;
pub mod completion;
pub mod config;
pub mod fixtures;
pub mod score;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use completion::{
    is_completed, kickoff, select_eligible, COMPLETION_THRESHOLD, DEFAULT_KICKOFF_TIME,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use fixtures::{Fixture, ProcessingState, Score, MAX_REASONABLE_GOALS};
pub use score::{
    extract_score_fallback, parse_verdict, ScoreExtraction, ScoreVerdict, NO_SCORE_FOUND,
    SCORE_CONFIRMED,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid match date '{value}' for fixture {fixture_id}: {reason}")]
    InvalidMatchDate {
        fixture_id: uuid::Uuid,
        value: String,
        reason: String,
    },

    #[error("invalid match time '{value}' for fixture {fixture_id}: {reason}")]
    InvalidMatchTime {
        fixture_id: uuid::Uuid,
        value: String,
        reason: String,
    },

    #[error("score {home}-{away} is outside the accepted range 0-{max}", max = MAX_REASONABLE_GOALS)]
    ScoreOutOfRange { home: u32, away: u32 },

    #[error("unknown processing status: {0}")]
    UnknownProcessingStatus(String),
}
