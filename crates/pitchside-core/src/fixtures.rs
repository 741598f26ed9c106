use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Upper bound (inclusive) on goals per side for an extracted score to be
/// accepted.
pub const MAX_REASONABLE_GOALS: u32 = 20;

/// A scheduled or played match, as stored by the ingestion process.
///
/// `match_date` and `match_time` are kept as the raw stored strings; they
/// are parsed by [`crate::kickoff`] so a single corrupt row can be skipped
/// instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: Uuid,
    pub competition: String,
    pub season: String,
    /// `YYYY-MM-DD`.
    pub match_date: String,
    /// `HH:MM` or `HH:MM:SS`; `None` means the default kickoff time.
    pub match_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    /// Both sides or neither.
    pub score: Option<Score>,
    pub status: String,
    pub venue: Option<String>,
    pub matchday: Option<i32>,
    pub round: Option<String>,
}

impl Fixture {
    /// `"Home vs Away"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }

    /// The stored score rendered as `"H-A"`, if any.
    #[must_use]
    pub fn score_label(&self) -> Option<String> {
        self.score.map(|s| s.to_string())
    }
}

/// A full-time score. Both sides are always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    #[must_use]
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Builds a score, rejecting either side above [`MAX_REASONABLE_GOALS`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ScoreOutOfRange`] if either side is out of range.
    pub fn bounded(home: u32, away: u32) -> Result<Self, CoreError> {
        if home > MAX_REASONABLE_GOALS || away > MAX_REASONABLE_GOALS {
            return Err(CoreError::ScoreOutOfRange { home, away });
        }
        Ok(Self { home, away })
    }

    /// Builds a score from nullable stored columns.
    ///
    /// Returns `None` unless both sides are present and non-negative; a
    /// half-populated row is treated as having no score.
    #[must_use]
    pub fn from_columns(home: Option<i32>, away: Option<i32>) -> Option<Self> {
        match (home, away) {
            (Some(h), Some(a)) => {
                let home = u32::try_from(h).ok()?;
                let away = u32::try_from(a).ok()?;
                Some(Self { home, away })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Article-generation progress for one fixture.
///
/// `Unprocessed` is never stored: it is what the accessor reports when the
/// fixture has no status row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Unprocessed,
    InProgress,
    Completed,
    Failed,
}

impl ProcessingState {
    /// Database representation; `None` for [`ProcessingState::Unprocessed`].
    #[must_use]
    pub fn as_db_str(self) -> Option<&'static str> {
        match self {
            ProcessingState::Unprocessed => None,
            ProcessingState::InProgress => Some("in_progress"),
            ProcessingState::Completed => Some("completed"),
            ProcessingState::Failed => Some("failed"),
        }
    }

    /// Maps an optional stored status to a state. A missing row is
    /// [`ProcessingState::Unprocessed`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProcessingStatus`] for unrecognised values.
    pub fn from_db(status: Option<&str>) -> Result<Self, CoreError> {
        match status {
            None => Ok(ProcessingState::Unprocessed),
            Some("in_progress") => Ok(ProcessingState::InProgress),
            Some("completed") => Ok(ProcessingState::Completed),
            Some("failed") => Ok(ProcessingState::Failed),
            Some(other) => Err(CoreError::UnknownProcessingStatus(other.to_string())),
        }
    }

    /// `Completed` is the only state that blocks another processing attempt.
    #[must_use]
    pub fn allows_processing(self) -> bool {
        !matches!(self, ProcessingState::Completed)
    }
}

impl std::fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str().unwrap_or("unprocessed"))
    }
}
