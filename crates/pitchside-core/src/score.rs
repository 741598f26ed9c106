//! Score-verdict parsing for reconciliation.
//!
//! The extraction prompt asks the model to answer with exactly one of
//! `SCORE_CONFIRMED`, `NO_SCORE_FOUND`, or an `H-A` literal. [`parse_verdict`]
//! turns that free text into a [`ScoreVerdict`]; anything else is
//! [`ScoreVerdict::Unparseable`] and the caller falls back to
//! [`extract_score_fallback`] over the raw match text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fixtures::{Score, MAX_REASONABLE_GOALS};

pub const SCORE_CONFIRMED: &str = "SCORE_CONFIRMED";
pub const NO_SCORE_FOUND: &str = "NO_SCORE_FOUND";

/// The model's answer to a score-extraction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreVerdict {
    /// The text agrees with the stored score.
    Confirmed,
    /// No definitive final score in the text.
    NotFound,
    /// The text asserts this score. Not yet range-checked.
    Score { home: u32, away: u32 },
    /// None of the above.
    Unparseable,
}

static SCORE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*-\s*([0-9]+)$").expect("valid score literal regex"));

/// Ordered fallback patterns, matched case-insensitively against raw text.
static FALLBACK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)final score[:\s]*(\d+)-(\d+)",
        r"(?i)result[:\s]*(\d+)-(\d+)",
        r"(?i)ended[:\s]*(\d+)-(\d+)",
        r"(?i)finished[:\s]*(\d+)-(\d+)",
        r"(?i)(\d+)-(\d+)\s*\(.*?\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid fallback score regex"))
    .collect()
});

/// Parse a model reply into a [`ScoreVerdict`].
///
/// Surrounding whitespace, quotes, backticks and a trailing period are
/// ignored. The two tokens match case-insensitively. A score literal must be
/// the entire reply; a sentence that merely contains a score is
/// [`ScoreVerdict::Unparseable`].
#[must_use]
pub fn parse_verdict(raw: &str) -> ScoreVerdict {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
        .trim()
        .trim_end_matches('.')
        .trim();

    if cleaned.eq_ignore_ascii_case(SCORE_CONFIRMED) {
        return ScoreVerdict::Confirmed;
    }
    if cleaned.eq_ignore_ascii_case(NO_SCORE_FOUND) {
        return ScoreVerdict::NotFound;
    }

    let Some(caps) = SCORE_LITERAL.captures(cleaned) else {
        return ScoreVerdict::Unparseable;
    };
    ScoreVerdict::Score {
        home: saturating_goals(&caps[1]),
        away: saturating_goals(&caps[2]),
    }
}

/// ASCII digits to a goal count; values past `u32::MAX` saturate so they
/// still fail the range check.
fn saturating_goals(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}

/// Search `text` for a final score using the ordered fallback patterns.
///
/// For each pattern only the first match is considered; a match outside
/// `0..=MAX_REASONABLE_GOALS` is skipped and the next pattern tried.
#[must_use]
pub fn extract_score_fallback(text: &str) -> Option<Score> {
    FALLBACK_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let home = caps[1].parse::<u32>().ok()?;
        let away = caps[2].parse::<u32>().ok()?;
        if home > MAX_REASONABLE_GOALS || away > MAX_REASONABLE_GOALS {
            tracing::debug!(home, away, "fallback match outside score range; trying next pattern");
            return None;
        }
        Some(Score { home, away })
    })
}

/// Outcome of a reconciliation attempt. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreExtraction {
    pub found: bool,
    pub updated: bool,
    /// Stored score before an update, as `"H-A"`.
    pub old_score: Option<String>,
    pub new_score: Option<Score>,
    pub found_score: Option<String>,
    pub message: String,
}

impl ScoreExtraction {
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            found: false,
            updated: false,
            old_score: None,
            new_score: None,
            found_score: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn confirmed(score: Score, message: impl Into<String>) -> Self {
        Self {
            found: true,
            updated: false,
            old_score: None,
            new_score: None,
            found_score: Some(score.to_string()),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn updated(old: Option<Score>, new: Score, message: impl Into<String>) -> Self {
        Self {
            found: true,
            updated: true,
            old_score: old.map(|s| s.to_string()),
            new_score: Some(new),
            found_score: Some(new.to_string()),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tokens() {
        assert_eq!(parse_verdict("SCORE_CONFIRMED"), ScoreVerdict::Confirmed);
        assert_eq!(parse_verdict("NO_SCORE_FOUND"), ScoreVerdict::NotFound);
    }

    #[test]
    fn tokens_tolerate_quotes_case_and_period() {
        assert_eq!(parse_verdict("  \"score_confirmed\". "), ScoreVerdict::Confirmed);
        assert_eq!(parse_verdict("`NO_SCORE_FOUND`"), ScoreVerdict::NotFound);
    }

    #[test]
    fn parses_score_literal() {
        assert_eq!(
            parse_verdict("2-1"),
            ScoreVerdict::Score { home: 2, away: 1 }
        );
        assert_eq!(
            parse_verdict("\"0 - 3\""),
            ScoreVerdict::Score { home: 0, away: 3 }
        );
    }

    #[test]
    fn out_of_range_literal_is_still_a_score_verdict() {
        assert_eq!(
            parse_verdict("21-0"),
            ScoreVerdict::Score { home: 21, away: 0 }
        );
    }

    #[test]
    fn sentence_is_unparseable() {
        assert_eq!(
            parse_verdict("I believe the match ended 3-2 to the hosts"),
            ScoreVerdict::Unparseable
        );
        assert_eq!(parse_verdict(""), ScoreVerdict::Unparseable);
    }

    #[test]
    fn overflowing_literal_is_an_out_of_range_score() {
        assert_eq!(
            parse_verdict("99999999999-1"),
            ScoreVerdict::Score {
                home: u32::MAX,
                away: 1
            }
        );
        assert!(Score::bounded(u32::MAX, 1).is_err());
    }

    #[test]
    fn non_ascii_digits_are_unparseable() {
        assert_eq!(parse_verdict("٢-١"), ScoreVerdict::Unparseable);
    }

    #[test]
    fn fallback_finds_final_score() {
        assert_eq!(
            extract_score_fallback("Final Score: 3-2"),
            Some(Score::new(3, 2))
        );
    }

    #[test]
    fn fallback_is_case_insensitive() {
        assert_eq!(
            extract_score_fallback("THE MATCH ENDED 1-1 AFTER A LATE EQUALISER"),
            Some(Score::new(1, 1))
        );
    }

    #[test]
    fn fallback_prefers_earlier_patterns() {
        let text = "Half-time 1-0 (Saka). Final score: 2-2 after a late comeback";
        assert_eq!(extract_score_fallback(text), Some(Score::new(2, 2)));
    }

    #[test]
    fn fallback_accepts_bare_score_with_parenthetical() {
        assert_eq!(
            extract_score_fallback("0-3 (Nottingham Forest - West Ham United)"),
            Some(Score::new(0, 3))
        );
    }

    #[test]
    fn fallback_skips_out_of_range_and_tries_next_pattern() {
        let text = "final score 25-0 in the simulation; the real result: 2-0";
        assert_eq!(extract_score_fallback(text), Some(Score::new(2, 0)));
    }

    #[test]
    fn fallback_without_score_returns_none() {
        assert_eq!(extract_score_fallback("A tense, goalless affair"), None);
    }

    #[test]
    fn updated_extraction_renders_scores() {
        let e = ScoreExtraction::updated(Some(Score::new(1, 1)), Score::new(2, 1), "m");
        assert_eq!(e.old_score.as_deref(), Some("1-1"));
        assert_eq!(e.found_score.as_deref(), Some("2-1"));
        assert!(e.found && e.updated);
    }
}
