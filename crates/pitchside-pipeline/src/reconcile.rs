//! Score reconciliation.
//!
//! Asks the model for the final score in a block of match text and
//! compares it with the stored score. A stored score is only overwritten by
//! an in-range score that differs from it.

use pitchside_core::{
    extract_score_fallback, parse_verdict, Fixture, Score, ScoreExtraction, ScoreVerdict,
    NO_SCORE_FOUND, SCORE_CONFIRMED,
};

use crate::traits::{FixtureStore, TextCompletion};

const SYSTEM_PROMPT: &str = "You are a football data analyst. You extract the definitive final \
score of a match from reports and live updates, and you never confuse half-time or provisional \
scores with the final result.";

fn extraction_prompt(fixture: &Fixture, match_text: &str) -> String {
    let stored = fixture
        .score_label()
        .unwrap_or_else(|| "none (no score stored)".to_string());
    format!(
        "Extract the FINAL score of {home} vs {away} from the match data below.\n\n\
         MATCH DATA:\n{match_text}\n\n\
         STORED SCORE: {stored}\n\n\
         Rules:\n\
         - Only the final score counts, never half-time or provisional scores.\n\
         - Write the score as home-away, where home is {home}'s goals.\n\
         - If the stored score is none and you find a score, reply with the score.\n\
         - If the score you find equals the stored score, reply {SCORE_CONFIRMED}.\n\
         - If the score you find differs from the stored score, reply with the score.\n\
         - If you cannot find a definitive final score, reply {NO_SCORE_FOUND}.\n\n\
         Reply with exactly one of: {SCORE_CONFIRMED}, {NO_SCORE_FOUND}, or a score like 2-1.",
        home = fixture.home_team,
        away = fixture.away_team,
    )
}

/// Reconcile `fixture`'s stored score against `match_text`.
///
/// Never fails: LLM and store errors are folded into the returned
/// [`ScoreExtraction`] and logged.
pub async fn reconcile_score(
    store: &dyn FixtureStore,
    llm: &dyn TextCompletion,
    fixture: &Fixture,
    match_text: &str,
) -> ScoreExtraction {
    let prompt = extraction_prompt(fixture, match_text);
    let reply = match llm.complete(Some(SYSTEM_PROMPT), &prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(fixture_id = %fixture.id, error = %e, "score extraction request failed");
            return ScoreExtraction::not_found(format!("score extraction failed: {e}"));
        }
    };

    tracing::debug!(fixture_id = %fixture.id, reply = %reply.trim(), "score extraction reply");

    let found = match parse_verdict(&reply) {
        ScoreVerdict::Confirmed => {
            return match fixture.score {
                Some(stored) => {
                    ScoreExtraction::confirmed(stored, "score confirmed by LLM analysis")
                }
                None => {
                    tracing::warn!(
                        fixture_id = %fixture.id,
                        "model confirmed a score but none is stored"
                    );
                    ScoreExtraction::not_found("model confirmed a score but none is stored")
                }
            };
        }
        ScoreVerdict::NotFound => {
            return ScoreExtraction::not_found("no definitive final score in match data");
        }
        ScoreVerdict::Score { home, away } => match Score::bounded(home, away) {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!(fixture_id = %fixture.id, home, away, "rejecting implausible score");
                return ScoreExtraction::not_found(format!("score validation failed: {e}"));
            }
        },
        ScoreVerdict::Unparseable => match extract_score_fallback(match_text) {
            Some(score) => {
                tracing::info!(
                    fixture_id = %fixture.id,
                    score = %score,
                    "model reply unparseable; score found by pattern fallback"
                );
                score
            }
            None => {
                return ScoreExtraction::not_found(format!(
                    "could not parse model reply: {}",
                    reply.trim()
                ));
            }
        },
    };

    apply(store, fixture, found).await
}

async fn apply(store: &dyn FixtureStore, fixture: &Fixture, found: Score) -> ScoreExtraction {
    if fixture.score == Some(found) {
        return ScoreExtraction::confirmed(found, "score matches stored score");
    }

    match store.update_score(fixture.id, found).await {
        Ok(()) => {
            tracing::info!(
                fixture_id = %fixture.id,
                fixture = %fixture.label(),
                old = fixture.score_label().as_deref().unwrap_or("none"),
                new = %found,
                "fixture score updated"
            );
            ScoreExtraction::updated(
                fixture.score,
                found,
                format!(
                    "score updated from {} to {found}",
                    fixture.score_label().as_deref().unwrap_or("none")
                ),
            )
        }
        Err(e) => {
            tracing::error!(fixture_id = %fixture.id, score = %found, error = %e, "score update failed");
            ScoreExtraction {
                found: true,
                updated: false,
                old_score: fixture.score_label(),
                new_score: None,
                found_score: Some(found.to_string()),
                message: format!("found {found} but update failed: {e}"),
            }
        }
    }
}
