//! Scoreline backfill from stored article text.

use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::reconcile::reconcile_score;
use crate::traits::{FixtureStore, TextCompletion};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBackfillSummary {
    /// Fixtures with no stored score.
    pub total_found: usize,
    /// Of those, fixtures with at least one stored article.
    pub with_articles: usize,
    pub updated: usize,
}

/// Fill in missing scores by reconciling each fixture against the text of
/// its stored articles. `fixture_id` restricts the run to one fixture.
///
/// # Errors
///
/// Returns an error if the fixture list cannot be loaded. Per-fixture
/// failures are logged and skipped.
pub async fn backfill_scores(
    store: &dyn FixtureStore,
    llm: &dyn TextCompletion,
    fixture_id: Option<Uuid>,
) -> Result<ScoreBackfillSummary, PipelineError> {
    let fixtures = store.fixtures_missing_scores(fixture_id).await?;
    let mut summary = ScoreBackfillSummary {
        total_found: fixtures.len(),
        ..ScoreBackfillSummary::default()
    };
    tracing::info!(fixtures = summary.total_found, "scoreline backfill started");

    for fixture in &fixtures {
        let articles = match store.articles_for_fixture(fixture.id).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!(fixture_id = %fixture.id, error = %e, "could not load articles");
                continue;
            }
        };
        if articles.is_empty() {
            tracing::debug!(fixture_id = %fixture.id, "no articles; skipping");
            continue;
        }
        summary.with_articles += 1;

        let text = articles
            .iter()
            .map(|a| format!("{}\n\n{}", a.title, a.content))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let result = reconcile_score(store, llm, fixture, &text).await;
        if result.updated {
            summary.updated += 1;
        } else {
            tracing::info!(
                fixture_id = %fixture.id,
                fixture = %fixture.label(),
                message = %result.message,
                "no score extracted"
            );
        }
    }

    tracing::info!(
        total_found = summary.total_found,
        with_articles = summary.with_articles,
        updated = summary.updated,
        "scoreline backfill finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pitchside_core::Score;

    use super::*;
    use crate::test_support::{fixture, MemoryStore, ScriptedLlm};

    #[tokio::test]
    async fn counts_and_updates_fixtures_with_articles() {
        let scored = fixture("Leeds", "Everton", "2025-10-04", None, Some(Score::new(1, 0)));
        let with_text = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let without_text = fixture("Spurs", "Fulham", "2025-10-04", None, None);
        let store = MemoryStore::with_fixtures(vec![
            scored.clone(),
            with_text.clone(),
            without_text.clone(),
        ]);
        store.seed_article(scored.id, "Old", "Final score: 1-0");
        store.seed_article(with_text.id, "Report", "The hosts won. Final score: 3-1");
        let llm = ScriptedLlm::replying("3-1");

        let summary = backfill_scores(&store, &llm, None).await.unwrap();

        assert_eq!(
            summary,
            ScoreBackfillSummary {
                total_found: 2,
                with_articles: 1,
                updated: 1,
            }
        );
        assert_eq!(store.fixture(with_text.id).unwrap().score, Some(Score::new(3, 1)));
        assert_eq!(store.fixture(without_text.id).unwrap().score, None);
        assert_eq!(llm.prompts().len(), 1);
        assert!(llm.prompts()[0].contains("Final score: 3-1"));
    }

    #[tokio::test]
    async fn restricts_to_one_fixture() {
        let a = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let b = fixture("Spurs", "Fulham", "2025-10-04", None, None);
        let store = MemoryStore::with_fixtures(vec![a.clone(), b.clone()]);
        store.seed_article(a.id, "A", "text");
        store.seed_article(b.id, "B", "text");
        let llm = ScriptedLlm::replying("NO_SCORE_FOUND");

        let summary = backfill_scores(&store, &llm, Some(b.id)).await.unwrap();

        assert_eq!(summary.total_found, 1);
        assert_eq!(summary.with_articles, 1);
        assert_eq!(summary.updated, 0);
    }
}
