//! Header-image backfill for stored articles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pitchside_core::Fixture;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::StoredArticle;
use crate::traits::{FixtureStore, ImageGenerator, ImageStore};

pub const DEFAULT_IMAGE_DELAY: Duration = Duration::from_secs(1);

const PREVIEW_CHARS: usize = 400;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageBackfillSummary {
    pub checked: usize,
    pub generated: usize,
    /// Already had an image, or the generator returned none.
    pub skipped: usize,
    pub failed: usize,
}

pub struct ImageBackfill {
    store: Arc<dyn FixtureStore>,
    generator: Arc<dyn ImageGenerator>,
    images: Arc<dyn ImageStore>,
    delay: Duration,
}

enum ImageOutcome {
    Present,
    Uploaded(String),
    NoImage,
}

fn image_prompt(article: &StoredArticle, fixture: Option<&Fixture>) -> String {
    let preview: String = article.content.chars().take(PREVIEW_CHARS).collect();
    let matchup = fixture.map_or_else(String::new, |f| {
        format!("\nMatch: {} on {}", f.label(), f.match_date)
    });
    format!(
        "Create a photorealistic editorial header image for a football article.\n\
         Title: {title}{matchup}\n\
         Article opening: {preview}\n\n\
         Show stadium atmosphere and on-pitch action in a dramatic sports-photography style. \
         Do not include any text, logos or identifiable faces.",
        title = article.title,
    )
}

impl ImageBackfill {
    #[must_use]
    pub fn new(
        store: Arc<dyn FixtureStore>,
        generator: Arc<dyn ImageGenerator>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            store,
            generator,
            images,
            delay: DEFAULT_IMAGE_DELAY,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Give every stored article without a header image one.
    ///
    /// # Errors
    ///
    /// Returns an error only if the article or fixture list cannot be
    /// loaded; per-article failures are logged and counted.
    pub async fn run(&self) -> Result<ImageBackfillSummary, PipelineError> {
        let articles = self.store.list_articles().await?;
        let fixtures: HashMap<Uuid, Fixture> = self
            .store
            .list_fixtures()
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let mut summary = ImageBackfillSummary::default();
        tracing::info!(articles = articles.len(), "image backfill started");

        for article in &articles {
            summary.checked += 1;
            match self
                .ensure_image(article, fixtures.get(&article.fixture_id))
                .await
            {
                Ok(ImageOutcome::Present) => {
                    summary.skipped += 1;
                    continue;
                }
                Ok(ImageOutcome::NoImage) => {
                    tracing::info!(article_id = %article.id, "generator returned no image; skipping");
                    summary.skipped += 1;
                }
                Ok(ImageOutcome::Uploaded(url)) => {
                    tracing::info!(article_id = %article.id, url = %url, "article image uploaded");
                    summary.generated += 1;
                }
                Err(e) => {
                    tracing::warn!(article_id = %article.id, error = %e, "article image failed");
                    summary.failed += 1;
                }
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            checked = summary.checked,
            generated = summary.generated,
            skipped = summary.skipped,
            failed = summary.failed,
            "image backfill finished"
        );
        Ok(summary)
    }

    async fn ensure_image(
        &self,
        article: &StoredArticle,
        fixture: Option<&Fixture>,
    ) -> Result<ImageOutcome, PipelineError> {
        let path = article.image_path();
        if self.images.exists(&path).await? {
            return Ok(ImageOutcome::Present);
        }
        let Some(image) = self
            .generator
            .generate(&image_prompt(article, fixture))
            .await?
        else {
            return Ok(ImageOutcome::NoImage);
        };
        let url = self
            .images
            .upload(&path, image.bytes, &image.mime_type)
            .await?;
        Ok(ImageOutcome::Uploaded(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, FakeImages, MemoryBucket, MemoryStore};

    fn backfill(
        store: Arc<MemoryStore>,
        generator: &Arc<FakeImages>,
        bucket: &Arc<MemoryBucket>,
    ) -> ImageBackfill {
        ImageBackfill::new(
            store,
            Arc::clone(generator) as Arc<dyn ImageGenerator>,
            Arc::clone(bucket) as Arc<dyn ImageStore>,
        )
        .with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn uploads_missing_and_skips_present() {
        let f = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let store = Arc::new(MemoryStore::with_fixtures(vec![f.clone()]));
        let has_image = store.seed_article(f.id, "Old", "already illustrated");
        let needs_image = store.seed_article(f.id, "New", "fresh article");
        let generator = Arc::new(FakeImages::default());
        let bucket = Arc::new(MemoryBucket::default());
        bucket.insert(&has_image.image_path());

        let summary = backfill(store, &generator, &bucket).run().await.unwrap();

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.generated, 1);
        assert_eq!(summary.skipped, 1);
        assert!(bucket.paths().contains(&needs_image.image_path()));
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Title: New"));
        assert!(prompts[0].contains("Arsenal vs Chelsea"));
    }

    #[tokio::test]
    async fn no_image_and_errors_do_not_stop_backfill() {
        let f = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let store = Arc::new(MemoryStore::with_fixtures(vec![f.clone()]));
        store.seed_article(f.id, "NO IMAGE please", "a");
        store.seed_article(f.id, "BROKEN", "b");
        let ok = store.seed_article(f.id, "Fine", "c");
        let generator = Arc::new(FakeImages::default());
        let bucket = Arc::new(MemoryBucket::default());

        let summary = backfill(store, &generator, &bucket).run().await.unwrap();

        assert_eq!(
            summary,
            ImageBackfillSummary {
                checked: 3,
                generated: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(bucket.paths().len(), 1);
        assert!(bucket.paths().contains(&ok.image_path()));
    }

    #[test]
    fn prompt_truncates_content() {
        let f = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let article = StoredArticle {
            id: Uuid::new_v4(),
            fixture_id: f.id,
            processing_id: Uuid::new_v4(),
            title: "T".to_string(),
            content: "x".repeat(1000),
            article_type: "match_report".to_string(),
            word_count: 1,
            file_path: None,
            created_at: chrono::Utc::now(),
        };
        let prompt = image_prompt(&article, Some(&f));
        assert!(prompt.contains(&"x".repeat(400)));
        assert!(!prompt.contains(&"x".repeat(401)));
    }
}
