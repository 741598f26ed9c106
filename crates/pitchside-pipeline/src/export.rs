//! Markdown export of generated articles.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pitchside_core::Fixture;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::StoredArticle;

const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    fixture_id: Uuid,
    processing_id: Uuid,
    article_type: &'a str,
    word_count: u32,
    fixture_match: String,
    match_date: &'a str,
    generated_at: String,
}

/// Filesystem-safe form of an article title.
///
/// Keeps alphanumerics, spaces, `-` and `_`, turns spaces into `_`, and
/// truncates to 100 characters. An empty result becomes `"article"`.
#[must_use]
pub fn safe_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe: String = kept
        .trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    if safe.is_empty() {
        "article".to_string()
    } else {
        safe
    }
}

/// File name for an article generated at `now`.
#[must_use]
pub fn file_name(title: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.md", now.format("%Y%m%d_%H%M%S"), safe_title(title))
}

/// Render the article as markdown with YAML front matter.
///
/// # Errors
///
/// Returns [`PipelineError::FrontMatter`] if serialization fails.
pub fn render(
    article: &StoredArticle,
    fixture: &Fixture,
    now: DateTime<Utc>,
) -> Result<String, PipelineError> {
    let front = FrontMatter {
        title: &article.title,
        fixture_id: article.fixture_id,
        processing_id: article.processing_id,
        article_type: &article.article_type,
        word_count: article.word_count,
        fixture_match: fixture.label(),
        match_date: &fixture.match_date,
        generated_at: now.to_rfc3339(),
    };
    let yaml = serde_yaml::to_string(&front)?;
    Ok(format!(
        "---\n{yaml}---\n\n# {}\n\n{}\n",
        article.title, article.content
    ))
}

/// Write the article into `dir`, creating it if needed, and return the
/// path written.
///
/// # Errors
///
/// Returns [`PipelineError::Export`] on I/O failure and
/// [`PipelineError::FrontMatter`] if the front matter cannot be rendered.
pub fn export_markdown(
    dir: &Path,
    article: &StoredArticle,
    fixture: &Fixture,
    now: DateTime<Utc>,
) -> Result<PathBuf, PipelineError> {
    std::fs::create_dir_all(dir).map_err(|source| PipelineError::Export {
        path: dir.display().to_string(),
        source,
    })?;
    let path = dir.join(file_name(&article.title, now));
    let body = render(article, fixture, now)?;
    std::fs::write(&path, body).map_err(|source| PipelineError::Export {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(article_id = %article.id, path = %path.display(), "article exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::test_support::fixture;

    fn article(title: &str) -> StoredArticle {
        StoredArticle {
            id: Uuid::new_v4(),
            fixture_id: Uuid::new_v4(),
            processing_id: Uuid::new_v4(),
            title: title.to_string(),
            content: "Arsenal edged Chelsea.".to_string(),
            article_type: "match_report".to_string(),
            word_count: 3,
            file_path: None,
            created_at: Utc::now(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 4, 20, 15, 9).unwrap()
    }

    #[test]
    fn safe_title_strips_punctuation() {
        assert_eq!(
            safe_title("Saka's Double: Arsenal 2-1 Chelsea!"),
            "Sakas_Double_Arsenal_2-1_Chelsea"
        );
    }

    #[test]
    fn safe_title_truncates() {
        let long = "a".repeat(250);
        assert_eq!(safe_title(&long).len(), 100);
    }

    #[test]
    fn safe_title_of_only_symbols_falls_back() {
        assert_eq!(safe_title("?!"), "article");
    }

    #[test]
    fn file_name_has_timestamp_prefix() {
        assert_eq!(
            file_name("Late Drama", at()),
            "20251004_201509_Late_Drama.md"
        );
    }

    #[test]
    fn writes_front_matter_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("articles");
        let f = fixture("Arsenal", "Chelsea", "2025-10-04", None, None);
        let a = article("Late Drama");

        let path = export_markdown(&target, &a, &f, at()).unwrap();

        assert_eq!(path, target.join("20251004_201509_Late_Drama.md"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.contains("title: Late Drama"));
        assert!(text.contains(&a.fixture_id.to_string()));
        assert!(text.contains("fixture_match: Arsenal vs Chelsea"));
        assert!(text.contains("word_count: 3"));
        assert!(text.contains("# Late Drama\n\nArsenal edged Chelsea.\n"));
    }
}
