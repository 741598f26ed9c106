//! Database operations for `generated_articles`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `generated_articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeneratedArticleRow {
    pub id: Uuid,
    pub fixture_id: Uuid,
    pub processing_id: Uuid,
    pub title: String,
    pub content: String,
    pub article_type: String,
    pub word_count: i32,
    /// Set once the markdown export succeeds.
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One article to write with [`replace_fixture_articles`].
#[derive(Debug, Clone, Copy)]
pub struct NewGeneratedArticle<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub article_type: &'a str,
    pub word_count: i32,
}

/// Replace every article stored for a fixture with `articles`.
///
/// Deletes the fixture's existing articles, then inserts the new set under
/// `processing_id`. Uses a transaction, so either the whole set is stored or
/// the previous rows are left untouched. Running it twice with the same input
/// leaves one copy of each article.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written.
pub async fn replace_fixture_articles(
    pool: &PgPool,
    fixture_id: Uuid,
    processing_id: Uuid,
    articles: &[NewGeneratedArticle<'_>],
) -> Result<Vec<GeneratedArticleRow>, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM generated_articles WHERE fixture_id = $1")
        .bind(fixture_id)
        .execute(&mut *tx)
        .await?;

    let mut rows = Vec::with_capacity(articles.len());
    for article in articles {
        let row = sqlx::query_as::<_, GeneratedArticleRow>(
            "INSERT INTO generated_articles \
                 (fixture_id, processing_id, title, content, article_type, word_count) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, fixture_id, processing_id, title, content, article_type, \
                       word_count, file_path, created_at",
        )
        .bind(fixture_id)
        .bind(processing_id)
        .bind(article.title)
        .bind(article.content)
        .bind(article.article_type)
        .bind(article.word_count)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

/// Records where an article's markdown export was written.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_article_file_path(pool: &PgPool, id: Uuid, path: &str) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE generated_articles SET file_path = $1 WHERE id = $2")
        .bind(path)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Every stored article, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(pool: &PgPool) -> Result<Vec<GeneratedArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, GeneratedArticleRow>(
        "SELECT id, fixture_id, processing_id, title, content, article_type, \
                word_count, file_path, created_at \
         FROM generated_articles \
         ORDER BY created_at DESC, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Articles generated for one fixture, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles_for_fixture(
    pool: &PgPool,
    fixture_id: Uuid,
) -> Result<Vec<GeneratedArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, GeneratedArticleRow>(
        "SELECT id, fixture_id, processing_id, title, content, article_type, \
                word_count, file_path, created_at \
         FROM generated_articles \
         WHERE fixture_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(fixture_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
