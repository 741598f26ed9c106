//! In-memory fakes for the seam traits.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pitchside_core::{Fixture, ProcessingState, Score};
use pitchside_db::DbError;
use pitchside_llm::LlmError;
use pitchside_media::GeneratedImage;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::{DraftArticle, StoredArticle, WorkflowOutput};
use crate::traits::{ArticleWorkflow, FixtureStore, ImageGenerator, ImageStore, TextCompletion};

pub(crate) fn fixture(
    home: &str,
    away: &str,
    date: &str,
    time: Option<&str>,
    score: Option<Score>,
) -> Fixture {
    Fixture {
        id: Uuid::new_v4(),
        competition: "Premier League".to_string(),
        season: "2025".to_string(),
        match_date: date.to_string(),
        match_time: time.map(str::to_string),
        home_team: home.to_string(),
        away_team: away.to_string(),
        score,
        status: "FINISHED".to_string(),
        venue: None,
        matchday: Some(7),
        round: None,
    }
}

/// A transport-level LLM failure.
pub(crate) fn llm_unavailable() -> PipelineError {
    PipelineError::Llm(LlmError::Status {
        status: 503,
        body: "overloaded".to_string(),
    })
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct StatusRecord {
    pub id: Uuid,
    pub state: ProcessingState,
    pub execution_id: String,
    pub articles: u32,
    pub topics: u32,
    pub error: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    fixtures: Vec<Fixture>,
    statuses: HashMap<Uuid, StatusRecord>,
    articles: Vec<StoredArticle>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
    pub fail_score_updates: bool,
    pub fail_listing: bool,
    /// Article batches fail at this index (0-based) while the counter is
    /// non-zero; each failure decrements it.
    pub failing_article_batches: AtomicU32,
    pub fail_article_at: usize,
    /// Upcoming `complete_processing` calls that fail with a pool timeout.
    pub failing_completions: AtomicU32,
}

/// Consumes one scheduled failure, if any remain.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl MemoryStore {
    pub fn with_fixtures(fixtures: Vec<Fixture>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().fixtures = fixtures;
        store
    }

    pub fn fixture(&self, id: Uuid) -> Option<Fixture> {
        self.state
            .lock()
            .unwrap()
            .fixtures
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }

    pub fn status(&self, fixture_id: Uuid) -> Option<StatusRecord> {
        self.state.lock().unwrap().statuses.get(&fixture_id).cloned()
    }

    pub fn status_count(&self) -> usize {
        self.state.lock().unwrap().statuses.len()
    }

    pub fn articles(&self) -> Vec<StoredArticle> {
        self.state.lock().unwrap().articles.clone()
    }

    pub fn mark_completed(&self, fixture_id: Uuid) {
        self.state.lock().unwrap().statuses.insert(
            fixture_id,
            StatusRecord {
                id: Uuid::new_v4(),
                state: ProcessingState::Completed,
                execution_id: "run_seed".to_string(),
                articles: 1,
                topics: 1,
                error: None,
            },
        );
    }

    pub fn seed_article(&self, fixture_id: Uuid, title: &str, content: &str) -> StoredArticle {
        let article = StoredArticle {
            id: Uuid::new_v4(),
            fixture_id,
            processing_id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            article_type: "match_report".to_string(),
            word_count: u32::try_from(content.split_whitespace().count()).unwrap(),
            file_path: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().articles.push(article.clone());
        article
    }
}

#[async_trait]
impl FixtureStore for MemoryStore {
    async fn list_fixtures(&self) -> Result<Vec<Fixture>, PipelineError> {
        if self.fail_listing {
            return Err(PipelineError::Store(DbError::Sqlx(sqlx::Error::PoolTimedOut)));
        }
        Ok(self.state.lock().unwrap().fixtures.clone())
    }

    async fn completed_fixture_ids(&self) -> Result<HashSet<Uuid>, PipelineError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .statuses
            .iter()
            .filter(|(_, s)| s.state == ProcessingState::Completed)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn processing_state(&self, fixture_id: Uuid) -> Result<ProcessingState, PipelineError> {
        Ok(self
            .status(fixture_id)
            .map_or(ProcessingState::Unprocessed, |s| s.state))
    }

    async fn start_processing(
        &self,
        fixture_id: Uuid,
        execution_id: &str,
    ) -> Result<Uuid, PipelineError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .statuses
            .entry(fixture_id)
            .or_insert_with(|| StatusRecord {
                id: Uuid::new_v4(),
                state: ProcessingState::InProgress,
                execution_id: String::new(),
                articles: 0,
                topics: 0,
                error: None,
            });
        record.state = ProcessingState::InProgress;
        record.execution_id = execution_id.to_string();
        record.articles = 0;
        record.topics = 0;
        record.error = None;
        Ok(record.id)
    }

    async fn complete_processing(
        &self,
        fixture_id: Uuid,
        articles_generated: u32,
        topics_generated: u32,
    ) -> Result<(), PipelineError> {
        if take_failure(&self.failing_completions) {
            return Err(PipelineError::Store(DbError::Sqlx(sqlx::Error::PoolTimedOut)));
        }
        let mut state = self.state.lock().unwrap();
        let record = state
            .statuses
            .get_mut(&fixture_id)
            .ok_or(PipelineError::Store(DbError::NotFound))?;
        record.state = ProcessingState::Completed;
        record.articles = articles_generated;
        record.topics = topics_generated;
        Ok(())
    }

    async fn fail_processing(&self, fixture_id: Uuid, message: &str) -> Result<(), PipelineError> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .statuses
            .get_mut(&fixture_id)
            .ok_or(PipelineError::Store(DbError::NotFound))?;
        record.state = ProcessingState::Failed;
        record.error = Some(message.to_string());
        Ok(())
    }

    async fn update_score(&self, fixture_id: Uuid, score: Score) -> Result<(), PipelineError> {
        if self.fail_score_updates {
            return Err(PipelineError::Store(DbError::Sqlx(sqlx::Error::PoolTimedOut)));
        }
        let mut state = self.state.lock().unwrap();
        let fixture = state
            .fixtures
            .iter_mut()
            .find(|f| f.id == fixture_id)
            .ok_or(PipelineError::Store(DbError::NotFound))?;
        fixture.score = Some(score);
        Ok(())
    }

    async fn fixtures_missing_scores(
        &self,
        fixture_id: Option<Uuid>,
    ) -> Result<Vec<Fixture>, PipelineError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .fixtures
            .iter()
            .filter(|f| f.score.is_none())
            .filter(|f| fixture_id.is_none_or(|id| f.id == id))
            .cloned()
            .collect())
    }

    async fn replace_articles(
        &self,
        fixture_id: Uuid,
        processing_id: Uuid,
        drafts: &[DraftArticle],
    ) -> Result<Vec<StoredArticle>, PipelineError> {
        let mut batch = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.iter().enumerate() {
            if index == self.fail_article_at && take_failure(&self.failing_article_batches) {
                return Err(PipelineError::Store(DbError::Sqlx(sqlx::Error::RowNotFound)));
            }
            batch.push(StoredArticle {
                id: Uuid::new_v4(),
                fixture_id,
                processing_id,
                title: draft.title.clone(),
                content: draft.content.clone(),
                article_type: draft.article_type.clone(),
                word_count: draft.word_count,
                file_path: None,
                created_at: Utc::now(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.articles.retain(|a| a.fixture_id != fixture_id);
        state.articles.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn set_article_file_path(
        &self,
        article_id: Uuid,
        path: &str,
    ) -> Result<(), PipelineError> {
        let mut state = self.state.lock().unwrap();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or(PipelineError::Store(DbError::NotFound))?;
        article.file_path = Some(path.to_string());
        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<StoredArticle>, PipelineError> {
        Ok(self.articles())
    }

    async fn articles_for_fixture(
        &self,
        fixture_id: Uuid,
    ) -> Result<Vec<StoredArticle>, PipelineError> {
        Ok(self
            .articles()
            .into_iter()
            .filter(|a| a.fixture_id == fixture_id)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

type Responder = dyn Fn(&str) -> Result<String, PipelineError> + Send + Sync;

/// Answers each prompt with `respond(prompt)` and records what it was sent.
pub(crate) struct ScriptedLlm {
    respond: Box<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(respond: impl Fn(&str) -> Result<String, PipelineError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `reply`.
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for ScriptedLlm {
    async fn complete(&self, _system: Option<&str>, prompt: &str) -> Result<String, PipelineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Returns `output` for every fixture except those listed in `failing`.
#[derive(Default)]
pub(crate) struct StubWorkflow {
    pub output: WorkflowOutput,
    pub failing: HashSet<Uuid>,
    calls: Mutex<Vec<Uuid>>,
}

impl StubWorkflow {
    pub fn new(output: WorkflowOutput) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleWorkflow for StubWorkflow {
    async fn generate(
        &self,
        fixture: &Fixture,
        _target_length: &str,
    ) -> Result<WorkflowOutput, PipelineError> {
        self.calls.lock().unwrap().push(fixture.id);
        if self.failing.contains(&fixture.id) {
            return Err(PipelineError::Workflow(format!(
                "scripted failure for {}",
                fixture.label()
            )));
        }
        Ok(self.output.clone())
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

pub(crate) const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

/// Produces a JPEG for every prompt unless the prompt contains `"NO IMAGE"`
/// (returns `None`) or `"BROKEN"` (returns an error).
#[derive(Default)]
pub(crate) struct FakeImages {
    prompts: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, PipelineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("BROKEN") {
            return Err(PipelineError::Workflow("generator exploded".to_string()));
        }
        if prompt.contains("NO IMAGE") {
            return Ok(None);
        }
        Ok(Some(GeneratedImage {
            bytes: JPEG.to_vec(),
            mime_type: "image/jpeg".to_string(),
        }))
    }
}

#[derive(Default)]
pub(crate) struct MemoryBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBucket {
    pub fn insert(&self, path: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), JPEG.to_vec());
    }

    pub fn paths(&self) -> HashSet<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ImageStore for MemoryBucket {
    async fn exists(&self, path: &str) -> Result<bool, PipelineError> {
        Ok(self.objects.lock().unwrap().contains_key(path))
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, PipelineError> {
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(format!("https://bucket.test/{path}"))
    }
}
