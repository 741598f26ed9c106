//! Prompt-chain article workflow.
//!
//! One match-data prompt, one topic prompt, then plan, write and edit
//! prompts for each topic. Only the match-data step is fatal.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use pitchside_core::Fixture;
use regex::Regex;

use crate::error::PipelineError;
use crate::model::{DraftArticle, WorkflowOutput};
use crate::traits::{ArticleWorkflow, TextCompletion};

const ARTICLE_TYPE: &str = "match_report";

const ANALYST: &str = "You are a meticulous football data analyst covering European football.";
const STRATEGIST: &str = "You are a football content strategist who finds the stories fans want to read.";
const PLANNER: &str = "You are a football content planner. You produce research-backed article outlines.";
const WRITER: &str = "You are an experienced football journalist writing engaging, accurate match coverage.";
const EDITOR: &str = "You are a football desk editor. You return only the polished article text.";

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid JSON array regex"));

/// [`ArticleWorkflow`] driven by a sequence of single-turn completions.
pub struct PromptChainWorkflow {
    llm: Arc<dyn TextCompletion>,
    max_articles: usize,
}

impl PromptChainWorkflow {
    #[must_use]
    pub fn new(llm: Arc<dyn TextCompletion>, max_articles: usize) -> Self {
        Self {
            llm,
            max_articles: max_articles.max(1),
        }
    }
}

fn score_or_vs(fixture: &Fixture) -> String {
    fixture.score_label().unwrap_or_else(|| "vs".to_string())
}

fn match_data_prompt(fixture: &Fixture) -> String {
    let mut details = format!(
        "Competition: {}\nSeason: {}\nDate: {}",
        fixture.competition, fixture.season, fixture.match_date
    );
    if let Some(time) = &fixture.match_time {
        details.push_str(&format!("\nKickoff: {time}"));
    }
    if let Some(venue) = &fixture.venue {
        details.push_str(&format!("\nVenue: {venue}"));
    }
    if let Some(matchday) = fixture.matchday {
        details.push_str(&format!("\nMatchday: {matchday}"));
    }
    if let Some(score) = fixture.score_label() {
        details.push_str(&format!("\nRecorded score: {score}"));
    }
    format!(
        "Compile a factual match report for {label}.\n\n{details}\n\n\
         Cover the final score, goalscorers with minutes, key incidents and VAR decisions, \
         standout individual performances, tactical observations, manager and player quotes, \
         and notable statistics. State the final score explicitly as \"Final score: X-Y\".",
        label = fixture.label(),
    )
}

fn topic_prompt(fixture: &Fixture, match_data: &str, target_length: &str) -> String {
    format!(
        "Based on the match data below for {label}, propose three article topics grounded in \
         what actually happened: the significance of the result, outstanding performances, \
         tactical turning points, controversial moments, and the impact on the table. Each \
         topic must suit a {target_length} article.\n\n\
         MATCH DATA:\n{match_data}\n\n\
         Reply with a JSON array of topic titles only.",
        label = fixture.label(),
    )
}

fn plan_prompt(topic: &str, match_data: &str, target_length: &str) -> String {
    format!(
        "Create an outline for a football article titled \"{topic}\".\n\
         Article type: {ARTICLE_TYPE}\nTarget length: {target_length}\n\n\
         Base the outline on this match information:\n{match_data}\n\n\
         Include the main sections, the key facts and statistics to cite, quotes worth using, \
         and the intended tone."
    )
}

fn write_prompt(topic: &str, outline: &str, match_data: &str, target_length: &str) -> String {
    format!(
        "Write the complete article \"{topic}\" following this outline exactly.\n\n\
         OUTLINE:\n{outline}\n\n\
         MATCH INFORMATION:\n{match_data}\n\n\
         Target length: {target_length}. Open with a strong headline and introduction, keep \
         every fact consistent with the match information, and end with a clear conclusion."
    )
}

fn edit_prompt(draft: &str) -> String {
    format!(
        "Edit the article below for grammar, flow, factual consistency of names and scores, \
         and readability. Preserve the author's voice. Return only the final article text, \
         with no notes or commentary.\n\n{draft}"
    )
}

/// The three fallback topics used when the model's topic list is unusable.
#[must_use]
pub fn default_topics(fixture: &Fixture) -> Vec<String> {
    vec![
        format!(
            "Match Report: {} {} {}",
            fixture.home_team,
            score_or_vs(fixture),
            fixture.away_team
        ),
        format!(
            "Player Analysis: Key Performances in {} vs {}",
            fixture.home_team, fixture.away_team
        ),
        "Tactical Breakdown: How the Match Was Won".to_string(),
    ]
}

/// Pull topic titles out of the first JSON array in `reply`.
///
/// Returns `None` if there is no array, it does not parse, or it holds no
/// non-empty strings.
#[must_use]
pub fn parse_topics(reply: &str) -> Option<Vec<String>> {
    let raw = JSON_ARRAY.find(reply)?.as_str();
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    let topics: Vec<String> = values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    (!topics.is_empty()).then_some(topics)
}

impl PromptChainWorkflow {
    async fn write_article(
        &self,
        topic: &str,
        match_data: &str,
        target_length: &str,
    ) -> Result<DraftArticle, PipelineError> {
        let outline = self
            .llm
            .complete(Some(PLANNER), &plan_prompt(topic, match_data, target_length))
            .await?;
        let draft = self
            .llm
            .complete(
                Some(WRITER),
                &write_prompt(topic, &outline, match_data, target_length),
            )
            .await?;
        let content = self.llm.complete(Some(EDITOR), &edit_prompt(&draft)).await?;
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(PipelineError::Workflow(format!(
                "editor returned an empty article for \"{topic}\""
            )));
        }

        let word_count = u32::try_from(content.split_whitespace().count()).unwrap_or(u32::MAX);
        Ok(DraftArticle {
            title: topic.to_string(),
            content,
            article_type: ARTICLE_TYPE.to_string(),
            word_count,
        })
    }
}

#[async_trait]
impl ArticleWorkflow for PromptChainWorkflow {
    async fn generate(
        &self,
        fixture: &Fixture,
        target_length: &str,
    ) -> Result<WorkflowOutput, PipelineError> {
        let match_data = self
            .llm
            .complete(Some(ANALYST), &match_data_prompt(fixture))
            .await?;
        tracing::debug!(
            fixture_id = %fixture.id,
            chars = match_data.len(),
            "match data collected"
        );

        let topics = match self
            .llm
            .complete(
                Some(STRATEGIST),
                &topic_prompt(fixture, &match_data, target_length),
            )
            .await
        {
            Ok(reply) => parse_topics(&reply).unwrap_or_else(|| {
                tracing::warn!(fixture_id = %fixture.id, "topic reply had no usable JSON array; using defaults");
                default_topics(fixture)
            }),
            Err(e) => {
                tracing::warn!(fixture_id = %fixture.id, error = %e, "topic generation failed; using defaults");
                default_topics(fixture)
            }
        };

        let mut articles = Vec::new();
        for topic in topics.iter().take(self.max_articles) {
            match self.write_article(topic, &match_data, target_length).await {
                Ok(article) => {
                    tracing::info!(
                        fixture_id = %fixture.id,
                        title = %article.title,
                        word_count = article.word_count,
                        "article generated"
                    );
                    articles.push(article);
                }
                Err(e) => {
                    tracing::warn!(fixture_id = %fixture.id, topic = %topic, error = %e, "article generation failed; skipping topic");
                }
            }
        }

        Ok(WorkflowOutput {
            articles,
            topics,
            match_data,
        })
    }
}
