use anyhow::{anyhow, Context};
use indoc::{formatdoc, indoc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    prompt::{ChatMessage, CompletionOptions, SharedCompletionClient},
    state::TtlCache,
    util::short_id,
};

use super::chunker::{chunk_email_content, MAX_CONTENT_LENGTH};

const ANALYSIS_MODEL: &str = "gpt-4";
const ANALYSIS_TEMPERATURE: f64 = 0.3;
const DEFAULT_CATEGORY: &str = "Standard";

const SYSTEM_PROMPT: &str = indoc! {"
    You are an AI assistant providing email analysis.
    Focus on providing a simple, clear summary of the email content.
    IMPORTANT:
    - Format your response exactly as shown in the prompt
    - Keep the summary concise (20-30 words)
    - Focus on the main purpose or key message of the email"};

fn analysis_user_prompt(content: &str) -> String {
    formatdoc! {"
        Analyze this email and provide a simple summary:

        **Summary**
        Write a single sentence (20-30 words) describing the main purpose or key message of this email.

        Email content:
        {content}",
    content = content}
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub action_items: Vec<String>,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub category: String,
    pub raw_analysis: String,
}

impl AnalysisResult {
    fn with_defaults(summary: String, raw_analysis: String) -> Self {
        Self {
            summary,
            action_items: Vec::new(),
            priority: Priority::default(),
            sentiment: Sentiment::default(),
            category: DEFAULT_CATEGORY.to_string(),
            raw_analysis,
        }
    }
}

pub type AnalysisCache = TtlCache<AnalysisResult>;

static RE_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Summary\*\*\s*\n(.*?)(?:\n\*\*|$)").unwrap());

/// Extracts the summary from a model response.
///
/// The text under a `**Summary**` heading wins; failing that, the line
/// following the first line that mentions "Summary" is used.
pub fn parse_analysis_response(response: &str) -> AnalysisResult {
    let mut summary = RE_SUMMARY
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    if summary.is_empty() && response.contains("Summary") {
        let lines: Vec<&str> = response.split('\n').collect();
        if let Some(next) = lines
            .iter()
            .position(|line| line.contains("Summary"))
            .and_then(|pos| lines.get(pos + 1))
        {
            summary = next.trim().to_string();
        }
    }

    AnalysisResult::with_defaults(summary, response.to_string())
}

/// Keeps the first chunk's summary and raw response; later chunks are dropped.
pub fn merge_results(results: Vec<AnalysisResult>) -> Option<AnalysisResult> {
    results
        .into_iter()
        .next()
        .map(|first| AnalysisResult::with_defaults(first.summary, first.raw_analysis))
}

#[derive(Clone)]
pub struct EmailAnalyzer {
    completion: SharedCompletionClient,
    cache: AnalysisCache,
}

impl EmailAnalyzer {
    pub fn new(completion: SharedCompletionClient, cache: AnalysisCache) -> Self {
        Self { completion, cache }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Analyses an email, answering from the cache when `email_id` was seen
    /// within the TTL. A failure in any chunk fails the whole call and
    /// nothing is cached.
    pub async fn analyze_email_content(
        &self,
        email_content: &str,
        email_id: &str,
    ) -> AppResult<AnalysisResult> {
        if let Some(cached) = self.cache.get(email_id) {
            tracing::info!("Returning cached analysis for email: {}...", short_id(email_id));
            return Ok(cached);
        }

        let result = self
            .run_analysis(email_content)
            .await
            .map_err(AppError::AnalysisFailed)?;

        self.cache.set(email_id, result.clone());
        Ok(result)
    }

    async fn run_analysis(&self, email_content: &str) -> anyhow::Result<AnalysisResult> {
        let char_count = email_content.chars().count();
        if char_count > MAX_CONTENT_LENGTH {
            tracing::info!(
                "Long email detected ({} chars), truncating to {}",
                char_count,
                MAX_CONTENT_LENGTH
            );
        }

        let chunks = chunk_email_content(email_content);
        if chunks.is_empty() {
            return Err(anyhow!("Email content is empty"));
        }

        let mut results = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let result = self
                .analyze_chunk(chunk.text)
                .await
                .with_context(|| format!("Analysis of chunk {} failed", chunk.index))?;
            results.push(result);
        }

        let result = if results.len() > 1 {
            tracing::debug!("Merging {} chunk analyses", results.len());
            merge_results(results)
        } else {
            results.into_iter().next()
        };

        result.context("No chunk analyses produced")
    }

    async fn analyze_chunk(&self, content: &str) -> anyhow::Result<AnalysisResult> {
        let response = self
            .completion
            .create_chat_completion(
                vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(analysis_user_prompt(content)),
                ],
                CompletionOptions::default()
                    .with_model(ANALYSIS_MODEL)
                    .with_temperature(ANALYSIS_TEMPERATURE),
            )
            .await?;

        Ok(parse_analysis_response(&response))
    }
}
