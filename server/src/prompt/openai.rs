use anyhow::{anyhow, Context};
use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{server_config::OpenAiConfig, HttpClient};

use super::completion::{ChatMessage, CompletionClient, CompletionOptions};

#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(http_client: HttpClient, config: &OpenAiConfig) -> Self {
        Self {
            http_client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.api_base),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn create_chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> anyhow::Result<String> {
        let resp = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!(
              {
                "model": options.model,
                "messages": messages,
                "max_tokens": options.max_tokens,
                "temperature": options.temperature,
              }
            ))
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = resp.status();
        let resp = resp
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Chat completion response ({}) was not JSON", status))?;

        let parsed = serde_json::from_value::<ChatApiResponseOrError>(resp.clone())
            .context(format!("Could not parse chat response: {}", resp))?;

        let parsed = match parsed {
            ChatApiResponseOrError::Error(ChatApiErrorResponse { error }) => {
                return Err(anyhow!("Chat API error ({}): {:?}", status, error));
            }
            ChatApiResponseOrError::Response(_) if !status.is_success() => {
                return Err(anyhow!("Chat API returned status {}", status));
            }
            ChatApiResponseOrError::Response(parsed) => parsed,
        };

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                "Completion usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: i32,
    pub message: ChatResponseMessage,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<PromptUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiErrorResponse {
    pub error: ChatApiError,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatApiResponseOrError {
    Response(ChatApiResponse),
    Error(ChatApiErrorResponse),
}
