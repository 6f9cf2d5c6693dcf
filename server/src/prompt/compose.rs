use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::completion::{ChatMessage, CompletionClient, CompletionOptions};

const COMPOSE_MAX_TOKENS: u32 = 1500;

const SYSTEM_PROMPT: &str = indoc! {"
    You are a professional email writing assistant. Compose complete, well-structured emails based on the user's context. \
    Always include appropriate greetings and closings. Make emails professional, clear, and actionable."};

pub fn compose_user_prompt(context: &str) -> String {
    formatdoc! {"
        Please compose a professional email based on the following context:

        {context}

        Please write a complete, well-structured email that addresses the context provided. \
        Include appropriate greetings and closings. Make it professional, clear, and actionable.",
    context = context}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResult {
    pub composed_email: String,
}

pub async fn compose_email(client: &dyn CompletionClient, context: &str) -> AppResult<ComposeResult> {
    let completion = client
        .create_chat_completion(
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(compose_user_prompt(context)),
            ],
            CompletionOptions::default().with_max_tokens(COMPOSE_MAX_TOKENS),
        )
        .await
        .map_err(AppError::ComposeFailed)?;

    Ok(ComposeResult {
        composed_email: completion.trim().to_string(),
    })
}
