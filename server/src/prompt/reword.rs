use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::completion::{ChatMessage, CompletionClient, CompletionOptions};

const SYSTEM_PROMPT: &str = indoc! {"
    You are a professional email writing assistant. Reword the given text according to the user's instructions. \
    Maintain the original meaning while adjusting the tone and style as requested."};

pub fn reword_user_prompt(text: &str, instructions: &str) -> String {
    formatdoc! {r#"
        Please reword the following text according to these instructions: "{instructions}"

        Original text:
        {text}

        Please provide only the reworded text without any additional commentary or formatting."#,
    instructions = instructions,
    text = text}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewordResult {
    pub reworded_text: String,
}

/// Rewords `text` with the client's default model settings. An empty
/// completion falls back to the original text.
pub async fn reword_text(
    client: &dyn CompletionClient,
    text: &str,
    instructions: &str,
) -> AppResult<RewordResult> {
    let completion = client
        .create_chat_completion(
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(reword_user_prompt(text, instructions)),
            ],
            CompletionOptions::default(),
        )
        .await
        .map_err(AppError::RewordFailed)?;

    let reworded = completion.trim();
    let reworded_text = if reworded.is_empty() {
        text.to_string()
    } else {
        reworded.to_string()
    };

    Ok(RewordResult { reworded_text })
}
