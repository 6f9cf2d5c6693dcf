use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    error::{AppError, AppJsonResult},
    prompt::{
        reword::{reword_text, RewordResult},
        SharedCompletionClient,
    },
    util::non_empty,
};

#[derive(Debug, Deserialize)]
pub struct RewordPayload {
    pub text: Option<String>,
    pub instructions: Option<String>,
}

/// # POST /api/reword
pub async fn reword(
    State(completion_client): State<SharedCompletionClient>,
    WithRejection(Json(payload), _): WithRejection<Json<RewordPayload>, AppError>,
) -> AppJsonResult<RewordResult> {
    let (Some(text), Some(instructions)) =
        (non_empty(payload.text), non_empty(payload.instructions))
    else {
        return Err(AppError::BadRequest(
            "Text and instructions are required".to_string(),
        ));
    };

    tracing::info!("Processing reword request");
    let result = reword_text(completion_client.as_ref(), &text, &instructions).await?;
    tracing::info!("Reword complete");

    Ok(Json(result))
}
