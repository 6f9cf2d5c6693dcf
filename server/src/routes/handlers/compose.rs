use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    error::{AppError, AppJsonResult},
    prompt::{
        compose::{compose_email, ComposeResult},
        SharedCompletionClient,
    },
    util::non_empty,
};

#[derive(Debug, Deserialize)]
pub struct ComposePayload {
    pub context: Option<String>,
}

/// # POST /api/compose
pub async fn compose(
    State(completion_client): State<SharedCompletionClient>,
    WithRejection(Json(payload), _): WithRejection<Json<ComposePayload>, AppError>,
) -> AppJsonResult<ComposeResult> {
    let context = non_empty(payload.context)
        .ok_or_else(|| AppError::BadRequest("Context is required".to_string()))?;

    tracing::info!("Processing compose request");
    let result = compose_email(completion_client.as_ref(), &context).await?;
    tracing::info!("Compose complete");

    Ok(Json(result))
}
