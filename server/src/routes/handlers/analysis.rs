use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    email::{AnalysisResult, EmailAnalyzer},
    error::{AppError, AppJsonResult},
    util::{non_empty, short_id},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeEmailPayload {
    pub email_content: Option<String>,
    pub email_id: Option<String>,
}

/// # POST /api/analyze-email
pub async fn analyze_email(
    State(analyzer): State<EmailAnalyzer>,
    WithRejection(Json(payload), _): WithRejection<Json<AnalyzeEmailPayload>, AppError>,
) -> AppJsonResult<AnalysisResult> {
    let (Some(email_content), Some(email_id)) =
        (non_empty(payload.email_content), non_empty(payload.email_id))
    else {
        return Err(AppError::BadRequest(
            "Email content and ID are required".to_string(),
        ));
    };

    tracing::info!("Processing email analysis request for: {}...", short_id(&email_id));
    let analysis = analyzer
        .analyze_email_content(&email_content, &email_id)
        .await?;
    tracing::info!(
        "Analysis complete for: {}... priority={} sentiment={}",
        short_id(&email_id),
        analysis.priority,
        analysis.sentiment
    );

    Ok(Json(analysis))
}
