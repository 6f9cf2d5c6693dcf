use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::derive::Display;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;
pub type AppJsonResult<T> = AppResult<Json<T>>;

#[derive(Debug, Display)]
pub enum AppError {
    #[display("{_0}")]
    BadRequest(String),
    #[display("{_0}")]
    NotFound(String),
    #[display("Failed to analyze email content: {_0}")]
    AnalysisFailed(anyhow::Error),
    #[display("Failed to reword text with AI: {_0}")]
    RewordFailed(anyhow::Error),
    #[display("Failed to compose email with AI: {_0}")]
    ComposeFailed(anyhow::Error),
    #[display("{_0}")]
    Internal(anyhow::Error),
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        tracing::error!("Reqwest error: {:?}", error);
        AppError::Internal(error.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// Upstream causes are logged here and never written to the response body,
// except for `Internal`, which carries the raw message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::AnalysisFailed(e) => {
                tracing::error!("Analysis failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to analyze email".to_string(),
                )
            }
            AppError::RewordFailed(e) => {
                tracing::error!("Reword failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to reword text".to_string(),
                )
            }
            AppError::ComposeFailed(e) => {
                tracing::error!("Compose failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to compose email".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
