use axum::{
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};

use crate::{error::AppError, model::response::HealthResponse};

pub async fn health() -> Json<HealthResponse> {
    tracing::debug!("Health check called");
    Json(HealthResponse::ok())
}

pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn handler_404(method: Method, uri: Uri) -> AppError {
    let target = uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    tracing::info!("404 Not Found: {} {}", method, target);
    AppError::NotFound(format!("Cannot {} {}", method, target))
}
