use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{request_tracing, ServerState};

use super::handlers::{analysis, auth, common, compose, reword};

use common::handler_404;

pub struct AppRouter;

impl AppRouter {
    pub fn create(state: ServerState) -> Router {
        let router = Router::new()
            .route(
                "/api/analyze-email",
                post(analysis::analyze_email).fallback(handler_404),
            )
            .route("/api/reword", post(reword::reword).fallback(handler_404))
            .route("/api/compose", post(compose::compose).fallback(handler_404))
            .route("/auth/login", get(auth::handler_login).fallback(handler_404))
            .route(
                "/auth/callback",
                get(auth::handler_callback).fallback(handler_404),
            )
            .route("/favicon.ico", get(common::favicon).fallback(handler_404))
            .route("/health", get(common::health).fallback(handler_404))
            .fallback(handler_404)
            .with_state(state)
            .layer(CorsLayer::permissive());

        request_tracing::with_request_tracing(router)
    }
}
