use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
};
use serde::Deserialize;

use crate::{
    auth::{relay, AuthCallbackError, MicrosoftOAuth, OauthResult},
    error::AppResult,
};

/// # GET /auth/login
///
/// Sends the browser to the Microsoft consent screen with a 302.
pub async fn handler_login(State(oauth): State<MicrosoftOAuth>) -> AppResult<impl IntoResponse> {
    tracing::info!("Starting OAuth login flow...");
    let url = oauth.authorize_url()?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]))
}

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// # GET /auth/callback
///
/// Exchanges the authorization code and hands the tokens to the opener
/// window. Nothing is stored server-side.
pub async fn handler_callback(
    State(oauth): State<MicrosoftOAuth>,
    Query(query): Query<CallbackQuery>,
) -> OauthResult<Html<String>> {
    tracing::info!("Received callback from Microsoft");

    if let Some(error) = query.error {
        tracing::error!(
            "Error in oauth2 callback: {} {:?}",
            error,
            query.error_description
        );
        return Err(AuthCallbackError::Denied(
            query.error_description.unwrap_or(error),
        ));
    }

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::error!("No authorization code received");
        return Err(AuthCallbackError::MissingCode);
    };

    tracing::info!("Exchanging authorization code for tokens...");
    let tokens = oauth.exchange_code(&code).await?;

    let page = relay::success_page(&tokens).map_err(|e| AuthCallbackError::Render(e.to_string()))?;
    Ok(Html(page))
}
