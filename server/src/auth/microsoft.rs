use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use derive_more::derive::Display;
use url::Url;

use crate::{model::response::TokenResponse, server_config::MicrosoftConfig, HttpClient};

use super::relay;

pub const MAIL_SCOPES: &str = "https://graph.microsoft.com/Mail.Read offline_access";

#[derive(Clone)]
pub struct MicrosoftOAuth {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_endpoint: String,
    token_endpoint: String,
}

impl MicrosoftOAuth {
    pub fn new(http_client: HttpClient, config: &MicrosoftConfig) -> Self {
        Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorize_endpoint: config.authorize_endpoint(),
            token_endpoint: config.token_endpoint(),
        }
    }

    pub fn authorize_url(&self) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.authorize_endpoint)?;
        url.query_pairs_mut().extend_pairs(&[
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", MAIL_SCOPES),
            ("response_mode", "query"),
        ]);

        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str) -> OauthResult<TokenResponse> {
        let resp = self
            .http_client
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", MAIL_SCOPES),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error exchanging code for token: {:?}", e);
                AuthCallbackError::TokenExchange(e.to_string())
            })?;

        let status = resp.status();
        let resp: serde_json::Value = resp
            .json()
            .await
            .map_err(|_| AuthCallbackError::BadOauthResponse)?;

        if !status.is_success() || resp.get("error").is_some() {
            let description = resp
                .get("error_description")
                .or_else(|| resp.get("error"))
                .and_then(|d| d.as_str())
                .unwrap_or("unknown error")
                .to_string();
            tracing::error!("OAuth token exchange failed ({}): {}", status, description);
            return Err(AuthCallbackError::TokenExchange(description));
        }

        let tokens = serde_json::from_value::<TokenResponse>(resp).map_err(|e| {
            tracing::error!("Unexpected token response shape: {:?}", e);
            AuthCallbackError::BadOauthResponse
        })?;

        tracing::info!(
            "Token exchange successful: access_token={}... expires_in={}",
            tokens.access_token.chars().take(10).collect::<String>(),
            tokens.expires_in
        );

        Ok(tokens)
    }
}

#[derive(Debug, Display)]
pub enum AuthCallbackError {
    #[display("Missing authorization code")]
    MissingCode,
    #[display("Authorization denied: {_0}")]
    Denied(String),
    #[display("Token exchange failed: {_0}")]
    TokenExchange(String),
    #[display("Bad OAuth response")]
    BadOauthResponse,
    #[display("Could not render page: {_0}")]
    Render(String),
}

pub type OauthResult<T> = Result<T, AuthCallbackError>;

impl IntoResponse for AuthCallbackError {
    fn into_response(self) -> Response {
        let (status, page) = match &self {
            AuthCallbackError::MissingCode => (
                StatusCode::BAD_REQUEST,
                relay::error_page(
                    "Missing authorization code",
                    "Authentication failed: Missing authorization code",
                ),
            ),
            AuthCallbackError::Denied(description) => (
                StatusCode::BAD_REQUEST,
                relay::error_page(description, "Authentication was cancelled or denied."),
            ),
            AuthCallbackError::TokenExchange(_) | AuthCallbackError::BadOauthResponse => (
                StatusCode::INTERNAL_SERVER_ERROR,
                relay::error_page(
                    "OAuth token exchange failed",
                    "Authentication failed. Please try again.",
                ),
            ),
            AuthCallbackError::Render(_) => {
                tracing::error!("{}", self);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
            }
        };

        match page {
            Ok(page) => (status, Html(page)).into_response(),
            Err(e) => {
                tracing::error!("Could not render auth error page: {:?}", e);
                (status, "Authentication failed").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::common::test_config;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn oauth_for(authority: &str) -> MicrosoftOAuth {
        MicrosoftOAuth::new(HttpClient::new(), &test_config(authority).microsoft)
    }

    #[test]
    fn test_authorize_url() {
        let url = oauth_for("https://login.microsoftonline.com/consumers")
            .authorize_url()
            .unwrap();

        assert_eq!(url.host_str(), Some("login.microsoftonline.com"));
        assert_eq!(url.path(), "/consumers/oauth2/v2.0/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "test-client-id".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:3001/auth/callback".into()
        )));
        assert!(pairs.contains(&("scope".into(), MAIL_SCOPES.into())));
        assert!(pairs.contains(&("response_mode".into(), "query".into())));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/v2.0/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code-123"))
            .and(body_string_contains("client_secret=test-client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "scope": MAIL_SCOPES,
                "expires_in": 3600,
                "access_token": "access-abc",
                "refresh_token": "refresh-xyz"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = oauth_for(&server.uri())
            .exchange_code("auth-code-123")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "access-abc");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-xyz"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_exchange_code_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "AADSTS70000: The provided authorization code is invalid."
            })))
            .mount(&server)
            .await;

        let err = oauth_for(&server.uri())
            .exchange_code("stale")
            .await
            .unwrap_err();

        match err {
            AuthCallbackError::TokenExchange(description) => {
                assert!(description.contains("AADSTS70000"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_unexpected_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/v2.0/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token_type": "Bearer" })),
            )
            .mount(&server)
            .await;

        let err = oauth_for(&server.uri())
            .exchange_code("code")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthCallbackError::BadOauthResponse));
    }
}
