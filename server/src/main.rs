mod auth;
mod email;
mod error;
mod model;
mod prompt;
mod request_tracing;
mod routes;
mod server_config;
mod state;
#[cfg(test)]
mod testing;
mod util;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use auth::MicrosoftOAuth;
use axum::{extract::FromRef, Router};
use email::{AnalysisCache, EmailAnalyzer};
use mimalloc::MiMalloc;
use prompt::{OpenAiClient, SharedCompletionClient};
use routes::AppRouter;
use server_config::ServerConfig;
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;

const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, FromRef)]
pub(crate) struct ServerState {
    completion_client: SharedCompletionClient,
    analysis_cache: AnalysisCache,
    analyzer: EmailAnalyzer,
    oauth: MicrosoftOAuth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    let config = ServerConfig::load().context("Server configuration is invalid")?;
    println!("{}", config);

    let http_client = reqwest::ClientBuilder::new().use_rustls_tls().build()?;
    let completion_client: SharedCompletionClient =
        Arc::new(OpenAiClient::new(http_client.clone(), &config.openai));
    let analysis_cache = AnalysisCache::default();

    let state = ServerState {
        analyzer: EmailAnalyzer::new(completion_client.clone(), analysis_cache.clone()),
        oauth: MicrosoftOAuth::new(http_client, &config.microsoft),
        completion_client,
        analysis_cache,
    };

    let router = AppRouter::create(state.clone());

    let mut scheduler = JobScheduler::new().await?;
    {
        let state_clone = state.clone();
        // Expired analyses already read as absent; this only reclaims memory
        scheduler
            .add(Job::new_repeated(
                CACHE_CLEANUP_INTERVAL,
                move |_uuid, _lock| {
                    state::cleanup::analysis_cache_cleanup(&state_clone);
                },
            )?)
            .await?;
    }

    scheduler.set_shutdown_handler(Box::new(move || {
        Box::pin(async move {
            tracing::info!("Shutting down scheduler");
        })
    }));

    scheduler.start().await?;

    run_server(router, config.port, scheduler).await
}

async fn shutdown_signal(mut scheduler: JobScheduler) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("Failed to shut down scheduler: {:?}", e);
    }
    tracing::info!("Cleanups done, shutting down");
}

async fn run_server(router: Router, port: u16, scheduler: JobScheduler) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind to {}", addr))?;
    tracing::info!("Server is running on http://localhost:{}", port);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(scheduler))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::common::{test_state, ScriptedCompletionClient};
    use tokio::net::TcpListener;

    pub struct TestServer {
        pub addr: SocketAddr,
        shutdown_tx: tokio::sync::oneshot::Sender<()>,
    }

    impl TestServer {
        pub fn url(&self) -> String {
            format!("http://{}", self.addr)
        }

        pub async fn shutdown(self) {
            let _ = self.shutdown_tx.send(());
        }
    }

    pub async fn setup() -> anyhow::Result<TestServer> {
        let state = test_state(
            Arc::new(ScriptedCompletionClient::new()),
            "https://login.microsoftonline.com/consumers",
        );
        let router = AppRouter::create(state);

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        });

        Ok(TestServer { addr, shutdown_tx })
    }

    #[tokio::test]
    async fn test_server_serves_health_over_tcp() {
        let server = setup().await.expect("Failed to setup test server");

        let resp = HttpClient::new()
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.json::<serde_json::Value>().await.unwrap(),
            serde_json::json!({ "status": "ok" })
        );

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let server = setup().await.expect("Failed to setup test server");

        let resp = HttpClient::new()
            .get(format!("{}/health", server.url()))
            .header("origin", "chrome-extension://abcdef")
            .send()
            .await
            .unwrap();

        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        server.shutdown().await;
    }
}
