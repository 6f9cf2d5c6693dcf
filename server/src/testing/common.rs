use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use axum::async_trait;

use crate::{
    auth::microsoft::MicrosoftOAuth,
    email::analysis::{AnalysisCache, EmailAnalyzer},
    prompt::{ChatMessage, CompletionClient, CompletionOptions, SharedCompletionClient},
    server_config::{MicrosoftConfig, OpenAiConfig, ServerConfig},
    HttpClient, ServerState,
};

pub type RecordedCall = (Vec<ChatMessage>, CompletionOptions);

/// Completion client that answers from a queue and records every request.
#[derive(Default)]
pub struct ScriptedCompletionClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, content: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.to_string()));
        self
    }

    pub fn with_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn create_chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push((messages, options));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(content),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted completion left")),
        }
    }
}

pub fn test_config(microsoft_authority: &str) -> ServerConfig {
    ServerConfig {
        openai: OpenAiConfig {
            api_key: "test-openai-key".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
        },
        microsoft: MicrosoftConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:3001/auth/callback".to_string(),
            authority: microsoft_authority.to_string(),
        },
        port: 3001,
    }
}

pub fn test_state(
    completion: Arc<ScriptedCompletionClient>,
    microsoft_authority: &str,
) -> ServerState {
    let config = test_config(microsoft_authority);
    let completion_client: SharedCompletionClient = completion;
    let analysis_cache = AnalysisCache::default();

    ServerState {
        analyzer: EmailAnalyzer::new(completion_client.clone(), analysis_cache.clone()),
        oauth: MicrosoftOAuth::new(HttpClient::new(), &config.microsoft),
        completion_client,
        analysis_cache,
    }
}
