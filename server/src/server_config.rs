use config::{Config, ConfigError};
use serde::Deserialize;
use std::{env, path::Path, result::Result};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MICROSOFT_AUTHORITY: &str = "https://login.microsoftonline.com/consumers";
const DEFAULT_MICROSOFT_REDIRECT_URI: &str = "http://localhost:3001/auth/callback";
const DEFAULT_PORT: i64 = 3001;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct MicrosoftConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authority: String,
}

impl MicrosoftConfig {
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority.trim_end_matches('/'))
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }
}

/// Flat key layout shared by `config.toml` and the process environment,
/// e.g. `OPENAI_API_KEY` maps to `openai_api_key`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    openai_api_key: String,
    openai_api_base: String,
    microsoft_client_id: String,
    microsoft_client_secret: String,
    microsoft_redirect_uri: String,
    microsoft_authority: String,
    port: u16,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub openai: OpenAiConfig,
    pub microsoft: MicrosoftConfig,
    pub port: u16,
}

impl ServerConfig {
    /// Builds the config from defaults, an optional `config.toml` and the
    /// environment, in increasing order of precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_stem(&app_dir(env::var("APP_DIR").ok()));
        let cfg_file: ConfigFile = Config::builder()
            .set_default("openai_api_base", DEFAULT_OPENAI_API_BASE)?
            .set_default("microsoft_redirect_uri", DEFAULT_MICROSOFT_REDIRECT_URI)?
            .set_default("microsoft_authority", DEFAULT_MICROSOFT_AUTHORITY)?
            .set_default("port", DEFAULT_PORT)?
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()?;

        Ok(cfg_file.into())
    }
}

impl From<ConfigFile> for ServerConfig {
    fn from(cfg_file: ConfigFile) -> Self {
        let ConfigFile {
            openai_api_key,
            openai_api_base,
            microsoft_client_id,
            microsoft_client_secret,
            microsoft_redirect_uri,
            microsoft_authority,
            port,
        } = cfg_file;

        ServerConfig {
            openai: OpenAiConfig {
                api_key: openai_api_key,
                api_base: openai_api_base.trim_end_matches('/').to_string(),
            },
            microsoft: MicrosoftConfig {
                client_id: microsoft_client_id,
                client_secret: microsoft_client_secret,
                redirect_uri: microsoft_redirect_uri,
                authority: microsoft_authority,
            },
            port,
        }
    }
}

/// `APP_DIR` when set, otherwise the workspace root.
fn app_dir(from_env: Option<String>) -> String {
    from_env.unwrap_or_else(|| {
        let dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        Path::new(&dir)
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or(dir)
    })
}

/// Extension-less path handed to `config::File::with_name`.
fn config_file_stem(app_dir: &str) -> String {
    format!("{}/config/config", app_dir.trim_end_matches('/'))
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        format!("{}***", secret.chars().take(4).collect::<String>())
    }
}

impl std::fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server Config:\nPort: {}\n\nOpenAI: base={} key={}\n\nMicrosoft: client_id={} secret={} redirect_uri={} authority={}",
            self.port,
            self.openai.api_base,
            redact(&self.openai.api_key),
            self.microsoft.client_id,
            redact(&self.microsoft.client_secret),
            self.microsoft.redirect_uri,
            self.microsoft.authority,
        )
    }
}
