//! Chain configuration: completion endpoint, credential, model and timeouts.
//!
//! | Key / Env | Default | Description |
//! |-----------|---------|-------------|
//! | `api_key` / `PROMPT_CHAIN__API_KEY`, else `OPENROUTER_API_KEY` | none | Bearer credential. |
//! | `api_url` / `PROMPT_CHAIN__API_URL` | OpenRouter chat completions | Endpoint URL. |
//! | `model` / `PROMPT_CHAIN__MODEL` | `nvidia/nemotron-nano-12b-v2-vl:free` | Model id. |
//! | `timeout_secs` / `PROMPT_CHAIN__TIMEOUT_SECS` | 60 | Per-request HTTP timeout. |
//! | `temperature`, `max_tokens` | unset | Passed through when set. |
//! | `app_title` | `Prompt-Chain-Support-Triage` | Sent as `X-Title`. |
//! | `run_timeout_secs` | unset | Budget for a whole five-stage run. |
//!
//! Precedence: environment > TOML file (`PROMPT_CHAIN_CONFIG`, else `config/prompt_chain.toml`) > defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "nvidia/nemotron-nano-12b-v2-vl:free";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_APP_TITLE: &str = "Prompt-Chain-Support-Triage";
const DEFAULT_CONFIG_PATH: &str = "config/prompt_chain.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("no API key configured (set OPENROUTER_API_KEY or PROMPT_CHAIN__API_KEY)")]
    MissingApiKey,
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_app_title() -> String {
    DEFAULT_APP_TITLE.to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_app_title")]
    pub app_title: String,
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_tokens: None,
            app_title: default_app_title(),
            run_timeout_secs: None,
        }
    }
}

// Never print the credential.
impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("app_title", &self.app_title)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .finish()
    }
}

impl ChainConfig {
    /// Load from `PROMPT_CHAIN_CONFIG` (or `config/prompt_chain.toml` when present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PROMPT_CHAIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(Some(&path))
    }

    /// Load from an optional TOML file plus environment. A missing file is not an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("model", DEFAULT_MODEL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("app_title", DEFAULT_APP_TITLE)?;

        if let Some(path) = path.filter(|p| p.exists()) {
            builder = builder.add_source(::config::File::from(path));
        }

        let built = builder
            .add_source(
                ::config::Environment::with_prefix("PROMPT_CHAIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: ChainConfig = built.try_deserialize()?;
        cfg.api_key = cfg
            .api_key
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok(cfg)
    }

    /// The configured credential, or [`ConfigError::MissingApiKey`].
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.trim().to_string());
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}
