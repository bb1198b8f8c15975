//! Configuration for the travel agent service.
//!
//! Read from the environment (after `.env` is loaded by the binary):
//! - `SERP_API_KEY` - SerpApi key. Not validated; an empty key only fails at search time.
//! - `SERP_API_BASE_URL` - Optional. Defaults to `https://serpapi.com`.
//! - `LLM_PROVIDER` - Optional. `gemini` (default) or `ollama`.
//! - `GEMINI_API_KEY` - Required when the provider is `gemini`.
//! - `GEMINI_API_BASE` - Optional. Overrides the Gemini models endpoint.
//! - `LLM_MODEL` - Optional. Defaults to `gemini-1.5-pro-001` (`llama3.1` for Ollama).
//! - `OLLAMA_HOST` - Optional. Defaults to `http://localhost:11434`.
//! - `AGENT_MAX_TURNS` - Optional. Model round trips per request. Defaults to `8`.
//! - `AGENT_DEADLINE_SECS` - Optional. Wall-clock budget per request. Defaults to `120`.
//! - `MAX_CONVERSATIONS` - Optional. Chat conversations kept in memory. Defaults to `10000`.
//! - `CONVERSATION_TTL_SECS` - Optional. Idle time before a conversation may be dropped. Defaults to `3600`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.

use crate::agents::{AgentLimits, StoreLimits};
use crate::llm::gateways::{GeminiConfig, GeminiGateway, OllamaConfig, OllamaGateway};
use crate::llm::LlmGateway;
use crate::search::{SerpApiClient, SerpApiConfig};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-001";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to build client: {0}")]
    Client(#[from] crate::error::TravelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown provider '{}', expected gemini or ollama", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub serp_api_key: String,
    pub serp_api_base_url: String,
    pub llm_provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: Option<String>,
    pub model: String,
    pub ollama_host: Option<String>,
    pub max_turns: usize,
    pub deadline: Duration,
    pub max_conversations: usize,
    pub conversation_ttl: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if the Gemini provider is selected without
    /// `GEMINI_API_KEY`, and `ConfigError::InvalidValue` for unparseable settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let serp_api_key = lookup("SERP_API_KEY").unwrap_or_default();
        if serp_api_key.is_empty() {
            warn!("SERP_API_KEY is not set; travel searches will be rejected by the provider");
        }

        let serp_api_base_url = lookup("SERP_API_BASE_URL")
            .unwrap_or_else(|| crate::search::serpapi::DEFAULT_BASE_URL.to_string());

        let llm_provider = lookup("LLM_PROVIDER")
            .map(|v| {
                v.parse::<LlmProvider>()
                    .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e))
            })
            .transpose()?
            .unwrap_or(LlmProvider::Gemini);

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty());
        if llm_provider == LlmProvider::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }

        let model = lookup("LLM_MODEL").unwrap_or_else(|| match llm_provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL.to_string(),
            LlmProvider::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
        });

        let max_turns = parse_or(&lookup, "AGENT_MAX_TURNS", 8usize)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue(
                "AGENT_MAX_TURNS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let deadline = Duration::from_secs(parse_or(&lookup, "AGENT_DEADLINE_SECS", 120u64)?);

        let max_conversations = parse_or(&lookup, "MAX_CONVERSATIONS", 10_000usize)?;
        if max_conversations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CONVERSATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let conversation_ttl =
            Duration::from_secs(parse_or(&lookup, "CONVERSATION_TTL_SECS", 3600u64)?);

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        Ok(Self {
            serp_api_key,
            serp_api_base_url,
            llm_provider,
            gemini_api_key,
            gemini_api_base: lookup("GEMINI_API_BASE"),
            model,
            ollama_host: lookup("OLLAMA_HOST"),
            max_turns,
            deadline,
            max_conversations,
            conversation_ttl,
            host,
            port,
        })
    }

    pub fn agent_limits(&self) -> AgentLimits {
        AgentLimits {
            max_turns: self.max_turns,
            deadline: self.deadline,
        }
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_conversations: self.max_conversations,
            idle_ttl: self.conversation_ttl,
        }
    }

    pub fn serpapi_client(&self) -> Result<SerpApiClient, ConfigError> {
        Ok(SerpApiClient::with_config(SerpApiConfig {
            base_url: self.serp_api_base_url.clone(),
            api_key: self.serp_api_key.clone(),
            timeout: Some(self.deadline),
        })?)
    }

    /// The model gateway selected by `LLM_PROVIDER`
    pub fn gateway(&self) -> Result<Arc<dyn LlmGateway>, ConfigError> {
        match self.llm_provider {
            LlmProvider::Gemini => {
                let mut config = GeminiConfig {
                    api_key: self.gemini_api_key.clone().unwrap_or_default(),
                    timeout: Some(self.deadline),
                    ..Default::default()
                };
                if let Some(base) = &self.gemini_api_base {
                    config.api_base = base.clone();
                }
                Ok(Arc::new(GeminiGateway::with_config(config)?))
            }
            LlmProvider::Ollama => {
                let mut config = OllamaConfig {
                    timeout: Some(self.deadline),
                    ..Default::default()
                };
                if let Some(host) = &self.ollama_host {
                    config.host = host.clone();
                }
                Ok(Arc::new(OllamaGateway::with_config(config)?))
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
