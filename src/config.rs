//! Environment-driven configuration.
//!
//! Credentials are optional on purpose: a missing key must not prevent the
//! process from starting. Endpoints that depend on an unconfigured service
//! fail fast at request time with a "not configured" error instead of
//! attempting a doomed network call. Only malformed values (an unparsable
//! port or timeout) abort startup.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default URL of the hosted chat-completion endpoint.
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default URL of the hosted embeddings endpoint.
pub const DEFAULT_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
/// Default embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docrelay server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Credential for the chat-completion API.
    pub chat_api_key: Option<String>,
    /// Credential for the embeddings API; falls back to the chat credential.
    pub embedding_api_key: Option<String>,
    /// Chat-completion endpoint URL.
    pub chat_url: String,
    /// Embeddings endpoint URL.
    pub embeddings_url: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Credential for the vector index service.
    pub index_api_key: Option<String>,
    /// Vector index environment/region (used to derive the index host).
    pub index_environment: Option<String>,
    /// Name of the vector index.
    pub index_name: Option<String>,
    /// Explicit index host override, taking precedence over the derived host.
    pub index_host: Option<String>,
    /// Program invoked to extract text from an uploaded file.
    pub ocr_command: String,
    /// Directory receiving transient uploads (defaults to the OS temp dir).
    pub upload_dir: PathBuf,
    /// Timeout applied to every outbound HTTP call, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout applied to the OCR subprocess, in seconds.
    pub ocr_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            chat_api_key: load_env_optional("OPENAI_API_KEY"),
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            chat_url: load_env_optional("OPENAI_CHAT_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            embeddings_url: load_env_optional("OPENAI_EMBEDDINGS_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDINGS_URL.to_string()),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            index_api_key: load_env_optional("PINECONE_API_KEY"),
            index_environment: load_env_optional("PINECONE_ENVIRONMENT"),
            index_name: load_env_optional("PINECONE_INDEX_NAME"),
            index_host: load_env_optional("PINECONE_INDEX_HOST"),
            ocr_command: load_env_optional("OCR_COMMAND").unwrap_or_else(|| "ocr".to_string()),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            request_timeout_secs: parse_env_or("REQUEST_TIMEOUT_SECS", 30)?,
            ocr_timeout_secs: parse_env_or("OCR_TIMEOUT_SECS", 60)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Credential effective for the embeddings endpoint.
    ///
    /// `EMBEDDING_API_KEY` wins when both are set; otherwise the chat
    /// credential is shared, matching the upstream provider's single-key setup.
    pub fn effective_embedding_key(&self) -> Option<&str> {
        self.embedding_api_key
            .as_deref()
            .or(self.chat_api_key.as_deref())
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or(key: &str, default: u64) -> Result<u64, ConfigError> {
    match load_env_optional(key) {
        Some(value) => parse_u64(key, &value),
        None => Ok(default),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}
