//! Relay service coordinating OCR, embedding, and vector index operations.

use crate::{
    chat::ChatClient,
    config::Config,
    embedding::{EmbeddingClient, OpenAiEmbeddingClient},
    index::{IndexClient, IndexSettings, QueryMatch},
    ocr::{CommandExtractor, TextExtractor},
    relay::{
        types::{IngestOutcome, QUERY_TOP_K, RelayError},
        upload::TempUpload,
    },
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Coordinates the full relay: document ingestion, chat forwarding, and
/// nearest-neighbor queries.
///
/// The service owns long-lived handles to every external collaborator.
/// Construct it once near process start, before the listener accepts traffic,
/// and share it through an `Arc`. Collaborators whose credentials are absent
/// stay `None`; the corresponding operations fail fast with a "not configured"
/// error instead of reaching for the network.
pub struct RelayService {
    chat: Option<ChatClient>,
    embedder: Option<Box<dyn EmbeddingClient>>,
    index: Option<IndexClient>,
    ocr: Box<dyn TextExtractor>,
    upload_dir: PathBuf,
}

/// Abstraction over the relay pipeline used by the HTTP surface.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// OCR, embed, and upsert an uploaded document into the vector index.
    async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestOutcome, RelayError>;

    /// Forward an opaque chat payload and return the first reply text.
    async fn relay_chat(&self, payload: &Value) -> Result<String, RelayError>;

    /// Embed a question and return its nearest matches from the index.
    async fn query(&self, question: &str) -> Result<Vec<QueryMatch>, RelayError>;
}

impl RelayService {
    /// Build the service from loaded configuration.
    ///
    /// Startup never fails on missing credentials; it only fails when a
    /// provided value is unusable (bad index host, unwritable upload
    /// directory, HTTP client build error).
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        // Surface a bad UPLOAD_DIR at boot rather than as a 500 on the first
        // upload.
        std::fs::create_dir_all(&config.upload_dir).map_err(|err| {
            anyhow::anyhow!(
                "Failed to create upload directory {}: {err}",
                config.upload_dir.display()
            )
        })?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("docrelay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let chat = config.chat_api_key.clone().map(|key| {
            ChatClient::new(http.clone(), config.chat_url.clone(), key)
        });

        let embedder: Option<Box<dyn EmbeddingClient>> =
            config.effective_embedding_key().map(|key| {
                Box::new(OpenAiEmbeddingClient::new(
                    http.clone(),
                    config.embeddings_url.clone(),
                    key.to_string(),
                    config.embedding_model.clone(),
                )) as Box<dyn EmbeddingClient>
            });

        let index = match (&config.index_api_key, &config.index_environment, &config.index_name) {
            (Some(api_key), Some(environment), Some(name)) => Some(IndexClient::new(
                http,
                IndexSettings {
                    api_key: api_key.clone(),
                    environment: environment.clone(),
                    name: name.clone(),
                    host_override: config.index_host.clone(),
                },
            )?),
            _ => None,
        };

        tracing::info!(
            chat_configured = chat.is_some(),
            embedding_configured = embedder.is_some(),
            index_configured = index.is_some(),
            ocr_command = %config.ocr_command,
            "Relay service initialized"
        );

        Ok(Self {
            chat,
            embedder,
            index,
            ocr: Box::new(CommandExtractor::new(
                config.ocr_command.clone(),
                Duration::from_secs(config.ocr_timeout_secs),
            )),
            upload_dir: config.upload_dir.clone(),
        })
    }

    /// Assemble the service from explicit collaborators.
    pub fn new(
        chat: Option<ChatClient>,
        embedder: Option<Box<dyn EmbeddingClient>>,
        index: Option<IndexClient>,
        ocr: Box<dyn TextExtractor>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            chat,
            embedder,
            index,
            ocr,
            upload_dir,
        }
    }

    fn index_or_err(&self) -> Result<&IndexClient, RelayError> {
        self.index.as_ref().ok_or(RelayError::IndexNotConfigured)
    }

    fn embedder_or_err(&self) -> Result<&dyn EmbeddingClient, RelayError> {
        self.embedder
            .as_deref()
            .ok_or(RelayError::EmbeddingNotConfigured)
    }
}

#[async_trait]
impl RelayApi for RelayService {
    async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestOutcome, RelayError> {
        // Configuration is checked before any file write or subprocess spawn:
        // a misconfigured server must not leave work half done.
        let index = self.index_or_err()?;
        let embedder = self.embedder_or_err()?;

        let upload = TempUpload::write(&self.upload_dir, bytes).await?;
        tracing::info!(id = %upload.id(), filename, bytes = bytes.len(), "Ingesting document");

        // Empty extraction is passed through as-is; the embedding endpoint is
        // entitled to reject it.
        let text = self.ocr.extract_text(upload.path()).await?;
        if text.is_empty() {
            tracing::warn!(id = %upload.id(), filename, "OCR produced no text");
        }

        let vector = embedder.embed(&text).await?;

        let mut metadata = Map::new();
        metadata.insert("text".into(), Value::String(text.clone()));
        metadata.insert("filename".into(), Value::String(filename.to_string()));
        index.upsert(upload.id(), vector, metadata).await?;

        tracing::info!(id = %upload.id(), chars = text.len(), "Document indexed");
        Ok(IngestOutcome {
            document_id: upload.id().to_string(),
            extracted_chars: text.len(),
        })
    }

    async fn relay_chat(&self, payload: &Value) -> Result<String, RelayError> {
        let chat = self.chat.as_ref().ok_or(RelayError::ChatNotConfigured)?;
        let reply = chat.relay(payload).await?;
        tracing::debug!(reply_chars = reply.len(), "Chat relay completed");
        Ok(reply)
    }

    async fn query(&self, question: &str) -> Result<Vec<QueryMatch>, RelayError> {
        let index = self.index_or_err()?;
        let embedder = self.embedder_or_err()?;

        let vector = embedder.embed(question).await?;
        let matches = index.query(vector, QUERY_TOP_K).await?;
        tracing::info!(matches = matches.len(), "Query completed");
        Ok(matches)
    }
}
