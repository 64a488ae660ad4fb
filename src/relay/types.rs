//! Core data types and error definitions for the relay pipeline.

use crate::{chat::ChatError, embedding::EmbeddingError, index::IndexError, ocr::OcrError};
use thiserror::Error;

/// Number of nearest neighbors returned by a query.
pub const QUERY_TOP_K: usize = 5;

/// Errors emitted by the ingestion, chat, and query pipelines.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Vector index credentials were not provided at startup.
    #[error(
        "Vector index is not configured: set PINECONE_API_KEY, PINECONE_ENVIRONMENT, and PINECONE_INDEX_NAME"
    )]
    IndexNotConfigured,
    /// Embedding credentials were not provided at startup.
    #[error("Embedding API is not configured: set EMBEDDING_API_KEY or OPENAI_API_KEY")]
    EmbeddingNotConfigured,
    /// Chat credentials were not provided at startup.
    #[error("Chat API is not configured: set OPENAI_API_KEY")]
    ChatNotConfigured,
    /// Uploaded bytes could not be written to the temp directory.
    #[error("Failed to store upload: {0}")]
    UploadIo(#[from] std::io::Error),
    /// OCR subprocess failed to start or exceeded its time budget.
    #[error("Text extraction failed: {0}")]
    Ocr(#[from] OcrError),
    /// Embedding provider failed to produce a vector.
    #[error("Failed to generate embedding: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Vector index interaction failed during upsert or query.
    #[error("Vector index request failed: {0}")]
    Index(#[from] IndexError),
    /// Chat-completion relay failed upstream.
    #[error("Chat relay failed: {0}")]
    Chat(#[from] ChatError),
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Generated identifier the record was upserted under.
    pub document_id: String,
    /// Number of characters the OCR step extracted.
    pub extracted_chars: usize,
}
