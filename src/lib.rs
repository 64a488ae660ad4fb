#![deny(missing_docs)]

//! Core library for the docrelay server.
//!
//! docrelay is a stateless relay in front of three external collaborators: a
//! chat-completion API, an embeddings API, and a Pinecone-style vector index.
//! Uploaded documents pass through an external OCR subprocess before being
//! embedded and upserted; chat payloads are forwarded verbatim; questions are
//! embedded and answered with nearest-neighbor matches. Nothing is persisted
//! locally beyond the lifetime of a single request.

/// HTTP routing and REST handlers.
pub mod api;
/// Chat-completion relay client.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Vector index (Pinecone REST) integration.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// OCR subprocess integration.
pub mod ocr;
/// Ingestion, chat, and query pipeline.
pub mod relay;
