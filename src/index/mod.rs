//! Vector index (Pinecone REST) integration.

pub mod client;
pub mod types;

pub use client::IndexClient;
pub use types::{IndexError, IndexSettings, QueryMatch};
