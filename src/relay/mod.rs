//! Relay pipeline: document ingestion, chat forwarding, and vector queries.

mod service;
pub mod types;
mod upload;

pub use service::{RelayApi, RelayService};
pub use types::{IngestOutcome, QUERY_TOP_K, RelayError};
pub use upload::TempUpload;
