//! Shared types used by the vector index client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the vector index service.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index host failed to parse or normalize.
    #[error("Invalid index host: {0}")]
    InvalidHost(String),
    /// HTTP layer failed before receiving a response.
    #[error("Index request failed: {0}")]
    Http(reqwest::Error),
    /// The index did not answer within the configured timeout.
    #[error("Index request timed out")]
    Timeout,
    /// The index responded with an unexpected status code.
    #[error("Unexpected index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Connection parameters for the index, gathered from configuration.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// API credential sent on every request.
    pub api_key: String,
    /// Environment/region hosting the index.
    pub environment: String,
    /// Name of the index.
    pub name: String,
    /// Optional full host override (takes precedence over the derived host).
    pub host_override: Option<String>,
}

/// A single nearest-neighbor match returned by a query.
///
/// Serialized as-is back to API callers: the relay does not reshape results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Identifier of the matched record.
    pub id: String,
    /// Similarity score computed by the index.
    pub score: f32,
    /// Metadata stored alongside the vector, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Vec<QueryMatch>,
}
