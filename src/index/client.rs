//! HTTP client wrapper for the Pinecone-style vector index.

use crate::index::types::{IndexError, IndexSettings, QueryMatch, QueryResponse};
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};

/// Lightweight HTTP client for vector upsert and nearest-neighbor queries.
pub struct IndexClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl IndexClient {
    /// Construct a new client from the configured settings.
    ///
    /// The host is derived from the index name and environment unless an
    /// explicit override is present.
    pub fn new(client: Client, settings: IndexSettings) -> Result<Self, IndexError> {
        let host = settings.host_override.unwrap_or_else(|| {
            format!(
                "https://{}.svc.{}.pinecone.io",
                settings.name, settings.environment
            )
        });
        let base_url = normalize_base_url(&host).map_err(IndexError::InvalidHost)?;
        tracing::debug!(index = %settings.name, host = %base_url, "Initialized vector index client");

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key,
        })
    }

    /// Insert or replace a single vector record keyed by `id`.
    pub async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        metadata: Map<String, Value>,
    ) -> Result<(), IndexError> {
        let body = json!({
            "vectors": [{
                "id": id,
                "values": vector,
                "metadata": metadata,
            }]
        });

        let response = self
            .request(Method::POST, "vectors/upsert")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(id, "Vector upserted");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(id, error = %error, "Vector upsert failed");
            Err(error)
        }
    }

    /// Query the index for the `top_k` nearest neighbors, with metadata.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, IndexError> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });

        let response = self.request(Method::POST, "query").json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Index query failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        Ok(payload.matches)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
