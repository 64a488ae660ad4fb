//! HTTP surface for docrelay.
//!
//! A compact Axum router with three endpoints:
//!
//! - `POST /chat` – Forward an opaque chat-completion payload upstream and
//!   return `{ "reply": string }` from the first choice.
//! - `POST /upload` – Accept a multipart file under the `file` field and run
//!   the ingestion pipeline (OCR, embed, upsert). Returns `{ "success": true }`.
//! - `POST /query` – Embed `{ "question": string }` and return the top
//!   nearest-neighbor matches as `{ "matches": [...] }`.
//!
//! Every route is wrapped in a permissive CORS layer so browser clients can
//! call the relay from any origin; preflight `OPTIONS` requests succeed with
//! an empty body. Input problems map to 400, everything else to 500 with a
//! generic message — upstream detail stays in the logs, never in responses.

use crate::index::QueryMatch;
use crate::relay::{RelayApi, RelayError};
use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build the HTTP router exposing the relay API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RelayApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(relay_chat::<S>))
        .route("/upload", post(upload_document::<S>))
        .route("/query", post(query_index::<S>))
        .layer(cors)
        .with_state(service)
}

/// Success response for the `POST /chat` endpoint.
#[derive(Serialize)]
struct ChatReply {
    /// First choice's message content, verbatim.
    reply: String,
}

/// Forward a chat-completion payload and return the normalized reply.
async fn relay_chat<S>(
    State(service): State<Arc<S>>,
    Json(payload): Json<Value>,
) -> Result<Json<ChatReply>, AppError>
where
    S: RelayApi,
{
    let reply = service.relay_chat(&payload).await?;
    Ok(Json(ChatReply { reply }))
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    success: bool,
}

/// Receive a multipart upload and run the ingestion pipeline.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: RelayApi,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Malformed multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("Failed to read upload: {err}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }

        let outcome = service.ingest(&filename, &bytes).await?;
        tracing::info!(
            id = %outcome.document_id,
            filename,
            chars = outcome.extracted_chars,
            "Upload request completed"
        );
        return Ok(Json(UploadResponse { success: true }));
    }

    Err(AppError::BadRequest(
        "Multipart field 'file' is required".into(),
    ))
}

/// Request body for the `POST /query` endpoint.
#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

/// Success response for the `POST /query` endpoint.
#[derive(Serialize)]
struct QueryResults {
    /// Nearest-neighbor matches, passed through from the index unmodified.
    matches: Vec<QueryMatch>,
}

/// Embed a question and return its nearest matches.
async fn query_index<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResults>, AppError>
where
    S: RelayApi,
{
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("Question must not be empty".into()));
    }

    let matches = service.query(question).await?;
    Ok(Json(QueryResults { matches }))
}

/// Error wrapper translating pipeline failures into HTTP responses.
///
/// Configuration errors carry their own distinct message so a misconfigured
/// deployment is diagnosable from the response alone. Upstream and subprocess
/// failures produce a generic message; their detail (which may embed upstream
/// bodies) is logged where the error is raised, never echoed to callers.
enum AppError {
    BadRequest(String),
    Relay(RelayError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Relay(error) => {
                let message = match &error {
                    RelayError::IndexNotConfigured
                    | RelayError::EmbeddingNotConfigured
                    | RelayError::ChatNotConfigured => error.to_string(),
                    RelayError::Chat(_) => "Proxy failed to reach OpenAI".to_string(),
                    RelayError::Ocr(_) => "Text extraction failed".to_string(),
                    RelayError::Embedding(_) => "Failed to generate embedding".to_string(),
                    RelayError::Index(_) => "Vector index request failed".to_string(),
                    RelayError::UploadIo(_) => "Failed to store upload".to_string(),
                };
                tracing::error!(error = %error, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RelayError> for AppError {
    fn from(inner: RelayError) -> Self {
        Self::Relay(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::chat::ChatError;
    use crate::index::QueryMatch;
    use crate::relay::{IngestOutcome, RelayApi, RelayError};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    /// Failure injected into the stub for a given test.
    #[derive(Clone, Copy)]
    enum FailMode {
        None,
        ChatUpstream,
        IndexNotConfigured,
    }

    struct StubRelay {
        fail: FailMode,
        reply: String,
        matches: Vec<QueryMatch>,
        ingests: Mutex<Vec<(String, Vec<u8>)>>,
        chats: Mutex<Vec<Value>>,
        queries: Mutex<Vec<String>>,
    }

    impl StubRelay {
        fn new(fail: FailMode) -> Self {
            Self {
                fail,
                reply: "stub reply".into(),
                matches: Vec::new(),
                ingests: Mutex::new(Vec::new()),
                chats: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn failure(&self) -> Option<RelayError> {
            match self.fail {
                FailMode::None => None,
                FailMode::ChatUpstream => Some(RelayError::Chat(ChatError::UnexpectedStatus {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "super secret upstream detail".into(),
                })),
                FailMode::IndexNotConfigured => Some(RelayError::IndexNotConfigured),
            }
        }
    }

    #[async_trait]
    impl RelayApi for StubRelay {
        async fn ingest(
            &self,
            filename: &str,
            bytes: &[u8],
        ) -> Result<IngestOutcome, RelayError> {
            if let Some(err) = self.failure() {
                return Err(err);
            }
            self.ingests
                .lock()
                .await
                .push((filename.to_string(), bytes.to_vec()));
            Ok(IngestOutcome {
                document_id: "doc-1".into(),
                extracted_chars: 12,
            })
        }

        async fn relay_chat(&self, payload: &Value) -> Result<String, RelayError> {
            if let Some(err) = self.failure() {
                return Err(err);
            }
            self.chats.lock().await.push(payload.clone());
            Ok(self.reply.clone())
        }

        async fn query(&self, question: &str) -> Result<Vec<QueryMatch>, RelayError> {
            if let Some(err) = self.failure() {
                return Err(err);
            }
            self.queries.lock().await.push(question.to_string());
            Ok(self.matches.clone())
        }
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn multipart_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "docrelay-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn chat_returns_reply_from_first_choice() {
        let service = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(service.clone());
        let payload = json!({
            "model": "gpt-4",
            "messages": [{ "role": "user", "content": "hello" }],
        });

        let response = app
            .oneshot(json_request("/chat", payload.clone()))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "reply": "stub reply" }));

        let chats = service.chats.lock().await;
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0], payload);
    }

    #[tokio::test]
    async fn chat_upstream_failure_is_masked() {
        let app = create_router(Arc::new(StubRelay::new(FailMode::ChatUpstream)));

        let response = app
            .oneshot(json_request("/chat", json!({ "messages": [] })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Proxy failed to reach OpenAI" }));
    }

    #[tokio::test]
    async fn upload_ingests_file_field() {
        let service = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request("/upload", "file", "scan.pdf", b"%PDF-1.4"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": true }));

        let ingests = service.ingests.lock().await;
        assert_eq!(ingests.len(), 1);
        assert_eq!(ingests[0].0, "scan.pdf");
        assert_eq!(ingests[0].1, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_a_client_error() {
        let service = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request("/upload", "attachment", "scan.pdf", b"x"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.ingests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_a_client_error() {
        let service = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(service.clone());

        let response = app
            .oneshot(multipart_request("/upload", "file", "empty.pdf", b""))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.ingests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_index_yields_distinct_server_error() {
        let app = create_router(Arc::new(StubRelay::new(FailMode::IndexNotConfigured)));

        let response = app
            .oneshot(multipart_request("/upload", "file", "scan.pdf", b"bytes"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("Vector index is not configured"));
    }

    #[tokio::test]
    async fn query_returns_matches_and_zero_is_success() {
        let mut service = StubRelay::new(FailMode::None);
        service.matches = vec![QueryMatch {
            id: "doc-1".into(),
            score: 0.87,
            metadata: Some(
                json!({ "text": "lease agreement" })
                    .as_object()
                    .cloned()
                    .expect("object"),
            ),
        }];
        let service = Arc::new(service);
        let app = create_router(service.clone());

        let response = app
            .clone()
            .oneshot(json_request("/query", json!({ "question": "who signed?" })))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["matches"][0]["id"], "doc-1");
        assert_eq!(body["matches"][0]["metadata"]["text"], "lease agreement");

        // Zero matches is still a 200 with an empty list.
        let empty = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(empty);
        let response = app
            .oneshot(json_request("/query", json!({ "question": "anything" })))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "matches": [] }));
    }

    #[tokio::test]
    async fn blank_question_is_a_client_error() {
        let service = Arc::new(StubRelay::new(FailMode::None));
        let app = create_router(service.clone());

        let response = app
            .oneshot(json_request("/query", json!({ "question": "   " })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.queries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn preflight_succeeds_with_permissive_cors() {
        let app = create_router(Arc::new(StubRelay::new(FailMode::None)));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/chat")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .map(|value| value.to_str().expect("header")),
            Some("*")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert!(bytes.is_empty());
    }
}
