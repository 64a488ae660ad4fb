//! Chat-completion relay client.
//!
//! The caller's payload is forwarded verbatim; the relay contributes nothing
//! but the server-held credential. Only the first choice's message content is
//! extracted from the upstream response.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while relaying a chat completion.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP layer failed before receiving a response.
    #[error("Chat request failed: {0}")]
    Http(reqwest::Error),
    /// The chat endpoint did not answer within the configured timeout.
    #[error("Chat request timed out")]
    Timeout,
    /// The endpoint responded with an unexpected status code.
    #[error("Unexpected chat response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A 2xx response carried no usable choice.
    #[error("Chat response contained no choices")]
    MalformedResponse,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Thin relay client for the external chat-completion endpoint.
pub struct ChatClient {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatClient {
    /// Construct a relay client for the given endpoint and credential.
    pub fn new(client: Client, url: String, api_key: String) -> Self {
        Self {
            client,
            url,
            api_key,
        }
    }

    /// Forward `payload` unchanged and return the first choice's message content.
    pub async fn relay(&self, payload: &Value) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ChatError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Chat endpoint returned an error");
            return Err(error);
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::MalformedResponse)
    }
}
