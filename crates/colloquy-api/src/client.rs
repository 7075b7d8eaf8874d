//! Answer service client

use crate::error::{Error, Result};
use crate::stream::{EventBuffer, StreamingUpdate, UpdateStream, decode_event, read_error};
use crate::types::{QuestionRequest, SourceDocument};
use async_stream::stream;
use futures::StreamExt;

/// Path of the answer endpoint, relative to the service base URL
const ANSWER_PATH: &str = "/v1/chatqna";

/// Status the answer pipeline uses for content-safety rejections
pub const POLICY_REJECTED_STATUS: u16 = 466;

const GUARDRAILS_FALLBACK: &str = "The request was rejected by content safety guards.";

/// Client for the streaming answer service
pub struct QnaClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl QnaClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    /// Attach a bearer token to every request.
    ///
    /// Token acquisition and refresh belong to the caller's identity
    /// provider client; this client only forwards what it is given.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Submit a question and stream back answer updates.
    ///
    /// The service answers either with a buffered JSON payload or with an
    /// event stream; both are surfaced as the same `UpdateStream`. The
    /// stream is finite and ends on completion or on the first error item.
    pub async fn post_question(&self, request: &QuestionRequest) -> Result<UpdateStream> {
        let url = format!("{}{}", self.base_url, ANSWER_PATH);
        tracing::debug!("posting question to {}", url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.as_u16() == POLICY_REJECTED_STATUS {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(
                POLICY_REJECTED_STATUS,
                guardrails_detail(&body),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            };
            return Err(Error::status(status.as_u16(), message));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("application/json") {
            let payload: serde_json::Value = response.json().await?;
            Ok(buffered_updates(payload))
        } else if content_type.contains("text/event-stream") {
            Ok(streamed_updates(response))
        } else {
            Err(Error::UnexpectedContentType(content_type))
        }
    }
}

/// Turn a buffered JSON answer into the two updates it carries:
/// the structured replacement and the reranked sources.
fn buffered_updates(payload: serde_json::Value) -> UpdateStream {
    let documents = payload
        .pointer("/json/reranked_docs")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<SourceDocument>>(v).ok())
        .unwrap_or_default();

    let updates = vec![
        Ok(StreamingUpdate::replace(payload)),
        Ok(StreamingUpdate::sources(documents)),
    ];
    Box::pin(futures::stream::iter(updates))
}

/// Decode an event-stream body into updates as chunks arrive
fn streamed_updates(response: reqwest::Response) -> UpdateStream {
    Box::pin(stream! {
        let mut body = response.bytes_stream();
        let mut buffer = EventBuffer::new();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in buffer.push(&bytes) {
                        if let Some(update) = decode_event(&event) {
                            yield Ok(update);
                        }
                    }
                }
                Err(e) => {
                    yield Err(read_error(e));
                    return;
                }
            }
        }

        if let Some(event) = buffer.flush() {
            if let Some(update) = decode_event(&event) {
                yield Ok(update);
            }
        }
    })
}

/// Extract the human-readable detail from a guardrails rejection body.
///
/// The pipeline double-wraps it: the body is `{"error": "<json>"}` where
/// the inner JSON carries a `detail` field.
fn guardrails_detail(body: &str) -> String {
    let outer: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return GUARDRAILS_FALLBACK.to_string(),
    };

    let inner = match outer.get("error").and_then(|e| e.as_str()) {
        Some(s) => s,
        None => return GUARDRAILS_FALLBACK.to_string(),
    };

    serde_json::from_str::<serde_json::Value>(inner)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| GUARDRAILS_FALLBACK.to_string())
}
