//! Chat-history service client

use crate::error::{Error, Result};
use crate::types::{ChatRecord, ChatSummary, HistoryEntry};
use serde::Serialize;

const HISTORY_PATH: &str = "/v1/chat_history";
const SAVE_PATH: &str = "/v1/chat_history/save";
const RENAME_PATH: &str = "/v1/chat_history/change_name";
const DELETE_PATH: &str = "/v1/chat_history/delete";

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    history: &'a [HistoryEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    id: &'a str,
    history_name: &'a str,
}

/// Client for the chat-history persistence service
pub struct HistoryClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HistoryClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body
        };
        Err(Error::status(status.as_u16(), message))
    }

    /// List all persisted chats, newest ordering as returned by the service
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let response = self.request(reqwest::Method::GET, HISTORY_PATH).send().await?;
        let chats = Self::check(response).await?.json().await?;
        Ok(chats)
    }

    /// Fetch one chat with its full question/answer history
    pub async fn get_chat(&self, id: &str) -> Result<ChatRecord> {
        let response = self
            .request(reqwest::Method::GET, HISTORY_PATH)
            .query(&[("history_id", id)])
            .send()
            .await?;
        let record = Self::check(response).await?.json().await?;
        Ok(record)
    }

    /// Persist history entries; omit `id` to create a new chat.
    /// Returns the saved chat's summary, including its (possibly new) id.
    pub async fn save_chat(
        &self,
        history: &[HistoryEntry],
        id: Option<&str>,
    ) -> Result<ChatSummary> {
        let response = self
            .request(reqwest::Method::POST, SAVE_PATH)
            .json(&SaveRequest { history, id })
            .send()
            .await?;
        let summary = Self::check(response).await?.json().await?;
        Ok(summary)
    }

    /// Rename a persisted chat
    pub async fn rename_chat(&self, id: &str, name: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, RENAME_PATH)
            .json(&RenameRequest {
                id,
                history_name: name,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Delete a persisted chat
    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, DELETE_PATH)
            .query(&[("history_id", id)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
