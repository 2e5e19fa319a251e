//! Chat backend HTTP client (`/api/chat`, `/api/reset`).
//!
//! The backend keys memory to a session cookie, so the client carries a
//! cookie store across calls. Chat-send failures are reported through
//! `ChatApiError` and rendered inline by the controller; they are never
//! propagated past it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// Shown when the server reports failure without an error detail.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Outbound body for POST /api/chat.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub use_memori: bool,
    pub provider: String,
    pub model: String,
}

/// Success body from POST /api/chat. The server is authoritative for the
/// echoed fields; it may answer with a different provider or model than
/// requested (e.g. a fallback).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub use_memori: bool,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatApiError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Api(String),
}

/// Transport seam for the session controller. Implemented by the HTTP client
/// below and by scripted backends in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat message with the submit-time settings snapshot.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatApiError>;

    /// Clear the server-side conversation/memory state.
    async fn reset_session(&self) -> Result<(), ChatApiError>;
}

/// reqwest-backed [`ChatBackend`].
#[derive(Clone)]
pub struct ChatApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatApiClient {
    /// Build a client for the given base URL (default http://127.0.0.1:5001).
    /// `timeout` is an optional hardening knob; with none configured a hung
    /// request waits indefinitely, matching the default behavior.
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, ChatApiError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for ChatApiClient {
    /// POST /api/chat — non-2xx bodies carry an optional `error` field; when
    /// it is missing or blank the generic message is used instead.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatApiError> {
        let url = format!("{}/api/chat", self.base_url);
        let res = self.client.post(&url).json(request).send().await?;
        if !res.status().is_success() {
            let detail = res
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(ChatApiError::Api(detail));
        }
        let reply: ChatReply = res.json().await?;
        Ok(reply)
    }

    /// POST /api/reset — no body; any 2xx counts as success.
    async fn reset_session(&self) -> Result<(), ChatApiError> {
        let url = format!("{}/api/reset", self.base_url);
        let res = self.client.post(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChatApiError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}
