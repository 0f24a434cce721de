//! LINE Messaging API dispatcher.

use async_trait::async_trait;
use serde_json::json;

use patrol_core::dispatch::{DispatchError, MessageDispatcher};

const LINE_API_BASE: &str = "https://api.line.me/v2/bot";

/// Delivers replies and pushes through the LINE Messaging API.
pub struct LineDispatcher {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl LineDispatcher {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, LINE_API_BASE)
    }

    /// Override the API host (tests point this at a local server).
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: base_url.into(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DispatchError::Rejected(format!(
                "{} {}",
                response.status(),
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageDispatcher for LineDispatcher {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DispatchError> {
        self.post(
            "/message/reply",
            json!({
                "replyToken": reply_token,
                "messages": [{"type": "text", "text": text}],
            }),
        )
        .await
    }

    async fn push(&self, user_id: &str, text: &str) -> Result<(), DispatchError> {
        self.post(
            "/message/push",
            json!({
                "to": user_id,
                "messages": [{"type": "text", "text": text}],
            }),
        )
        .await
    }
}
