//! Tracing-only dispatcher for tokenless local runs.

use async_trait::async_trait;

use patrol_core::dispatch::{DispatchError, MessageDispatcher};

/// Logs outbound messages instead of delivering them.
pub struct LogDispatcher;

#[async_trait]
impl MessageDispatcher for LogDispatcher {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DispatchError> {
        tracing::info!(reply_token = %reply_token, text = %text, "reply (not delivered)");
        Ok(())
    }

    async fn push(&self, user_id: &str, text: &str) -> Result<(), DispatchError> {
        tracing::info!(user_id = %user_id, text = %text, "push (not delivered)");
        Ok(())
    }
}
