//! Outbound message delivery boundary.

use async_trait::async_trait;
use thiserror::Error;

/// Dispatch error types
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Fire-and-forget delivery of replies and push messages.
///
/// The core never consumes a delivery confirmation; callers log failures
/// and move on. Implementations live in the patrol-channels crate.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Answer the inbound message identified by `reply_token`.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DispatchError>;

    /// Send an unsolicited message to a user.
    async fn push(&self, user_id: &str, text: &str) -> Result<(), DispatchError>;
}
