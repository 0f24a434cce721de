//! Ephemeral per-user registration state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::{Priority, Role};

/// Progress through the sign-up conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStep {
    #[default]
    Name,
    Role,
    PrimaryFactory,
    PrimaryPriority,
    SecondFactoryChoice,
    SecondFactory,
    SecondPriority,
}

impl RegistrationStep {
    /// 1-based ordinal of this step in the conversation.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Name => 1,
            Self::Role => 2,
            Self::PrimaryFactory => 3,
            Self::PrimaryPriority => 4,
            Self::SecondFactoryChoice => 5,
            Self::SecondFactory => 6,
            Self::SecondPriority => 7,
        }
    }
}

/// Values accumulated step by step, committed only at finalisation.
#[derive(Debug, Clone, Default)]
pub struct TempFields {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub primary_factory: Option<String>,
    pub primary_priority: Option<Priority>,
    /// Factory choices offered at step 6, snapshotted when the user opts
    /// in to a second factory.
    pub options: Vec<String>,
    pub second_factory: Option<String>,
}

/// One user's in-flight registration conversation.
#[derive(Debug, Clone, Default)]
pub struct RegistrationSession {
    pub step: RegistrationStep,
    pub temp: TempFields,
}

/// Keyed, lock-guarded access to in-flight registration sessions.
///
/// Intentionally volatile: constructed at process start, never persisted.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Option<RegistrationSession>;
    async fn put(&self, user_id: &str, session: RegistrationSession);
    async fn clear(&self, user_id: &str);
}

/// In-memory implementation backing every deployment.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, RegistrationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Option<RegistrationSession> {
        let sessions = self.sessions.read().await;
        sessions.get(user_id).cloned()
    }

    async fn put(&self, user_id: &str, session: RegistrationSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id.to_string(), session);
    }

    async fn clear(&self, user_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_store_lifecycle() {
        tokio_test::block_on(async {
            let store = InMemorySessionStore::new();
            assert!(store.get("U1").await.is_none());

            store.put("U1", RegistrationSession::default()).await;
            let session = store.get("U1").await.expect("session stored");
            assert_eq!(session.step, RegistrationStep::Name);
            assert_eq!(session.step.ordinal(), 1);

            store.clear("U1").await;
            assert!(store.get("U1").await.is_none());
        });
    }

    #[test]
    fn test_step_ordinals_cover_one_to_seven() {
        let steps = [
            RegistrationStep::Name,
            RegistrationStep::Role,
            RegistrationStep::PrimaryFactory,
            RegistrationStep::PrimaryPriority,
            RegistrationStep::SecondFactoryChoice,
            RegistrationStep::SecondFactory,
            RegistrationStep::SecondPriority,
        ];
        let ordinals: Vec<u8> = steps.iter().map(|s| s.ordinal()).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
