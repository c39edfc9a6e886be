//! Per-session conversation state.
//!
//! A session exists for the lifetime of the process only — no persistence.
//! Each session owns the last continuation token returned by the structured
//! backend; the semantic backend is stateless and has no entry here.
//!
//! Each session's state sits behind its own async mutex, so a session has a
//! single writer by construction while separate sessions proceed
//! independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

/// Multi-turn context for one session.
#[derive(Debug, Default)]
pub struct ConversationState {
    /// Last continuation token returned by the structured backend.
    /// `None` before the first structured call of the session.
    pub structured_token: Option<String>,
}

/// Process-scoped registry of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<ConversationState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session by id, creating it on first use. With no id, a
    /// fresh session is allocated under a new v4 uuid.
    ///
    /// Returns the (possibly new) session id and a handle to its state.
    pub async fn resolve(
        &self,
        session_id: Option<&str>,
    ) -> (String, Arc<Mutex<ConversationState>>) {
        let id = match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut sessions = self.sessions.lock().await;
        let state = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::default())))
            .clone();

        (id, state)
    }

    /// Ids of all live sessions — no private data.
    pub async fn ids(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_id_allocates_fresh_session() {
        let store = SessionStore::new();
        let (id, state) = store.resolve(None).await;
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(state.lock().await.structured_token.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn known_id_resumes_same_state() {
        let store = SessionStore::new();
        let (id, state) = store.resolve(None).await;
        state.lock().await.structured_token = Some("conv-1".into());

        let (same_id, resumed) = store.resolve(Some(&id)).await;
        assert_eq!(same_id, id);
        assert_eq!(resumed.lock().await.structured_token.as_deref(), Some("conv-1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn blank_id_is_treated_as_missing() {
        let store = SessionStore::new();
        let (id, _) = store.resolve(Some("   ")).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn ids_lists_live_sessions() {
        let store = SessionStore::new();
        let (a, _) = store.resolve(None).await;
        let (b, _) = store.resolve(None).await;
        let mut ids = store.ids().await;
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
