//! Per-session conversation state and its store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;

/// Session id used when the caller does not supply one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Named conversation stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    GetName,
    Chat,
    AskDuration,
    AskBooking,
    AskTime,
    EndConversation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::GetName => "get_name",
            Stage::Chat => "chat",
            Stage::AskDuration => "ask_duration",
            Stage::AskBooking => "ask_booking",
            Stage::AskTime => "ask_time",
            Stage::EndConversation => "end_conversation",
        }
    }
}

/// Mutable record for one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub name: Option<String>,
    pub stage: Stage,
    pub condition: Option<String>,
    /// Symptom duration in days
    pub duration: Option<i64>,
    pub symptoms: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the initial `GetName` state with every field cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Keyed storage for session state.
///
/// `get` returns a fresh state for unknown ids, so sessions are created on
/// first contact without an explicit call.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<SessionState>;

    async fn put(&self, session_id: &str, state: SessionState) -> Result<()>;

    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// Process-local session store.
///
/// Individual calls are atomic, but a get-then-put across two concurrent
/// requests for the same id can lose one of the updates.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<SessionState> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn put(&self, session_id: &str, state: SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), state);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }
}
