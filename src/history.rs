//! Conversation history manager
//!
//! Wraps the session store with the policies the chat surfaces rely on:
//! a bounded conversation window, strictly increasing timestamps, and
//! reads that degrade to "no history" instead of failing a turn.

use crate::error::Result;
use crate::prompts::default_title;
use crate::providers::Message;
use crate::storage::{SqliteStorage, StoredSession};

/// Loads, saves and manages chat sessions for one store
#[derive(Debug, Clone)]
pub struct HistoryManager {
    storage: SqliteStorage,
    window: usize,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl HistoryManager {
    /// Create a manager over `storage` with a conversation window of
    /// `window` messages
    pub fn new(storage: SqliteStorage, window: usize) -> Self {
        Self { storage, window }
    }

    /// The underlying store
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Configured conversation window size
    pub fn window(&self) -> usize {
        self.window
    }

    /// Most recent `limit` messages of a session, oldest first
    ///
    /// A store failure is logged and yields an empty history.
    pub fn load(&self, user_id: &str, session_id: &str, limit: usize) -> Vec<Message> {
        match self.storage.load_messages(user_id, session_id, limit) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    session_id,
                    "Failed to load history, continuing without it: {:#}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// The conversation window handed to the reasoning loop
    pub fn prepare_context(&self, user_id: &str, session_id: &str) -> Vec<Message> {
        self.load(user_id, session_id, self.window)
    }

    /// Append messages to a session
    ///
    /// The whole batch is written atomically; on failure nothing is stored
    /// and the error is returned for the caller to log.
    pub fn save(&self, user_id: &str, session_id: &str, messages: &[Message]) -> Result<Vec<i64>> {
        let stamps = self
            .storage
            .append_messages(user_id, session_id, messages, now_ms())?;
        tracing::debug!(
            user_id,
            session_id,
            "Saved {} messages to history",
            stamps.len()
        );
        Ok(stamps)
    }

    /// Allocate a new session id and record it
    ///
    /// The id is returned even if the record cannot be written; the
    /// session row is then created by the first saved message.
    pub fn new_session(&self, user_id: &str, title: Option<&str>) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let title = title
            .map(str::to_string)
            .unwrap_or_else(default_title);

        if let Err(e) = self
            .storage
            .create_session(user_id, &session_id, &title, now_ms())
        {
            tracing::warn!(user_id, session_id, "Failed to record new session: {:#}", e);
        } else {
            tracing::info!(user_id, session_id, "Created session '{}'", title);
        }
        session_id
    }

    /// Session summaries, most recent first; empty on store failure
    pub fn list_sessions(&self, user_id: &str, limit: usize) -> Vec<StoredSession> {
        match self.storage.list_sessions(user_id, limit) {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(user_id, "Failed to list sessions: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Look up one session; `None` when missing or on store failure
    pub fn session(&self, user_id: &str, session_id: &str) -> Option<StoredSession> {
        match self.storage.get_session(user_id, session_id) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(user_id, session_id, "Failed to read session: {:#}", e);
                None
            }
        }
    }

    /// Purge a session and its messages, returning the messages removed
    pub fn delete_session(&self, user_id: &str, session_id: &str) -> Result<usize> {
        let removed = self.storage.delete_session(user_id, session_id)?;
        tracing::info!(user_id, session_id, "Deleted session ({} messages)", removed);
        Ok(removed)
    }
}
