//! Chat service: one conversation turn, end to end
//!
//! Loads the conversation window, runs the reasoning loop under the turn
//! budget and persists the new messages. Turns on the same session are
//! serialized; different sessions never wait on each other.

use crate::agent::{Agent, AgentState};
use crate::config::Config;
use crate::error::{AuraError, Result};
use crate::history::HistoryManager;
use crate::prompts::ANSWER_UNAVAILABLE;
use crate::providers::{create_provider, Message, Provider};
use crate::storage::SqliteStorage;
use crate::tools::build_registry;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// Result of one conversation turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text shown to the user
    pub answer: String,
    /// Whether the turn failed and `answer` is the fallback text
    pub degraded: bool,
    /// Messages produced by the turn, starting with the user message
    pub messages: Vec<Message>,
    /// Whether the messages were written to the store
    pub persisted: bool,
}

/// Runs conversation turns against one store and one agent
pub struct ChatService {
    agent: Arc<Agent>,
    history: HistoryManager,
    turn_timeout: Duration,
    session_locks: Mutex<HashMap<(String, String), Arc<AsyncMutex<()>>>>,
}

impl ChatService {
    /// Create a service from its collaborators
    pub fn new(agent: Agent, history: HistoryManager, turn_timeout: Duration) -> Self {
        Self {
            agent: Arc::new(agent),
            history,
            turn_timeout,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the chat provider, tools, store and agent named by `config`
    ///
    /// # Errors
    ///
    /// Fails if the provider is misconfigured or the store cannot be opened
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::from(create_provider(
            &config.provider.provider_type,
            &config.provider,
        )?);
        let storage = SqliteStorage::open(&config.storage)?;
        let history = HistoryManager::new(storage, config.agent.history_window);
        let agent = Agent::new(provider, build_registry(Arc::clone(&config)), &config.agent)?;
        Ok(Self::new(
            agent,
            history,
            Duration::from_secs(config.agent.turn_timeout_seconds),
        ))
    }

    /// The history manager used for every turn
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    fn session_lock(&self, user_id: &str, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry((user_id.to_string(), session_id.to_string()))
                .or_default(),
        )
    }

    /// Run one turn for `text` and persist the result
    ///
    /// Never fails: model errors, an exhausted step budget and the turn
    /// timeout produce a degraded answer, and a failed write is logged and
    /// reported through [`TurnOutcome::persisted`].
    pub async fn send(&self, user_id: &str, session_id: &str, text: &str) -> TurnOutcome {
        let lock = self.session_lock(user_id, session_id);
        let _guard = lock.lock().await;

        let mut history = self.history.prepare_context(user_id, session_id);
        let context_len = history.len();
        let user_message = Message::user(text);
        history.push(user_message.clone());
        let state = AgentState::new(history, user_id, session_id);

        let run = tokio::time::timeout(self.turn_timeout, self.agent.run(state)).await;
        let failure = match run {
            Ok(Ok(state)) => {
                let messages = state.history[context_len..].to_vec();
                return self.finish(user_id, session_id, messages, false);
            }
            Ok(Err(e)) => e,
            Err(_) => AuraError::TurnTimeout {
                seconds: self.turn_timeout.as_secs(),
            }
            .into(),
        };

        tracing::error!(user_id, session_id, "Turn failed: {:#}", failure);
        let fallback =
            Message::assistant(ANSWER_UNAVAILABLE).with_metadata(serde_json::json!({"error": true}));
        self.finish(user_id, session_id, vec![user_message, fallback], true)
    }

    fn finish(
        &self,
        user_id: &str,
        session_id: &str,
        messages: Vec<Message>,
        degraded: bool,
    ) -> TurnOutcome {
        let answer = messages
            .last()
            .map(|m| m.text().to_string())
            .unwrap_or_default();

        let persisted = match self.history.save(user_id, session_id, &messages) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(user_id, session_id, "Failed to persist turn: {:#}", e);
                false
            }
        };

        TurnOutcome {
            answer,
            degraded,
            messages,
            persisted,
        }
    }
}
