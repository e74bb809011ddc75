//! Test utilities for Aura
//!
//! Scripted collaborators for unit tests: a chat provider that replays
//! canned replies, an embedder that hashes words into a small vector,
//! and helpers for throwaway stores.

use crate::embeddings::Embedder;
use crate::error::{AuraError, Result};
use crate::providers::{CompletionResponse, FunctionCall, Message, Provider, ToolCall};
use crate::storage::SqliteStorage;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

enum Script {
    Queue(VecDeque<Message>),
    Repeat(Message),
    Fail(String),
}

/// Provider that replays a fixed script of assistant messages
///
/// Once a queue is exhausted it answers "Done".
pub struct ScriptedProvider {
    script: Mutex<Script>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Replay `replies` in order
    pub fn new(replies: Vec<Message>) -> Self {
        Self::with_script(Script::Queue(replies.into()))
    }

    /// Answer every call with `reply`
    pub fn repeating(reply: Message) -> Self {
        Self::with_script(Script::Repeat(reply))
    }

    /// Fail every call with a provider error
    pub fn failing(reason: &str) -> Self {
        Self::with_script(Script::Fail(reason.to_string()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every message list the provider received
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = match &mut *self.script.lock().unwrap() {
            Script::Queue(queue) => queue
                .pop_front()
                .unwrap_or_else(|| Message::assistant("Done")),
            Script::Repeat(reply) => reply.clone(),
            Script::Fail(reason) => return Err(AuraError::Provider(reason.clone()).into()),
        };
        Ok(CompletionResponse::new(reply))
    }

    fn get_current_model(&self) -> Result<String> {
        Ok("scripted".to_string())
    }
}

/// Assistant message requesting `(id, name, raw arguments)` calls
pub fn tool_call_message(calls: &[(&str, &str, &str)]) -> Message {
    Message::assistant_with_tools(
        calls
            .iter()
            .map(|(id, name, arguments)| ToolCall {
                id: id.to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            })
            .collect(),
    )
}

/// Embedder mapping each word to one of `dim` buckets
pub struct HashEmbedder {
    /// Output dimension
    pub dim: usize,
}

impl HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dim];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[bucket % self.dim] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn model_name(&self) -> String {
        "hash".to_string()
    }
}

/// A fresh store inside a temporary directory
///
/// Dropping the directory makes the store unreachable, which is how tests
/// simulate an outage.
pub fn temp_storage() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
    (storage, dir)
}
