use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use aura::agent::{Agent, ChatService};
use aura::config::AgentConfig;
use aura::knowledge::Retriever;
use aura::providers::{Message, Provider, ToolCall};
use aura::storage::{ChunkHit, SqliteStorage};
use aura::tools::{ConnectivityTool, ErrorLogsTool, SearchGuidesTool, ToolRegistry};
use aura::HistoryManager;

#[allow(unused_imports)]
pub use aura::test_utils::{HashEmbedder, ScriptedProvider};

/// Assistant message requesting one tool call
#[allow(dead_code)]
pub fn tool_request(id: &str, name: &str, args: serde_json::Value) -> Message {
    Message::assistant_with_tools(vec![ToolCall::new(id, name, args)])
}

/// Retriever that always returns the same hits and records queries
#[allow(dead_code)]
#[derive(Default)]
pub struct FixedRetriever {
    pub hits: Vec<ChunkHit>,
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> aura::Result<Vec<ChunkHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("aura.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

/// Registry with all three assistant tools, guide search backed by `retriever`
#[allow(dead_code)]
pub fn full_registry(retriever: Arc<dyn Retriever>) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(
        "search_troubleshooting_guides",
        Arc::new(SearchGuidesTool::with_retriever(retriever, 3)),
    );
    tools.register("check_device_connectivity", Arc::new(ConnectivityTool));
    tools.register(
        "get_device_error_logs",
        Arc::new(ErrorLogsTool::new(15).with_seed(7)),
    );
    tools
}

/// Chat service over `storage` with the given provider and tools
#[allow(dead_code)]
pub fn chat_service(
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    storage: SqliteStorage,
    window: usize,
) -> ChatService {
    let agent = Agent::new(provider, tools, &AgentConfig::default()).expect("valid agent config");
    ChatService::new(
        agent,
        HistoryManager::new(storage, window),
        Duration::from_secs(10),
    )
}
