//! Troubleshooting guide search over the knowledge index

use crate::error::Result;
use crate::knowledge::Retriever;
use crate::storage::ChunkHit;
use crate::tools::{ToolExecutor, ToolResult};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Opens the retriever the first time a search runs
pub type RetrieverFactory = Arc<dyn Fn() -> Result<Arc<dyn Retriever>> + Send + Sync>;

/// Text returned when the search finds nothing
pub const NO_GUIDES_FOUND: &str = "No relevant troubleshooting guides found for this query.";

/// `search_troubleshooting_guides` tool
///
/// The backing index is opened on first use. A failed open is reported to
/// the model and retried on the next search; a successful one is kept.
pub struct SearchGuidesTool {
    factory: RetrieverFactory,
    retriever: OnceCell<Arc<dyn Retriever>>,
    top_k: usize,
}

impl SearchGuidesTool {
    /// Create a tool that opens its retriever lazily through `factory`
    pub fn new(factory: RetrieverFactory, top_k: usize) -> Self {
        Self {
            factory,
            retriever: OnceCell::new(),
            top_k,
        }
    }

    /// Create a tool around an already opened retriever
    pub fn with_retriever(retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        let factory_handle = Arc::clone(&retriever);
        Self {
            factory: Arc::new(move || Ok(Arc::clone(&factory_handle))),
            retriever: OnceCell::new_with(Some(retriever)),
            top_k,
        }
    }

    /// Whether the retriever has been opened
    pub fn is_open(&self) -> bool {
        self.retriever.initialized()
    }

    async fn search(&self, query: &str) -> Result<Vec<ChunkHit>> {
        let retriever = self
            .retriever
            .get_or_try_init(|| async { (self.factory)() })
            .await?;
        retriever.retrieve(query, self.top_k).await
    }
}

/// Render search hits as `Source:` / `Content:` blocks
pub fn format_hits(hits: &[ChunkHit]) -> String {
    if hits.is_empty() {
        return NO_GUIDES_FOUND.to_string();
    }

    hits.iter()
        .map(|hit| {
            let mut block = format!("Source: {}\nContent: {}", hit.source, hit.text);
            if !hit.image_paths.is_empty() {
                block.push_str(&format!("\nImages: {}", hit.image_paths.join(", ")));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl ToolExecutor for SearchGuidesTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "search_troubleshooting_guides",
            "description": "Searches the knowledge base for troubleshooting guides and documentation \
                related to IoT device issues. Use this tool when the user mentions error codes, \
                device problems, or needs step-by-step troubleshooting instructions.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query describing the problem or error code"
                    }
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or_default();
        if query.is_empty() {
            return Ok(ToolResult::error("Missing required argument 'query'"));
        }

        tracing::info!(query, "Searching troubleshooting guides");
        match self.search(query).await {
            Ok(hits) => Ok(ToolResult::success(format_hits(&hits))),
            Err(e) => {
                tracing::warn!(query, "Knowledge search failed: {:#}", e);
                Ok(ToolResult::error(format!(
                    "Error searching knowledge base: {}. Please try rephrasing your query.",
                    e
                )))
            }
        }
    }
}
