//! Tool registry builder
//!
//! Assembles the diagnostic tool set handed to the reasoning loop. The
//! knowledge retriever is injected as a factory so the index is only
//! opened when the model first searches it.

use std::sync::Arc;

use crate::config::{Config, ToolsConfig};
use crate::error::Result;
use crate::knowledge::{KnowledgeRetriever, Retriever};
use crate::tools::search_guides::RetrieverFactory;
use crate::tools::{ConnectivityTool, ErrorLogsTool, SearchGuidesTool, ToolRegistry};

/// Builder for the assistant's tool registry
///
/// # Examples
///
/// ```
/// use aura::config::ToolsConfig;
/// use aura::knowledge::Retriever;
/// use aura::tools::registry_builder::ToolRegistryBuilder;
/// use std::sync::Arc;
///
/// let factory = Arc::new(|| -> aura::Result<Arc<dyn Retriever>> {
///     Err(anyhow::anyhow!("no index"))
/// });
/// let registry = ToolRegistryBuilder::new(ToolsConfig::default(), factory).build();
/// assert_eq!(registry.len(), 3);
/// ```
pub struct ToolRegistryBuilder {
    tools_config: ToolsConfig,
    retriever_factory: RetrieverFactory,
    log_seed: Option<u64>,
}

impl ToolRegistryBuilder {
    /// Create a builder using `retriever_factory` for the guide search
    pub fn new(tools_config: ToolsConfig, retriever_factory: RetrieverFactory) -> Self {
        Self {
            tools_config,
            retriever_factory,
            log_seed: None,
        }
    }

    /// Seed the simulated error logs
    pub fn with_log_seed(mut self, seed: u64) -> Self {
        self.log_seed = Some(seed);
        self
    }

    /// Build the registry with all three tools
    pub fn build(self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();

        registry.register("check_device_connectivity", Arc::new(ConnectivityTool));

        let mut logs = ErrorLogsTool::new(self.tools_config.max_log_entries);
        if let Some(seed) = self.log_seed {
            logs = logs.with_seed(seed);
        }
        registry.register("get_device_error_logs", Arc::new(logs));

        registry.register(
            "search_troubleshooting_guides",
            Arc::new(SearchGuidesTool::new(
                self.retriever_factory,
                self.tools_config.search_top_k,
            )),
        );

        tracing::debug!(tools = ?registry.names(), "Built tool registry");
        registry
    }
}

/// Factory opening the configured knowledge index
pub fn knowledge_factory(config: Arc<Config>) -> RetrieverFactory {
    Arc::new(move || -> Result<Arc<dyn Retriever>> {
        let retriever = KnowledgeRetriever::open(&config)?;
        Ok(Arc::new(retriever) as Arc<dyn Retriever>)
    })
}

/// Build the tool registry for `config`, searching the configured index
pub fn build_registry(config: Arc<Config>) -> ToolRegistry {
    ToolRegistryBuilder::new(config.agent.tools.clone(), knowledge_factory(config)).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_factory() -> RetrieverFactory {
        Arc::new(|| -> crate::error::Result<Arc<dyn Retriever>> {
            Err(anyhow::anyhow!("index unavailable"))
        })
    }

    #[test]
    fn test_registry_contains_three_tools() {
        let registry = ToolRegistryBuilder::new(ToolsConfig::default(), failing_factory()).build();
        assert_eq!(
            registry.names(),
            vec![
                "check_device_connectivity",
                "get_device_error_logs",
                "search_troubleshooting_guides"
            ]
        );
    }

    #[test]
    fn test_definitions_match_registered_names() {
        let registry = ToolRegistryBuilder::new(ToolsConfig::default(), failing_factory()).build();
        for def in registry.all_definitions() {
            let name = def["name"].as_str().unwrap();
            assert!(registry.get(name).is_some());
            assert_eq!(def["parameters"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_log_cap_follows_config() {
        let tools_config = ToolsConfig {
            max_log_entries: 2,
            ..ToolsConfig::default()
        };
        let registry = ToolRegistryBuilder::new(tools_config, failing_factory())
            .with_log_seed(5)
            .build();
        let result = registry
            .get("get_device_error_logs")
            .unwrap()
            .execute(serde_json::json!({"device_id": "AURA-1", "limit": 10}))
            .await
            .unwrap();
        assert!(result.output.contains("Total Entries: 2"));
    }

    #[tokio::test]
    async fn test_search_on_empty_index_reports_no_guides() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.provider.provider_type = "ollama".to_string();
        config.storage.db_path = Some(dir.path().join("aura.db"));

        let registry = build_registry(Arc::new(config));
        let result = registry
            .get("search_troubleshooting_guides")
            .unwrap()
            .execute(serde_json::json!({"query": "E-401"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.output,
            crate::tools::search_guides::NO_GUIDES_FOUND
        );
    }

    #[tokio::test]
    async fn test_search_failure_is_in_band() {
        let registry = ToolRegistryBuilder::new(ToolsConfig::default(), failing_factory()).build();
        let result = registry
            .get("search_troubleshooting_guides")
            .unwrap()
            .execute(serde_json::json!({"query": "E-401"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("index unavailable"));
    }
}
