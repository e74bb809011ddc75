//! Tools module for Aura
//!
//! This module contains the tool registry and the three diagnostic tools
//! the assistant can call: device connectivity, device error logs and the
//! troubleshooting guide search.

pub mod connectivity;
pub mod error_logs;
pub mod registry_builder;
pub mod search_guides;

pub use connectivity::ConnectivityTool;
pub use error_logs::ErrorLogsTool;
pub use registry_builder::build_registry;
pub use search_guides::SearchGuidesTool;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Longest device id the simulated fleet accepts
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// Tool result structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
    /// Whether the output was truncated
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            truncated: false,
        }
    }

    /// Truncate output if it exceeds `max_size` bytes
    ///
    /// The cut is moved back to the nearest character boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::tools::ToolResult;
    ///
    /// let result = ToolResult::success("Status: ONLINE").truncate_if_needed(6);
    /// assert!(result.truncated);
    /// assert!(result.output.starts_with("Status"));
    /// ```
    pub fn truncate_if_needed(mut self, max_size: usize) -> Self {
        if self.output.len() > max_size {
            let mut cut = max_size;
            while !self.output.is_char_boundary(cut) {
                cut -= 1;
            }
            self.output.truncate(cut);
            self.output.push_str("\n... (truncated)");
            self.truncated = true;
        }
        self
    }

    /// Text placed in the conversation as the tool turn
    pub fn to_message(&self) -> String {
        if self.success {
            return self.output.clone();
        }
        match self.error.as_deref() {
            Some(error) if error.starts_with("Error") => error.to_string(),
            Some(error) => format!("Error: {}", error),
            None => "Error: Unknown error".to_string(),
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```
/// use aura::tools::{ToolExecutor, ToolResult};
/// use aura::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Ping;
///
/// #[async_trait]
/// impl ToolExecutor for Ping {
///     fn tool_definition(&self) -> Value {
///         serde_json::json!({
///             "name": "ping",
///             "description": "Answers pong",
///             "parameters": {"type": "object", "properties": {}}
///         })
///     }
///
///     async fn execute(&self, _args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success("pong"))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition (`name`, `description`, `parameters`
    /// JSON schema) in the OpenAI function calling format
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// Expected failures (bad device id, empty search) are reported as a
    /// failed `ToolResult`; `Err` is reserved for unexpected faults.
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Tool registry for managing available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool executor under `name`
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(name.into(), executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// All tool definitions, ordered by tool name
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Validate a device id argument, returning the trimmed id
///
/// # Examples
///
/// ```
/// use aura::tools::validate_device_id;
///
/// assert_eq!(validate_device_id(" AURA-1 "), Some("AURA-1"));
/// assert_eq!(validate_device_id(""), None);
/// assert_eq!(validate_device_id("rm -rf /"), None);
/// ```
pub fn validate_device_id(raw: &str) -> Option<&str> {
    let id = raw.trim();
    let mut chars = id.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'));
    if valid_start && valid_rest && id.len() <= MAX_DEVICE_ID_LEN {
        Some(id)
    } else {
        None
    }
}

/// Read the `device_id` argument of a device tool
pub(crate) fn device_id_arg(args: &serde_json::Value) -> std::result::Result<String, ToolResult> {
    let raw = args
        .get("device_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    validate_device_id(raw)
        .map(str::to_string)
        .ok_or_else(|| ToolResult::error(format!("Device not found: '{}'", raw)))
}
