//! Base provider trait and common types for Aura
//!
//! This module defines the Provider trait that chat model backends
//! implement, along with the message and tool-call types shared by the
//! reasoning loop, the history manager and the web UI.

use crate::error::{AuraError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for conversation
///
/// Represents one turn of a conversation: user input, an assistant reply
/// (optionally carrying tool-call requests), a tool result, or the system
/// prompt. `timestamp` is set once the message has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system, tool)
    pub role: String,
    /// Content of the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Optional tool calls in the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Optional tool call ID (for tool result messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Epoch milliseconds assigned by the session store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Free-form metadata persisted with the message (never sent to models)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    fn with_role(role: &str, content: Option<String>) -> Self {
        Self {
            role: role.to_string(),
            content,
            tool_calls: None,
            tool_call_id: None,
            timestamp: None,
            metadata: None,
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::providers::Message;
    ///
    /// let msg = Message::user("My vacuum shows E-401");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", Some(content.into()))
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::providers::Message;
    ///
    /// let msg = Message::assistant("Let me check the guides.");
    /// assert_eq!(msg.role, "assistant");
    /// assert!(!msg.has_tool_calls());
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", Some(content.into()))
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", Some(content.into()))
    }

    /// Creates a new tool result message
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::providers::Message;
    ///
    /// let msg = Message::tool_result("call_123", "Status: ONLINE");
    /// assert_eq!(msg.role, "tool");
    /// assert_eq!(msg.tool_call_id, Some("call_123".to_string()));
    /// ```
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role("tool", Some(content.into()))
        }
    }

    /// Creates an assistant message with tool calls and no text
    pub fn assistant_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role("assistant", None)
        }
    }

    /// Returns true when the message requests at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|calls| !calls.is_empty())
            .unwrap_or(false)
    }

    /// Attach metadata to the message
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns true when the message was recorded as a failed turn
    pub fn is_error(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("error"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Text content, or an empty string when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Function call details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,
    /// Arguments as a JSON string
    pub arguments: String,
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier echoed back on the tool result
    pub id: String,
    /// Function call details
    pub function: FunctionCall,
}

impl ToolCall {
    /// Build a tool call from a name and JSON arguments
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::providers::ToolCall;
    ///
    /// let call = ToolCall::new("call_1", "check_device_connectivity",
    ///     serde_json::json!({"device_id": "AURA-1"}));
    /// assert_eq!(call.function.arguments, r#"{"device_id":"AURA-1"}"#);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            function: FunctionCall {
                name: name.into(),
                arguments: args.to_string(),
            },
        }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The assistant message
    pub message: Message,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a response without usage information
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Create a response with usage information
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }
}

/// Chat model provider
///
/// # Examples
///
/// ```
/// use aura::error::Result;
/// use aura::providers::{CompletionResponse, Message, Provider};
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(
///         &self,
///         messages: &[Message],
///         _tools: &[serde_json::Value],
///     ) -> Result<CompletionResponse> {
///         let last = messages.last().map(|m| m.text().to_string()).unwrap_or_default();
///         Ok(CompletionResponse::new(Message::assistant(last)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Complete a conversation
    ///
    /// # Arguments
    ///
    /// * `messages` - Conversation so far, system prompt first
    /// * `tools` - Tool definitions (`name`, `description`, `parameters`)
    ///
    /// # Errors
    ///
    /// Returns `AuraError::Provider` when the backend is unreachable or
    /// answers with something that cannot be interpreted
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse>;

    /// Name of the model or deployment in use
    ///
    /// The default implementation reports that the provider does not expose it.
    fn get_current_model(&self) -> Result<String> {
        Err(AuraError::Provider("Provider does not report its model".to_string()).into())
    }
}

/// Validates message sequence and removes orphan tool messages
///
/// A windowed history can start in the middle of a tool exchange; chat
/// APIs reject tool results whose originating assistant message is
/// missing, so those results are dropped here with a warning.
///
/// # Examples
///
/// ```
/// use aura::providers::{Message, validate_message_sequence};
///
/// let messages = vec![
///     Message::tool_result("call_123", "Result"),
///     Message::user("Still broken"),
/// ];
/// let validated = validate_message_sequence(&messages);
/// assert_eq!(validated.len(), 1);
/// ```
pub fn validate_message_sequence(messages: &[Message]) -> Vec<Message> {
    use std::collections::HashSet;

    let mut valid_tool_ids: HashSet<&str> = HashSet::new();
    let mut validated = Vec::with_capacity(messages.len());

    for message in messages {
        if message.role == "tool" {
            match message.tool_call_id.as_deref() {
                Some(id) if valid_tool_ids.contains(id) => validated.push(message.clone()),
                Some(id) => {
                    tracing::warn!("Dropping orphan tool message for call id {}", id);
                }
                None => {
                    tracing::warn!("Dropping tool message without tool_call_id");
                }
            }
            continue;
        }

        if let Some(calls) = &message.tool_calls {
            for call in calls {
                valid_tool_ids.insert(call.id.as_str());
            }
        }
        validated.push(message.clone());
    }

    validated
}
