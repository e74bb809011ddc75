//! Ollama provider implementation for Aura
//!
//! Connects to a local or remote Ollama server to run the troubleshooting
//! conversation against a self-hosted model with tool calling support.

use crate::config::OllamaConfig;
use crate::error::{AuraError, Result};
use crate::providers::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use aura::config::OllamaConfig;
/// use aura::providers::{OllamaProvider, Provider, Message};
///
/// # async fn example() -> aura::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let messages = vec![Message::user("Hello!")];
/// let completion = provider.complete(&messages, &[]).await?;
/// let message = completion.message;
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Tool call in Ollama format; Ollama sends arguments as an object
#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "default_tool_type")]
    r#type: String,
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

fn default_tool_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::config::OllamaConfig;
    /// use aura::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("aura/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuraError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        validate_message_sequence(messages)
            .iter()
            .filter_map(|m| {
                if m.content.is_none() && m.tool_calls.is_none() {
                    return None;
                }

                let tool_calls = m.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|tc| OllamaToolCall {
                            id: tc.id.clone(),
                            r#type: default_tool_type(),
                            function: OllamaFunctionCall {
                                name: tc.function.name.clone(),
                                arguments: serde_json::from_str(&tc.function.arguments)
                                    .unwrap_or(serde_json::Value::Object(serde_json::Map::new())),
                            },
                        })
                        .collect()
                });

                Some(OllamaMessage {
                    role: m.role.clone(),
                    content: m.content.clone().unwrap_or_default(),
                    tool_calls,
                })
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<OllamaTool> {
        tools
            .iter()
            .filter_map(|t| {
                let obj = t.as_object()?;
                Some(OllamaTool {
                    r#type: default_tool_type(),
                    function: OllamaFunction {
                        name: obj.get("name")?.as_str()?.to_string(),
                        description: obj.get("description")?.as_str()?.to_string(),
                        parameters: obj.get("parameters")?.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_response_message(&self, ollama_msg: OllamaMessage) -> Message {
        match ollama_msg.tool_calls {
            Some(tool_calls) if !tool_calls.is_empty() => {
                let converted: Vec<ToolCall> = tool_calls
                    .into_iter()
                    .enumerate()
                    .map(|(idx, tc)| ToolCall {
                        // Ollama frequently omits call ids
                        id: if tc.id.is_empty() {
                            format!("call_{}_{}", uuid::Uuid::new_v4().simple(), idx)
                        } else {
                            tc.id
                        },
                        function: FunctionCall {
                            name: tc.function.name,
                            arguments: if tc.function.arguments.is_null() {
                                "{}".to_string()
                            } else {
                                tc.function.arguments.to_string()
                            },
                        },
                    })
                    .collect();
                Message::assistant_with_tools(converted)
            }
            _ => Message::assistant(ollama_msg.content),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));

        let ollama_request = OllamaRequest {
            model: self.config.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request: {} messages, {} tools",
            ollama_request.messages.len(),
            ollama_request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                AuraError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(AuraError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            AuraError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let message = self.convert_response_message(ollama_response.message);

        let response = if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            let usage = TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            );
            CompletionResponse::with_usage(message, usage)
        } else {
            CompletionResponse::new(message)
        };

        Ok(response)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.config.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OllamaProvider {
        OllamaProvider::new(OllamaConfig {
            host: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_ollama_provider_accessors() {
        let provider = provider();
        assert_eq!(provider.host(), "http://localhost:11434");
        assert_eq!(provider.model(), "llama3.2:latest");
        assert_eq!(provider.get_current_model().unwrap(), "llama3.2:latest");
    }

    #[test]
    fn test_convert_messages_basic() {
        let messages = vec![
            Message::system("You are Aura"),
            Message::user("My robot vacuum is weak"),
            Message::assistant("Let me look that up"),
        ];

        let ollama_messages = provider().convert_messages(&messages);
        assert_eq!(ollama_messages.len(), 3);
        assert_eq!(ollama_messages[0].role, "system");
        assert_eq!(ollama_messages[1].role, "user");
        assert_eq!(ollama_messages[2].role, "assistant");
    }

    #[test]
    fn test_convert_messages_parses_arguments_into_objects() {
        let call = ToolCall::new(
            "call_123",
            "get_device_error_logs",
            serde_json::json!({"device_id": "AURA-7", "limit": 5}),
        );
        let ollama_messages = provider().convert_messages(&[Message::assistant_with_tools(vec![call])]);

        let calls = ollama_messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments["limit"], 5);
    }

    #[test]
    fn test_convert_messages_filters_empty() {
        let mut empty = Message::user("");
        empty.content = None;
        let ollama_messages = provider().convert_messages(&[empty, Message::user("Valid message")]);
        assert_eq!(ollama_messages.len(), 1);
        assert_eq!(ollama_messages[0].content, "Valid message");
    }

    #[test]
    fn test_convert_tools() {
        let tools = vec![serde_json::json!({
            "name": "check_device_connectivity",
            "description": "Check whether a device is online",
            "parameters": {
                "type": "object",
                "properties": {"device_id": {"type": "string"}}
            }
        })];

        let ollama_tools = provider().convert_tools(&tools);
        assert_eq!(ollama_tools.len(), 1);
        assert_eq!(ollama_tools[0].function.name, "check_device_connectivity");
    }

    #[test]
    fn test_convert_response_message_text() {
        let msg = provider().convert_response_message(OllamaMessage {
            role: "assistant".to_string(),
            content: "Clean the filter.".to_string(),
            tool_calls: None,
        });
        assert_eq!(msg.content, Some("Clean the filter.".to_string()));
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn test_convert_response_message_generates_missing_ids() {
        let msg = provider().convert_response_message(OllamaMessage {
            role: "assistant".to_string(),
            content: String::new(),
            tool_calls: Some(vec![OllamaToolCall {
                id: String::new(),
                r#type: "function".to_string(),
                function: OllamaFunctionCall {
                    name: "search_troubleshooting_guides".to_string(),
                    arguments: serde_json::json!({"query": "E-401"}),
                },
            }]),
        });

        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].id.starts_with("call_"));
        assert_eq!(calls[0].function.arguments, r#"{"query":"E-401"}"#);
    }

    #[test]
    fn test_convert_messages_drops_orphan_tool() {
        let messages = vec![
            Message::user("Do something"),
            Message::tool_result("call_123", "Result"),
        ];
        let converted = provider().convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
    }
}
