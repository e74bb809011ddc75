//! Azure OpenAI chat provider for Aura
//!
//! Calls the Azure OpenAI chat completions endpoint of a deployment with
//! function-calling tool definitions and maps the reply back into Aura's
//! message types.

use crate::config::AzureOpenAiConfig;
use crate::error::{AuraError, Result};
use crate::providers::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Azure OpenAI chat completions provider
///
/// # Examples
///
/// ```no_run
/// use aura::config::AzureOpenAiConfig;
/// use aura::providers::{AzureOpenAiProvider, Message, Provider};
///
/// # async fn example() -> aura::error::Result<()> {
/// let config = AzureOpenAiConfig {
///     endpoint: "https://my-resource.openai.azure.com".to_string(),
///     api_key: Some("key".to_string()),
///     chat_deployment: "gpt-4o".to_string(),
///     ..Default::default()
/// };
/// let provider = AzureOpenAiProvider::new(config)?;
/// let completion = provider.complete(&[Message::user("Hello!")], &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    kind: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    kind: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

fn default_tool_type() -> String {
    "function".to_string()
}

impl AzureOpenAiProvider {
    /// Create a new Azure OpenAI provider
    ///
    /// # Errors
    ///
    /// Returns `AuraError::MissingCredentials` when the endpoint, API key or
    /// chat deployment is not configured, and `AuraError::Provider` if the
    /// HTTP client cannot be built
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let api_key = require_credentials(&config, &config.chat_deployment, "chat deployment")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("aura/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuraError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Azure OpenAI provider: endpoint={}, deployment={}",
            config.endpoint,
            config.chat_deployment
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.chat_deployment,
            self.config.api_version
        )
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<ChatMessage> {
        validate_message_sequence(messages)
            .into_iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
                tool_calls: m.tool_calls.map(|calls| {
                    calls
                        .into_iter()
                        .map(|tc| ChatToolCall {
                            id: tc.id,
                            kind: default_tool_type(),
                            function: ChatFunctionCall {
                                name: tc.function.name,
                                arguments: tc.function.arguments,
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id,
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<ChatTool> {
        tools
            .iter()
            .filter_map(|t| {
                let obj = t.as_object()?;
                Some(ChatTool {
                    kind: default_tool_type(),
                    function: ChatFunction {
                        name: obj.get("name")?.as_str()?.to_string(),
                        description: obj.get("description")?.as_str()?.to_string(),
                        parameters: obj.get("parameters")?.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_response_message(&self, chat_msg: ChatMessage) -> Message {
        let tool_calls: Vec<ToolCall> = chat_msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                function: FunctionCall {
                    name: tc.function.name,
                    arguments: if tc.function.arguments.is_empty() {
                        "{}".to_string()
                    } else {
                        tc.function.arguments
                    },
                },
            })
            .collect();

        let mut message = Message::assistant(chat_msg.content.unwrap_or_default());
        if !tool_calls.is_empty() {
            message.tool_calls = Some(tool_calls);
        }
        message
    }
}

/// Check the shared Azure credentials plus one deployment name
pub(crate) fn require_credentials(
    config: &AzureOpenAiConfig,
    deployment: &str,
    deployment_label: &str,
) -> Result<String> {
    let mut missing = Vec::new();
    if config.endpoint.trim().is_empty() {
        missing.push("endpoint (AZURE_OPENAI_ENDPOINT)".to_string());
    }
    let api_key = config.api_key.clone().unwrap_or_default();
    if api_key.trim().is_empty() {
        missing.push("api key (AZURE_OPENAI_API_KEY)".to_string());
    }
    if deployment.trim().is_empty() {
        missing.push(deployment_label.to_string());
    }

    if missing.is_empty() {
        Ok(api_key)
    } else {
        Err(AuraError::MissingCredentials(format!("azure: {}", missing.join(", "))).into())
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = ChatRequest {
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            temperature: self.config.temperature,
        };

        tracing::debug!(
            "Sending Azure OpenAI request: {} messages, {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(self.chat_url())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Azure OpenAI request failed: {}", e);
                AuraError::Provider(format!("Azure OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Azure OpenAI returned error {}: {}", status, error_text);
            return Err(AuraError::Provider(format!(
                "Azure OpenAI returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Azure OpenAI response: {}", e);
            AuraError::Provider(format!("Failed to parse Azure OpenAI response: {}", e))
        })?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AuraError::Provider("Azure OpenAI returned no choices".to_string()))?;

        tracing::debug!("Azure OpenAI finish_reason={:?}", choice.finish_reason);

        let message = self.convert_response_message(choice.message);
        Ok(match chat_response.usage {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        })
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.config.chat_deployment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: Some("test-key".to_string()),
            chat_deployment: "gpt-4o".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let config = AzureOpenAiConfig::default();
        let err = AzureOpenAiProvider::new(config).err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("AZURE_OPENAI_ENDPOINT"));
        assert!(msg.contains("AZURE_OPENAI_API_KEY"));
        assert!(msg.contains("chat deployment"));
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let provider = AzureOpenAiProvider::new(test_config()).unwrap();
        assert_eq!(
            provider.chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_convert_messages_keeps_tool_call_ids() {
        let provider = AzureOpenAiProvider::new(test_config()).unwrap();
        let call = ToolCall::new(
            "call_1",
            "check_device_connectivity",
            serde_json::json!({"device_id": "AURA-1"}),
        );
        let messages = vec![
            Message::system("You are Aura"),
            Message::user("Is AURA-1 online?"),
            Message::assistant_with_tools(vec![call]),
            Message::tool_result("call_1", "Status: ONLINE"),
        ];

        let converted = provider.convert_messages(&messages);
        assert_eq!(converted.len(), 4);
        let calls = converted[2].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].kind, "function");
        assert_eq!(calls[0].function.arguments, r#"{"device_id":"AURA-1"}"#);
        assert_eq!(converted[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_convert_tools_wraps_function_definitions() {
        let provider = AzureOpenAiProvider::new(test_config()).unwrap();
        let tools = vec![
            serde_json::json!({
                "name": "search_troubleshooting_guides",
                "description": "Search guides",
                "parameters": {"type": "object", "properties": {}}
            }),
            serde_json::json!({"name": "missing_fields"}),
        ];

        let converted = provider.convert_tools(&tools);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].kind, "function");
        assert_eq!(converted[0].function.name, "search_troubleshooting_guides");
    }

    #[test]
    fn test_convert_response_message_with_empty_arguments() {
        let provider = AzureOpenAiProvider::new(test_config()).unwrap();
        let msg = provider.convert_response_message(ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![ChatToolCall {
                id: "call_9".to_string(),
                kind: "function".to_string(),
                function: ChatFunctionCall {
                    name: "get_device_error_logs".to_string(),
                    arguments: String::new(),
                },
            }]),
            tool_call_id: None,
        });

        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls.unwrap()[0].function.arguments, "{}");
    }

    #[test]
    fn test_get_current_model_is_deployment() {
        let provider = AzureOpenAiProvider::new(test_config()).unwrap();
        assert_eq!(provider.get_current_model().unwrap(), "gpt-4o");
    }
}
