//! Reasoning loop
//!
//! The loop alternates between two steps:
//! - REASON: call the model with the system prompt and the conversation
//! - ACT: run every tool the model asked for and append the results
//!
//! A model reply without tool calls ends the loop. The number of REASON
//! steps is bounded by `max_iterations`.

use crate::config::AgentConfig;
use crate::error::{AuraError, Result};
use crate::prompts::SYSTEM_PROMPT;
use crate::providers::{Message, Provider, ToolCall};
use crate::tools::ToolRegistry;

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A model reply, classified by whether it asks for tools
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// The reply is the answer for the user
    FinalAnswer(Message),
    /// The reply requests one or more tool calls
    ToolRequest {
        /// The assistant message carrying the calls
        message: Message,
        /// The requested calls, in request order
        calls: Vec<ToolCall>,
    },
}

impl ModelTurn {
    /// Classify a model reply
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::agent::ModelTurn;
    /// use aura::providers::Message;
    ///
    /// let turn = ModelTurn::classify(Message::assistant("Try restarting the device."));
    /// assert!(matches!(turn, ModelTurn::FinalAnswer(_)));
    /// ```
    pub fn classify(message: Message) -> Self {
        match message.tool_calls.clone() {
            Some(calls) if !calls.is_empty() => ModelTurn::ToolRequest { message, calls },
            _ => ModelTurn::FinalAnswer(message),
        }
    }
}

/// Input and output of one run of the loop
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Conversation so far, oldest first; never contains the system prompt
    pub history: Vec<Message>,
    /// Owner of the session
    pub user_id: String,
    /// Session the turn belongs to
    pub session_id: String,
}

impl AgentState {
    /// Create a state from a loaded conversation window
    pub fn new(history: Vec<Message>, user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            history,
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// The last message's text, if any
    pub fn last_text(&self) -> Option<&str> {
        self.history.last().map(Message::text)
    }
}

/// The reasoning loop with its collaborators
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    max_iterations: usize,
    max_output_size: usize,
    system_prompt: String,
}

impl Agent {
    /// Create an agent
    ///
    /// # Errors
    ///
    /// Returns `AuraError::Config` if `max_iterations` is outside 1..=1000
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, config: &AgentConfig) -> Result<Self> {
        if config.max_iterations == 0 || config.max_iterations > 1000 {
            return Err(AuraError::Config(
                "max_iterations must be between 1 and 1000".to_string(),
            )
            .into());
        }

        Ok(Self {
            provider,
            tools,
            max_iterations: config.max_iterations,
            max_output_size: config.tools.max_output_size,
            system_prompt: SYSTEM_PROMPT.to_string(),
        })
    }

    /// Replace the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Step budget of one run
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run the loop until the model answers without tool calls
    ///
    /// Returns the state with every produced message appended: one
    /// assistant message per REASON step and one tool message per call.
    ///
    /// # Errors
    ///
    /// - `AuraError::MaxIterationsExceeded` when the model is still asking
    ///   for tools after `max_iterations` REASON steps
    /// - any provider error, unchanged
    pub async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let started = Instant::now();
        let definitions = self.tools.all_definitions();
        info!(
            user_id = %state.user_id,
            session_id = %state.session_id,
            context = state.history.len(),
            "Starting agent turn"
        );

        for iteration in 1..=self.max_iterations {
            debug!("Iteration {}/{}", iteration, self.max_iterations);

            let mut messages = Vec::with_capacity(state.history.len() + 1);
            messages.push(Message::system(self.system_prompt.clone()));
            messages.extend(state.history.iter().cloned());

            let response = self.provider.complete(&messages, &definitions).await?;

            match ModelTurn::classify(response.message) {
                ModelTurn::FinalAnswer(message) => {
                    if message.text().is_empty() {
                        warn!("Model returned an empty answer");
                    }
                    state.history.push(message);
                    info!(
                        iterations = iteration,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Agent turn completed"
                    );
                    return Ok(state);
                }
                ModelTurn::ToolRequest { message, calls } => {
                    debug!("Executing {} tool calls", calls.len());
                    state.history.push(message);
                    let results = self.act(&calls).await;
                    state.history.extend(results);
                }
            }
        }

        warn!("Maximum iterations ({}) exceeded", self.max_iterations);
        Err(AuraError::MaxIterationsExceeded {
            limit: self.max_iterations,
            message: "model kept requesting tools".to_string(),
        }
        .into())
    }

    /// Run all calls concurrently; results come back in request order
    async fn act(&self, calls: &[ToolCall]) -> Vec<Message> {
        join_all(calls.iter().map(|call| async move {
            let output = self.execute_tool_call(call).await;
            Message::tool_result(call.id.clone(), output)
        }))
        .await
    }

    /// Execute one call, turning every failure into text for the model
    async fn execute_tool_call(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();

        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Model requested unknown tool");
            return format!(
                "Error: Unknown tool '{}'. Available tools: {}",
                name,
                self.tools.names().join(", ")
            );
        };

        let raw = call.function.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw) {
                Ok(args) => args,
                Err(e) => {
                    warn!(tool = name, "Unparsable tool arguments: {}", e);
                    return format!("Error: Invalid arguments for '{}': {}", name, e);
                }
            }
        };

        match tool.execute(args).await {
            Ok(result) => {
                let result = result.truncate_if_needed(self.max_output_size);
                if result.truncated {
                    debug!(tool = name, "Tool output truncated to {} bytes", self.max_output_size);
                }
                result.to_message()
            }
            Err(e) => {
                warn!(tool = name, "Tool failed: {:#}", e);
                format!("Error: Tool '{}' failed: {}", name, e)
            }
        }
    }
}
