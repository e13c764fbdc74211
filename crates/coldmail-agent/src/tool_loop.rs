//! The bounded tool-calling loop ("agent-of-agents").
//!
//! The model sees the agent's tools and decides which to call, in what
//! order, and when it knows enough. Each iteration is one round-trip:
//!
//! ```text
//! transcript ──► model ──► no tool calls? ──► final ExecutionResult
//!     ▲                        │
//!     │                        ▼ tool calls (run concurrently)
//!     └──── tool results ◄── tools (each delegates to an agent)
//! ```
//!
//! The loop stops after `max_iterations` round-trips whatever the model asks
//! for. Tool failures never stop it: they are written into the transcript
//! and the model decides what to do next.

use coldmail_llm::{Message, ToolDefinition, ToolResultBlock, ToolUseBlock};
use futures::future::join_all;
use serde_json::Value;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::gateway::{ExecutionResult, Gateway};

/// Default cap on round-trips per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub max_iterations: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Outcome of one tool invocation, as written into the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Succeeded(String),
    Failed(String),
}

/// Runs agents that carry tools.
#[derive(Debug, Clone)]
pub struct ToolLoop {
    gateway: Gateway,
    config: LoopConfig,
}

impl ToolLoop {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            config: LoopConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run `agent` on `prompt`, letting the model call the agent's tools.
    ///
    /// Agents without usable tool definitions (or backends that cannot take
    /// them) fall back to a single plain completion reporting zero calls.
    pub async fn run(&self, agent: &Agent, prompt: &str) -> Result<ExecutionResult> {
        if prompt.trim().is_empty() {
            return Err(AgentError::invalid_argument("Prompt cannot be blank"));
        }

        let definitions = if self.gateway.backend().supports_native_tools() {
            agent.tools().definitions()
        } else {
            Vec::new()
        };

        if definitions.is_empty() {
            tracing::info!(agent = %agent.name(), "No usable tools, running plain completion");
            return self.gateway.complete(agent, prompt).await;
        }

        tracing::info!(
            agent = %agent.name(),
            tools = definitions.len(),
            max_iterations = self.config.max_iterations,
            "Starting tool-calling loop"
        );

        match self.drive(agent, prompt, &definitions).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(agent = %agent.name(), error = %e, "Tool-calling loop failed");
                Ok(ExecutionResult {
                    output: format!(
                        "Error in agent-of-agents execution for {}: {}",
                        agent.name(),
                        e
                    ),
                    provider_failed: true,
                    ..ExecutionResult::default()
                })
            }
        }
    }

    async fn drive(
        &self,
        agent: &Agent,
        prompt: &str,
        definitions: &[ToolDefinition],
    ) -> coldmail_llm::Result<ExecutionResult> {
        let mut transcript = vec![Message::system(agent.instructions()), Message::user(prompt)];
        let mut tokens = 0u32;
        let mut tool_calls = 0usize;
        let mut tools_used: Vec<String> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let response = self.gateway.exchange(agent, &transcript, definitions).await?;
            tokens = tokens.saturating_add(response.usage.total());

            let calls = response.tool_uses();
            transcript.push(Message::assistant_blocks(response.content.clone()));

            if calls.is_empty() {
                let output = response.text();
                let structured = agent
                    .output_schema()
                    .is_some_and(|schema| schema.accepts(&output));
                tracing::info!(
                    agent = %agent.name(),
                    iteration,
                    tool_calls,
                    tokens,
                    "Tool-calling loop finished"
                );
                return Ok(ExecutionResult {
                    output,
                    model: response.model,
                    tokens,
                    structured,
                    tool_calls,
                    tools_used,
                    provider_failed: false,
                    max_iterations_reached: false,
                });
            }

            tracing::debug!(
                agent = %agent.name(),
                iteration,
                requested = calls.len(),
                "Model requested tools"
            );

            let outcomes =
                join_all(calls.iter().map(|call| self.invoke(agent, call, prompt))).await;

            let mut results = Vec::with_capacity(calls.len());
            for (call, outcome) in calls.iter().zip(outcomes) {
                match outcome {
                    Invocation::Succeeded(output) => {
                        tool_calls += 1;
                        if !tools_used.contains(&call.name) {
                            tools_used.push(call.name.clone());
                        }
                        results.push(ToolResultBlock::success(&call.id, output));
                    }
                    Invocation::Failed(message) => {
                        results.push(ToolResultBlock::error(&call.id, message));
                    }
                }
            }
            transcript.push(Message::tool_results(results));
        }

        tracing::warn!(
            agent = %agent.name(),
            max_iterations = self.config.max_iterations,
            tool_calls,
            "Tool-calling loop hit its iteration cap"
        );
        Ok(ExecutionResult {
            output: format!("Error: Max iterations reached for {}", agent.name()),
            tokens,
            tool_calls,
            tools_used,
            max_iterations_reached: true,
            ..ExecutionResult::default()
        })
    }

    async fn invoke(
        &self,
        agent: &Agent,
        call: &ToolUseBlock,
        original_prompt: &str,
    ) -> Invocation {
        let Some(tool) = agent.tools().get(&call.name) else {
            tracing::warn!(
                agent = %agent.name(),
                tool = %call.name,
                "Model requested unknown tool"
            );
            return Invocation::Failed(format!("Error: Tool {} not found", call.name));
        };

        let prompt = prompt_argument(&call.input, original_prompt);
        tracing::info!(tool = %call.name, "Invoking tool");

        match tool.execute(&prompt).await {
            Ok(output) if output.trim().is_empty() => {
                Invocation::Succeeded("No result returned".to_string())
            }
            Ok(output) => Invocation::Succeeded(output),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool failed");
                Invocation::Failed(format!("Error: {}", e))
            }
        }
    }
}

/// The `prompt` argument of a tool call, or `original` when absent.
///
/// Arguments may arrive as an object or as a JSON-encoded string.
fn prompt_argument(input: &Value, original: &str) -> String {
    let parsed;
    let args = match input {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse tool arguments, using original prompt");
                return original.to_string();
            }
        },
        other => other,
    };

    args.get("prompt")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| original.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_argument() {
        assert_eq!(prompt_argument(&json!({"prompt": "Acme"}), "orig"), "Acme");
        assert_eq!(prompt_argument(&json!({"other": 1}), "orig"), "orig");
        assert_eq!(prompt_argument(&json!("{\"prompt\": \"Beta\"}"), "orig"), "Beta");
        assert_eq!(prompt_argument(&json!("{not json"), "orig"), "orig");
        assert_eq!(prompt_argument(&Value::Null, "orig"), "orig");
    }

    #[test]
    fn test_default_config() {
        assert_eq!(LoopConfig::default().max_iterations, 10);
    }
}
