//! Tools the model can call from inside the tool-calling loop.
//!
//! Every coldmail tool delegates to another agent ("agent-of-agents"). A
//! [`ServiceBackedTool`] first enriches the prompt with deterministic data
//! (a scraped website, a LinkedIn page, news results) and then delegates.

use async_trait::async_trait;
use coldmail_llm::ToolDefinition;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::gateway::Gateway;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Parameter schema shared by every delegating tool: a single `prompt`.
pub fn prompt_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "The prompt to execute with this tool"
            }
        },
        "required": ["prompt"],
        "additionalProperties": false
    })
}

/// Trait for loop-callable tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of this tool.
    fn name(&self) -> &str;

    /// Get a human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for this tool's parameters.
    fn parameters(&self) -> Value {
        prompt_parameters()
    }

    /// Execute the tool on the prompt the model supplied.
    async fn execute(&self, prompt: &str) -> Result<String>;

    /// Provider-facing definition, or `None` when the parameter schema is
    /// not a JSON object schema.
    fn definition(&self) -> Option<ToolDefinition> {
        let parameters = self.parameters();
        if parameters.get("type").and_then(Value::as_str) != Some("object") {
            return None;
        }
        Some(ToolDefinition::new(
            self.name(),
            self.description(),
            parameters,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of tools available to an agent, in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool. A tool with the same name is replaced.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every tool that converts cleanly, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .filter_map(|tool| {
                let definition = tool.definition();
                if definition.is_none() {
                    tracing::warn!(
                        tool = %tool.name(),
                        "Skipping tool without an object parameter schema"
                    );
                }
                definition
            })
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Tool
// ─────────────────────────────────────────────────────────────────────────────

/// A tool that runs another agent on the prompt it is given.
pub struct AgentTool {
    name: String,
    description: String,
    agent: Arc<Agent>,
    gateway: Gateway,
}

impl AgentTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        agent: Arc<Agent>,
        gateway: Gateway,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
            gateway,
        }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    /// Blank prompts short-circuit to an empty result. A provider failure
    /// inside the delegate is not an error here: its diagnostic text is
    /// returned as the tool output.
    async fn execute(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Ok(String::new());
        }

        tracing::debug!(tool = %self.name, agent = %self.agent.name(), "Delegating to agent");
        self.gateway
            .complete(&self.agent, prompt)
            .await
            .map(|result| result.output)
            .map_err(|e| AgentError::tool(format!("Tool execution error: {}", e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service-Backed Tool
// ─────────────────────────────────────────────────────────────────────────────

/// Turns the model's prompt into a data-enriched prompt for the delegate.
///
/// Augmenters never fail: when the service is unavailable they return a
/// prompt that says so, and the delegate analyzes that instead.
#[async_trait]
pub trait PromptAugmenter: Send + Sync {
    async fn augment(&self, prompt: &str) -> String;
}

/// An [`AgentTool`] whose prompt is first enriched by a [`PromptAugmenter`].
pub struct ServiceBackedTool {
    inner: AgentTool,
    augmenter: Arc<dyn PromptAugmenter>,
}

impl ServiceBackedTool {
    pub fn new(inner: AgentTool, augmenter: Arc<dyn PromptAugmenter>) -> Self {
        Self { inner, augmenter }
    }
}

#[async_trait]
impl Tool for ServiceBackedTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    async fn execute(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Ok(String::new());
        }

        let augmented = self.augmenter.augment(prompt).await;
        tracing::debug!(
            tool = %self.inner.name(),
            chars = augmented.chars().count(),
            "Built augmented prompt"
        );
        self.inner.execute(&augmented).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldmail_llm::MockBackend;

    struct RawSchemaTool;

    #[async_trait]
    impl Tool for RawSchemaTool {
        fn name(&self) -> &str {
            "raw"
        }
        fn description(&self) -> &str {
            "A tool with a non-object schema"
        }
        fn parameters(&self) -> Value {
            json!({"type": "string"})
        }
        async fn execute(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    struct Prefixer;

    #[async_trait]
    impl PromptAugmenter for Prefixer {
        async fn augment(&self, prompt: &str) -> String {
            format!("Analyze this test data:\n\n{}", prompt)
        }
    }

    fn analyzer() -> Arc<Agent> {
        Arc::new(
            Agent::builder()
                .with_name("Competitor Analyzer")
                .with_instructions("Analyze competitors")
                .with_model("gpt-4o-mini")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_prompt_parameters_schema() {
        let schema = prompt_parameters();
        assert_eq!(schema["required"], json!(["prompt"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["prompt"]["description"],
            "The prompt to execute with this tool"
        );
    }

    #[test]
    fn test_registry_definitions_skip_unconvertible() {
        let gateway = Gateway::new(Arc::new(MockBackend::failing()));
        let mut registry = ToolRegistry::new();
        registry.register(AgentTool::new("b_tool", "B", analyzer(), gateway.clone()));
        registry.register(RawSchemaTool);
        registry.register(AgentTool::new("a_tool", "A", analyzer(), gateway));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["b_tool", "raw", "a_tool"]);
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b_tool", "a_tool"]);
    }

    #[tokio::test]
    async fn test_agent_tool_returns_delegate_output() {
        let backend = Arc::new(MockBackend::with_text("Crowded market"));
        let tool = AgentTool::new(
            "analyze_competitive_position",
            "Competition",
            analyzer(),
            Gateway::new(backend.clone()),
        );

        assert_eq!(tool.execute("Acme").await.unwrap(), "Crowded market");
        assert_eq!(backend.requests()[0].messages[1].content.to_text(), "Acme");
    }

    #[tokio::test]
    async fn test_agent_tool_blank_prompt_skips_model() {
        let backend = Arc::new(MockBackend::failing());
        let tool = AgentTool::new("t", "d", analyzer(), Gateway::new(backend.clone()));

        assert_eq!(tool.execute("   ").await.unwrap(), "");
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_agent_tool_provider_failure_is_output() {
        let tool = AgentTool::new(
            "t",
            "d",
            analyzer(),
            Gateway::new(Arc::new(MockBackend::failing())),
        );
        let output = tool.execute("Acme").await.unwrap();
        assert!(output.starts_with("Error calling OpenAI API for Competitor Analyzer"));
    }

    #[tokio::test]
    async fn test_service_backed_tool_augments_prompt() {
        let backend = Arc::new(MockBackend::with_text("analysis"));
        let inner = AgentTool::new("t", "d", analyzer(), Gateway::new(backend.clone()));
        let tool = ServiceBackedTool::new(inner, Arc::new(Prefixer));

        assert_eq!(tool.name(), "t");
        assert_eq!(tool.execute("Acme").await.unwrap(), "analysis");
        assert_eq!(
            backend.requests()[0].messages[1].content.to_text(),
            "Analyze this test data:\n\nAcme"
        );
    }
}
