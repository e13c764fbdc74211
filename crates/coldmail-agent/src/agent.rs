//! The immutable agent definition.
//!
//! An [`Agent`] is configuration only: who it is, what it is told, which
//! model it talks to, what shape of answer it wants, and which guardrails
//! and tools come with it. Running an agent is the job of the
//! [`Gateway`](crate::gateway::Gateway) and the
//! [`ToolLoop`](crate::tool_loop::ToolLoop). Agents are built once per role
//! and shared behind `Arc`.

use std::sync::Arc;

use crate::decode::{OutputSchema, StructuredOutput};
use crate::error::{AgentError, Result};
use crate::guardrail::Guardrail;
use crate::tool::{Tool, ToolRegistry};

pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    output_schema: Option<OutputSchema>,
    guardrails: Vec<Arc<dyn Guardrail>>,
    tools: ToolRegistry,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }

    pub fn guardrails(&self) -> &[Arc<dyn Guardrail>] {
        &self.guardrails
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("output_schema", &self.output_schema)
            .field(
                "guardrails",
                &self.guardrails.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field("tools", &self.tools.names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Agent`].
#[derive(Default)]
pub struct AgentBuilder {
    name: Option<String>,
    instructions: Option<String>,
    model: Option<String>,
    output_schema: Option<OutputSchema>,
    guardrails: Vec<Arc<dyn Guardrail>>,
    tools: ToolRegistry,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Ask the model for JSON decodable into `T`.
    pub fn with_output<T: StructuredOutput>(mut self) -> Self {
        self.output_schema = Some(OutputSchema::of::<T>());
        self
    }

    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn with_guardrails(
        mut self,
        guardrails: impl IntoIterator<Item = Arc<dyn Guardrail>>,
    ) -> Self {
        self.guardrails.extend(guardrails);
        self
    }

    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn with_tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register_arc(tool);
        self
    }

    /// Build the agent.
    ///
    /// Name, instructions and model are required and must not be blank.
    pub fn build(self) -> Result<Agent> {
        let name = required("name", self.name)?;
        let instructions = required("instructions", self.instructions)?;
        let model = required("model", self.model)?;

        Ok(Agent {
            name,
            instructions,
            model,
            output_schema: self.output_schema,
            guardrails: self.guardrails,
            tools: self.tools,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AgentError::config(format!("Agent {} is required", field))),
    }
}
