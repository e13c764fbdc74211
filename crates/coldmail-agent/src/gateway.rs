//! Single round-trips between an [`Agent`] and the LLM backend.

use coldmail_llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, ResponseFormat, SharedBackend,
    ToolDefinition,
};
use serde::Serialize;

use crate::agent::Agent;
use crate::decode::{Decoded, StructuredOutput, decode};
use crate::error::{AgentError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatewayConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution result
// ─────────────────────────────────────────────────────────────────────────────

/// What one agent run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Raw text of the final reply (or a diagnostic when the run failed).
    pub output: String,
    /// Model that answered; empty when the provider call failed.
    pub model: String,
    /// Total tokens across all round-trips.
    pub tokens: u32,
    /// Whether `output` decodes into the agent's declared output type.
    pub structured: bool,
    /// Successful tool invocations.
    pub tool_calls: usize,
    /// Distinct tools invoked successfully, in first-use order.
    pub tools_used: Vec<String>,
    /// Set when the run ended because the provider call failed.
    pub provider_failed: bool,
    /// Set when the tool-calling loop stopped at its iteration cap.
    pub max_iterations_reached: bool,
}

impl ExecutionResult {
    /// Result of a provider failure for `agent_name`.
    pub fn provider_failure(agent_name: &str, error: &LlmError) -> Self {
        Self {
            output: format!(
                "Error calling OpenAI API for {}: {}\n\nPlease check your OPENAI_API_KEY in .env file",
                agent_name, error
            ),
            provider_failed: true,
            ..Self::default()
        }
    }

    pub fn decode<T: StructuredOutput>(&self) -> Decoded<T> {
        decode(&self.output)
    }

    /// The output as `T`, or `T`'s fallback built from the raw text.
    pub fn typed_or_fallback<T: StructuredOutput>(&self) -> T {
        self.decode::<T>().into_value()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────────────────────────────────────

/// Wraps the backend with request construction and failure handling.
///
/// Cheap to clone; every clone shares the same backend.
#[derive(Clone)]
pub struct Gateway {
    backend: SharedBackend,
    config: GatewayConfig,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Gateway {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            config: GatewayConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run `agent` once on `prompt`, without tools.
    ///
    /// A blank prompt is rejected before any network call. Provider failures
    /// do not surface as errors: they come back as an [`ExecutionResult`]
    /// with `provider_failed` set and a diagnostic as its output.
    pub async fn complete(&self, agent: &Agent, prompt: &str) -> Result<ExecutionResult> {
        if prompt.trim().is_empty() {
            return Err(AgentError::invalid_argument("Prompt cannot be blank"));
        }

        let mut messages = vec![Message::system(agent.instructions()), Message::user(prompt)];
        let mut format = ResponseFormat::Text;
        if let Some(schema) = agent.output_schema() {
            messages.push(Message::system(schema.instruction()));
            format = ResponseFormat::JsonObject;
        }

        let request = self.request(agent, messages).with_response_format(format);
        tracing::debug!(agent = %agent.name(), model = %agent.model(), "Calling model");

        match self.backend.complete(request).await {
            Ok(response) => {
                let output = response.text();
                let structured = agent
                    .output_schema()
                    .is_some_and(|schema| schema.accepts(&output));
                tracing::debug!(
                    agent = %agent.name(),
                    tokens = response.usage.total(),
                    structured,
                    "Model replied"
                );
                Ok(ExecutionResult {
                    output,
                    model: response.model,
                    tokens: response.usage.total(),
                    structured,
                    ..ExecutionResult::default()
                })
            }
            Err(e) => {
                tracing::error!(agent = %agent.name(), error = %e, "Model call failed");
                Ok(ExecutionResult::provider_failure(agent.name(), &e))
            }
        }
    }

    /// One raw round-trip with an explicit transcript and tool manifest.
    pub async fn exchange(
        &self,
        agent: &Agent,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> coldmail_llm::Result<CompletionResponse> {
        let request = self
            .request(agent, transcript.to_vec())
            .with_tools(tools.to_vec());
        self.backend.complete(request).await
    }

    fn request(&self, agent: &Agent, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest::new(agent.model(), messages, self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_top_p(self.config.top_p)
    }
}
