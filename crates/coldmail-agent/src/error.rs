//! Error types for the agent crate.

use thiserror::Error;

/// Result type alias using the agent error type.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM backend error.
    #[error("LLM error: {0}")]
    Llm(#[from] coldmail_llm::LlmError),

    /// Deterministic service error.
    #[error("Service error: {0}")]
    Service(#[from] coldmail_services::ServiceError),

    /// Caller passed an unusable argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Tool execution error.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every generated variant was rejected by a guardrail.
    #[error("Guardrail rejected: {0}")]
    GuardrailRejected(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Maximum iterations exceeded.
    #[error("Maximum iterations exceeded: {0}")]
    MaxIterations(u32),
}

impl AgentError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a tool error.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-friendly name of the variant, used in error results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Llm(_) => "LlmError",
            Self::Service(_) => "ServiceError",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Tool(_) => "ToolError",
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::Config(_) => "ConfigError",
            Self::Serialization(_) => "SerializationError",
            Self::GuardrailRejected(_) => "GuardrailRejected",
            Self::Internal(_) => "InternalError",
            Self::MaxIterations(_) => "MaxIterations",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::tool("Tool execution error: boom");
        assert_eq!(err.to_string(), "Tool error: Tool execution error: boom");
    }

    #[test]
    fn test_invalid_argument() {
        let err = AgentError::invalid_argument("Prompt cannot be blank");
        assert!(err.to_string().starts_with("Invalid argument"));
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[test]
    fn test_from_llm_error() {
        let err: AgentError = coldmail_llm::LlmError::Auth("bad key".to_string()).into();
        assert!(matches!(err, AgentError::Llm(_)));
        assert_eq!(err.kind(), "LlmError");
    }
}
