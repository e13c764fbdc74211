//! Agent core for coldmail.
//!
//! This crate turns a chat-completion backend into a cold-email writer. It
//! provides the agent value type, a single-call gateway, a bounded
//! tool-calling loop, guardrails, and the two pipelines the
//! [`SalesManager`] runs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SalesManager                                                │
//! │  - run_prompt: email pipeline                                │
//! │  - run_hybrid: research pipeline, then email pipeline        │
//! └──────────────────────────────────────────────────────────────┘
//!                │                               │
//!                ▼                               ▼
//!       ┌────────────────┐              ┌────────────────┐
//!       │ EmailPipeline  │              │ResearchPipeline│
//!       │ 5 fixed stages │              │   ToolLoop     │
//!       └────────────────┘              └────────────────┘
//!                │                               │
//!                └──────────────┬────────────────┘
//!                               ▼
//!                 ┌──────────────────────────┐
//!                 │ Gateway (coldmail-llm)   │
//!                 │ Guardrails, decode       │
//!                 └──────────────────────────┘
//! ```
//!
//! # Core Components
//!
//! - [`Agent`]: name, instructions, model, optional output type, guardrails, tools
//! - [`Gateway`]: one completion per call; provider failures become diagnostics
//! - [`ToolLoop`]: model-driven tool calls, capped at `max_iterations`
//! - [`decode`]: lenient JSON decoding with typed fallbacks
//! - [`roles`]: factory functions for every agent role

pub mod agent;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod guardrail;
pub mod manager;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod roles;
pub mod tool;
pub mod tool_loop;
pub mod tools;

pub use error::{AgentError, Result};

pub use agent::{Agent, AgentBuilder};
pub use decode::{Decoded, OutputSchema, StructuredOutput};
pub use gateway::{ExecutionResult, Gateway, GatewayConfig};
pub use tool::{AgentTool, PromptAugmenter, ServiceBackedTool, Tool, ToolRegistry};
pub use tool_loop::{DEFAULT_MAX_ITERATIONS, LoopConfig, ToolLoop};

// Re-export guardrail types
pub use guardrail::{
    CheckKind, CheckerGuardrail, ComprehensiveGuardrail, Guardrail, GuardrailContext,
    GuardrailMode, GuardrailOutcome, GuardrailReport,
};

// Re-export structured output models
pub use models::{
    BusinessContextCheck, ContentSafetyCheck, EmailAnalysis, EmailSubject, EmailTone,
    PersonalDataCheck, ProspectResearch, SalesEmail,
};

// Re-export pipeline and manager types
pub use manager::{ManagerConfig, SalesManager, enhanced_prompt};
pub use pipeline::{
    EmailPipeline, EmailPipelineResult, ErrorResult, HybridResult, PipelineResult,
    ResearchOutcome, ResearchPipeline,
};
