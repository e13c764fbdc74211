//! LLM provider abstraction for coldmail.
//!
//! The core abstraction is the [`LlmBackend`] trait: one chat-completion
//! round-trip per call, no hidden retries. Agents and pipelines only ever see
//! this trait, so tests swap in [`MockBackend`] or [`RoutingMockBackend`]
//! (behind the `testing` feature).
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - complete(request) -> response        │
//! │  - supports_native_tools()              │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!   ┌─────────────┐     ┌─────────────┐
//!   │ OpenAiBackend│     │ MockBackend │
//!   └─────────────┘     └─────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, SharedBackend};
#[cfg(any(test, feature = "testing"))]
pub use backend::{MockBackend, RoutingMockBackend, mock_text_response};
pub use error::{LlmError, Result};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use types::{
    CompletionRequest, CompletionResponse, Content, ContentBlock, Message, ResponseFormat, Role,
    StopReason, ToolDefinition, ToolResultBlock, ToolUseBlock, Usage,
};
