//! LLM backend trait and mock implementations.
//!
//! This module defines the abstraction layer over chat-completion providers
//! and provides mock implementations for testing.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{CompletionRequest, CompletionResponse};
#[cfg(any(test, feature = "testing"))]
use crate::{
    error::LlmError,
    types::{ContentBlock, StopReason, Usage},
};

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for chat-completion providers.
///
/// A backend performs exactly one provider round-trip per call. Retry and
/// fallback policy belong to the caller.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send a completion request and get a response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend (for logging/debugging).
    fn name(&self) -> &str;

    /// Whether the provider accepts native tool definitions.
    ///
    /// A backend that returns false is sent toolless requests; agents fall
    /// back to plain completions against it.
    fn supports_native_tools(&self) -> bool {
        true
    }
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Build a plain text response with fixed usage, as a provider would return it.
#[cfg(any(test, feature = "testing"))]
pub fn mock_text_response(text: impl Into<String>) -> CompletionResponse {
    CompletionResponse::new(
        "mock_msg",
        "mock-model",
        vec![ContentBlock::text(text)],
        StopReason::EndTurn,
        Usage::new(10, 20),
    )
}

/// A mock backend for testing purposes.
///
/// Returns pre-configured responses in order, useful for deterministic testing
/// of the tool-calling loop. Once exhausted, every call fails with a backend
/// error, which is also how tests simulate a provider outage.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    native_tools: bool,
    responses: parking_lot::Mutex<Vec<CompletionResponse>>,
    request_log: parking_lot::Mutex<Vec<CompletionRequest>>,
}

#[cfg(any(test, feature = "testing"))]
impl MockBackend {
    /// Create a new mock backend with the given responses.
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            name: "mock".to_string(),
            native_tools: true,
            responses: parking_lot::Mutex::new(responses),
            request_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![mock_text_response(text)])
    }

    /// Create a mock backend answering with each text in turn.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(mock_text_response).collect())
    }

    /// Create a mock backend with no responses: every call fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    /// Report that the provider cannot accept tool definitions.
    pub fn without_native_tools(mut self) -> Self {
        self.native_tools = false;
        self
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.request_log.lock().push(request);

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn supports_native_tools(&self) -> bool {
        self.native_tools
    }
}

/// A mock backend that answers by matching the request's system text.
///
/// Concurrent callers (parallel personas, fan-out guardrails) reach the
/// backend in no particular order, so responses are keyed by a substring of
/// the system prompt instead of by arrival order. Routes are reusable.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct RoutingMockBackend {
    routes: Vec<(String, Option<CompletionResponse>)>,
    request_log: parking_lot::Mutex<Vec<CompletionRequest>>,
}

#[cfg(any(test, feature = "testing"))]
impl RoutingMockBackend {
    /// Create an empty router. Unmatched requests fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose system text contains `key` with `text`.
    pub fn route_text(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.routes.push((key.into(), Some(mock_text_response(text))));
        self
    }

    /// Answer requests whose system text contains `key` with a full response.
    pub fn route(mut self, key: impl Into<String>, response: CompletionResponse) -> Self {
        self.routes.push((key.into(), Some(response)));
        self
    }

    /// Fail requests whose system text contains `key`.
    pub fn route_error(mut self, key: impl Into<String>) -> Self {
        self.routes.push((key.into(), None));
        self
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl LlmBackend for RoutingMockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let system = request.system_text();
        self.request_log.lock().push(request);

        match self.routes.iter().find(|(key, _)| system.contains(key.as_str())) {
            Some((_, Some(response))) => Ok(response.clone()),
            Some((key, None)) => Err(LlmError::Backend(format!(
                "RoutingMockBackend: route '{}' configured to fail",
                key
            ))),
            None => Err(LlmError::Backend(
                "RoutingMockBackend: no route matches request".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "routing-mock"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[tokio::test]
    async fn test_mock_backend_single_response() {
        let backend = MockBackend::with_text("Hello!");

        let request = CompletionRequest::new("test-model", vec![Message::user("Hi")], 100);
        let response = backend.complete(request).await.unwrap();

        assert_eq!(response.text(), "Hello!");
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_in_order_then_exhausted() {
        let backend = MockBackend::with_texts(["First", "Second"]);
        let req = || CompletionRequest::new("m", vec![Message::user("x")], 10);

        assert_eq!(backend.complete(req()).await.unwrap().text(), "First");
        assert_eq!(backend.complete(req()).await.unwrap().text(), "Second");

        let err = backend.complete(req()).await.unwrap_err();
        assert!(err.to_string().contains("no more responses"));
        assert_eq!(backend.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_backend_native_tools_flag() {
        assert!(MockBackend::failing().supports_native_tools());
        assert!(!MockBackend::failing().without_native_tools().supports_native_tools());
    }

    #[tokio::test]
    async fn test_routing_backend_matches_system_text() {
        let backend = RoutingMockBackend::new()
            .route_text("safety", "{\"is_safe\": true}")
            .route_error("personal");

        let safety = CompletionRequest::new(
            "m",
            vec![Message::system("You are a safety checker"), Message::user("x")],
            10,
        );
        let personal = CompletionRequest::new(
            "m",
            vec![Message::system("You are a personal data checker"), Message::user("x")],
            10,
        );
        let other = CompletionRequest::new("m", vec![Message::system("unrelated")], 10);

        assert_eq!(
            backend.complete(safety.clone()).await.unwrap().text(),
            "{\"is_safe\": true}"
        );
        // Routes are reusable.
        assert!(backend.complete(safety).await.is_ok());
        assert!(backend.complete(personal).await.is_err());
        assert!(backend.complete(other).await.is_err());
        assert_eq!(backend.request_count(), 4);
    }
}
