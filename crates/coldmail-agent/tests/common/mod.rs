//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use coldmail_agent::{Agent, Gateway, SalesManager, ManagerConfig};
use coldmail_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmBackend, LlmError, RoutingMockBackend,
    StopReason, Usage,
};
use coldmail_services::{DryRunTransport, ServicesRegistry};
use parking_lot::Mutex;
use serde_json::json;

// Routing keys: the opening words of each role's instructions.
pub const PROFESSIONAL: &str = "You are a professional sales representative";
pub const ENGAGING: &str = "You are an engaging sales representative";
pub const BUSY: &str = "You are a sales representative writing for busy executives";
pub const ANALYZER: &str = "You are an email analyst";
pub const SUBJECT_WRITER: &str = "You write email subject lines";
pub const HTML_CONVERTER: &str = "You convert plain-text email bodies into clean HTML";
pub const RESEARCHER: &str = "You are a prospect research coordinator";
pub const COMPETITOR_ANALYZER: &str = "You analyze the competitive landscape";
pub const NEWS_ANALYZER: &str = "You analyze recent news coverage";
pub const SAFETY_CHECKER: &str = "You are a content safety checker";
pub const CONTEXT_CHECKER: &str = "You are a business context checker";
pub const DATA_CHECKER: &str = "You are a personal data checker";

pub const CLEAN_CHECK: &str = r#"{"is_safe": true, "reason": "clean", "confidence": 0.95}"#;

pub fn sales_email(subject: &str, body: &str, rate: f64) -> String {
    json!({
        "subject": subject,
        "body": body,
        "tone": "professional",
        "call_to_action": "Book a 15-minute demo",
        "personalization_notes": "Mentions SOC2 audit",
        "expected_response_rate": rate,
    })
    .to_string()
}

pub fn analysis(score: f64, level: &str) -> String {
    json!({
        "effectiveness_score": score,
        "tone": "professional",
        "word_count": 120,
        "has_call_to_action": true,
        "personalization_level": level,
        "strengths": ["Clear value"],
        "weaknesses": [],
        "improvement_suggestions": ["Shorten the opener"],
    })
    .to_string()
}

pub fn subject(primary: &str) -> String {
    json!({
        "primary_subject": primary,
        "alternative_subjects": ["SOC2 in weeks", "Audit prep, automated", "Quick question"],
        "subject_type": "benefit",
        "predicted_open_rate": 35,
    })
    .to_string()
}

/// A backend routing every role of the email pipeline, with clean guardrails.
pub fn email_backend(professional: &str, engaging: &str, busy: &str) -> RoutingMockBackend {
    email_roles(professional, engaging, busy)
        .route_text(SAFETY_CHECKER, CLEAN_CHECK)
        .route_text(CONTEXT_CHECKER, CLEAN_CHECK)
        .route_text(DATA_CHECKER, CLEAN_CHECK)
}

/// Every email role except the guardrail checkers.
pub fn email_roles(professional: &str, engaging: &str, busy: &str) -> RoutingMockBackend {
    RoutingMockBackend::new()
        .route_text(PROFESSIONAL, professional)
        .route_text(ENGAGING, engaging)
        .route_text(BUSY, busy)
        .route_text(ANALYZER, analysis(7.0, "medium"))
        .route_text(SUBJECT_WRITER, subject("Cut your SOC2 prep time"))
        .route_text(HTML_CONVERTER, "<p>Hello from ComplAI</p>")
}

/// A response asking for one tool call with a `prompt` argument.
pub fn tool_call(id: &str, name: &str, prompt: &str) -> CompletionResponse {
    tool_calls(&[(id, name, prompt)])
}

/// A response asking for several tool calls at once.
pub fn tool_calls(calls: &[(&str, &str, &str)]) -> CompletionResponse {
    CompletionResponse::new(
        "mock_tool_msg",
        "mock-model",
        calls
            .iter()
            .map(|(id, name, prompt)| {
                ContentBlock::tool_use(*id, *name, json!({ "prompt": prompt }))
            })
            .collect(),
        StopReason::ToolUse,
        Usage::new(10, 20),
    )
}

pub fn text(text: &str) -> CompletionResponse {
    CompletionResponse::new(
        "mock_msg",
        "mock-model",
        vec![ContentBlock::text(text)],
        StopReason::EndTurn,
        Usage::new(10, 20),
    )
}

/// A backend that answers each route with a script, in order.
///
/// The last entry of a script repeats once the earlier ones are used up;
/// `None` entries fail the call.
#[derive(Default)]
pub struct ScriptedBackend {
    routes: Vec<(String, Mutex<VecDeque<Option<CompletionResponse>>>)>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, key: &str, responses: Vec<Option<CompletionResponse>>) -> Self {
        self.routes.push((key.to_string(), Mutex::new(responses.into())));
        self
    }

    pub fn requests_for(&self, key: &str) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.system_text().contains(key))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> coldmail_llm::Result<CompletionResponse> {
        let system = request.system_text();
        self.requests.lock().push(request);

        let Some((key, script)) = self.routes.iter().find(|(key, _)| system.contains(key.as_str()))
        else {
            return Err(LlmError::Backend("ScriptedBackend: no route matches request".to_string()));
        };

        let mut script = script.lock();
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().cloned().flatten()
        };
        next.ok_or_else(|| LlmError::Backend(format!("ScriptedBackend: route '{}' failed", key)))
    }

    fn name(&self) -> &str {
        "scripted-mock"
    }
}

pub fn agent(name: &str, instructions: &str) -> Agent {
    Agent::builder()
        .with_name(name)
        .with_instructions(instructions)
        .with_model("gpt-4o-mini")
        .build()
        .expect("valid agent")
}

pub fn gateway(backend: impl LlmBackend + 'static) -> Gateway {
    Gateway::new(Arc::new(backend))
}

/// Services whose email transport only records.
pub fn dry_run_services() -> (ServicesRegistry, Arc<DryRunTransport>) {
    let transport = Arc::new(DryRunTransport::new());
    let services = ServicesRegistry::builder()
        .email_transport(transport.clone())
        .build()
        .expect("registry builds");
    (services, transport)
}

pub fn manager(
    backend: Arc<dyn LlmBackend>,
    services: &ServicesRegistry,
    config: ManagerConfig,
) -> SalesManager {
    SalesManager::new(backend, services, config).expect("manager builds")
}
