//! Content guardrails.
//!
//! A guardrail asks a checker agent about a candidate text and reports
//! whether it tripped. Checks never fail: a checker whose reply cannot be
//! decoded is judged by keyword heuristics over its raw reply, and a checker
//! whose provider call failed reports "not triggered" so the remaining
//! checks still decide.

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::agent::Agent;
use crate::decode::{Decoded, StructuredOutput};
use crate::gateway::Gateway;
use crate::models::{BusinessContextCheck, ContentSafetyCheck, PersonalDataCheck};

// ─────────────────────────────────────────────────────────────────────────────
// Core types
// ─────────────────────────────────────────────────────────────────────────────

/// What happens when a generated variant trips a guardrail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardrailMode {
    /// Log the trip and keep the variant.
    #[default]
    Advisory,
    /// Exclude the variant from selection.
    Enforcing,
}

/// Everything a guardrail needs besides the text under test.
#[derive(Debug, Clone, Copy)]
pub struct GuardrailContext<'a> {
    /// Gateway the checker agents are called through.
    pub gateway: &'a Gateway,
    /// Agent whose output is being checked.
    pub agent: &'a Agent,
}

/// Result of one guardrail over one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardrailOutcome {
    pub guardrail: String,
    pub triggered: bool,
    pub detail: String,
    /// Checker verdict keyed by check (`safety_check`, `context_check`, `data_check`).
    pub info: Value,
}

impl GuardrailOutcome {
    pub fn passed(guardrail: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            guardrail: guardrail.into(),
            triggered: false,
            detail: detail.into(),
            info: Value::Null,
        }
    }
}

#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &GuardrailContext<'_>, text: &str) -> GuardrailOutcome;
}

// ─────────────────────────────────────────────────────────────────────────────
// Checker-backed checks
// ─────────────────────────────────────────────────────────────────────────────

/// The three checker-backed checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    ContentSafety,
    BusinessContext,
    PersonalData,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [
        CheckKind::ContentSafety,
        CheckKind::BusinessContext,
        CheckKind::PersonalData,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ContentSafety => "content_safety",
            Self::BusinessContext => "business_context",
            Self::PersonalData => "personal_data",
        }
    }

    /// Prefix put in front of the text sent to the checker.
    pub fn prompt_prefix(&self) -> &'static str {
        match self {
            Self::ContentSafety => "Analyze this content for safety: ",
            Self::BusinessContext => "Analyze this content for business context: ",
            Self::PersonalData => "Analyze this content for personal data: ",
        }
    }

    /// Words that trip the check when the checker's reply is not decodable.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::ContentSafety => &["urgent", "call now", "spam", "inappropriate", "violation"],
            Self::BusinessContext => &["vanta", "drata", "competitor", "off-brand"],
            Self::PersonalData => &["john", "smith", "mike", "johnson", "personal", "private"],
        }
    }

    pub fn info_key(&self) -> &'static str {
        match self {
            Self::ContentSafety => "safety_check",
            Self::BusinessContext => "context_check",
            Self::PersonalData => "data_check",
        }
    }

    fn keyword_hit(&self, raw: &str) -> bool {
        let lower = raw.to_lowercase();
        self.keywords().iter().any(|k| lower.contains(k))
    }
}

/// A verdict type produced by a checker agent.
pub trait CheckVerdict: StructuredOutput + Serialize {
    fn tripped(&self) -> bool;
    fn reason(&self) -> &str;
}

impl CheckVerdict for ContentSafetyCheck {
    fn tripped(&self) -> bool {
        self.contains_spam_indicators
            || self.inappropriate_content
            || !self.policy_violations.is_empty()
    }

    fn reason(&self) -> &str {
        &self.reason
    }
}

impl CheckVerdict for BusinessContextCheck {
    fn tripped(&self) -> bool {
        self.mentions_competitors || self.off_brand_messaging || !self.compliance_issues.is_empty()
    }

    fn reason(&self) -> &str {
        &self.reason
    }
}

impl CheckVerdict for PersonalDataCheck {
    fn tripped(&self) -> bool {
        self.contains_personal_names || self.contains_sensitive_data
    }

    fn reason(&self) -> &str {
        &self.reason
    }
}

/// A guardrail backed by one checker agent.
pub struct CheckerGuardrail {
    kind: CheckKind,
    checker: Arc<Agent>,
}

impl CheckerGuardrail {
    pub fn new(kind: CheckKind, checker: Arc<Agent>) -> Self {
        Self { kind, checker }
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn run<T: CheckVerdict>(
        &self,
        ctx: &GuardrailContext<'_>,
        text: &str,
    ) -> GuardrailOutcome {
        let name = self.kind.name();
        let prompt = format!("{}{}", self.kind.prompt_prefix(), text);

        let result = match ctx.gateway.complete(&self.checker, &prompt).await {
            Ok(result) if !result.provider_failed => result,
            Ok(result) => {
                tracing::error!(
                    guardrail = name,
                    agent = %ctx.agent.name(),
                    output = %result.output,
                    "Guardrail checker failed, treating as not triggered"
                );
                return GuardrailOutcome::passed(name, "Checker unavailable");
            }
            Err(e) => {
                tracing::error!(guardrail = name, error = %e, "Guardrail checker failed");
                return GuardrailOutcome::passed(name, "Checker unavailable");
            }
        };

        match result.decode::<T>() {
            Decoded::Structured(verdict) => GuardrailOutcome {
                guardrail: name.to_string(),
                triggered: verdict.tripped(),
                detail: verdict.reason().to_string(),
                info: json!({ self.kind.info_key(): verdict }),
            },
            Decoded::Degraded { raw } => {
                let triggered = self.kind.keyword_hit(&raw);
                tracing::debug!(guardrail = name, triggered, "Using keyword heuristic");
                GuardrailOutcome {
                    guardrail: name.to_string(),
                    triggered,
                    detail: "Keyword heuristic over checker output".to_string(),
                    info: json!({ self.kind.info_key(): { "raw": raw } }),
                }
            }
        }
    }
}

#[async_trait]
impl Guardrail for CheckerGuardrail {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn check(&self, ctx: &GuardrailContext<'_>, text: &str) -> GuardrailOutcome {
        match self.kind {
            CheckKind::ContentSafety => self.run::<ContentSafetyCheck>(ctx, text).await,
            CheckKind::BusinessContext => self.run::<BusinessContextCheck>(ctx, text).await,
            CheckKind::PersonalData => self.run::<PersonalDataCheck>(ctx, text).await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Outcomes of several guardrails over one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuardrailReport {
    pub outcomes: Vec<GuardrailOutcome>,
}

impl GuardrailReport {
    pub fn triggered(&self) -> bool {
        self.outcomes.iter().any(|o| o.triggered)
    }

    /// Names and details of the tripped guardrails.
    pub fn reasons(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.triggered)
            .map(|o| format!("{}: {}", o.guardrail, o.detail))
            .collect()
    }
}

/// Run every guardrail concurrently over `text`.
pub async fn evaluate(
    ctx: &GuardrailContext<'_>,
    guardrails: &[Arc<dyn Guardrail>],
    text: &str,
) -> GuardrailReport {
    let outcomes = join_all(guardrails.iter().map(|g| g.check(ctx, text))).await;
    GuardrailReport { outcomes }
}

/// All checks at once, OR-combined into a single outcome.
pub struct ComprehensiveGuardrail {
    checks: Vec<Arc<dyn Guardrail>>,
}

impl ComprehensiveGuardrail {
    pub fn new(checks: Vec<Arc<dyn Guardrail>>) -> Self {
        Self { checks }
    }
}

#[async_trait]
impl Guardrail for ComprehensiveGuardrail {
    fn name(&self) -> &str {
        "comprehensive"
    }

    async fn check(&self, ctx: &GuardrailContext<'_>, text: &str) -> GuardrailOutcome {
        let report = evaluate(ctx, &self.checks, text).await;

        let mut info = serde_json::Map::new();
        for outcome in &report.outcomes {
            if let Value::Object(entries) = &outcome.info {
                info.extend(entries.clone());
            }
        }

        let triggered = report.triggered();
        let detail = if triggered {
            report.reasons().join("; ")
        } else {
            "All checks passed".to_string()
        };

        GuardrailOutcome {
            guardrail: self.name().to_string(),
            triggered,
            detail,
            info: Value::Object(info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldmail_llm::{MockBackend, RoutingMockBackend};

    fn agent(name: &str, instructions: &str) -> Arc<Agent> {
        Arc::new(
            Agent::builder()
                .with_name(name)
                .with_instructions(instructions)
                .with_model("gpt-4o-mini")
                .build()
                .unwrap(),
        )
    }

    fn checker(kind: CheckKind, instructions: &str) -> Arc<dyn Guardrail> {
        Arc::new(CheckerGuardrail::new(kind, agent("Checker", instructions)))
    }

    #[tokio::test]
    async fn test_structured_verdict() {
        let gateway = Gateway::new(Arc::new(MockBackend::with_text(
            r#"{"is_safe": false, "contains_spam_indicators": true, "reason": "ALL CAPS", "confidence": 0.9}"#,
        )));
        let sales = agent("Sales", "Write");
        let ctx = GuardrailContext {
            gateway: &gateway,
            agent: &sales,
        };

        let outcome = checker(CheckKind::ContentSafety, "safety")
            .check(&ctx, "BUY NOW")
            .await;
        assert!(outcome.triggered);
        assert_eq!(outcome.detail, "ALL CAPS");
        assert_eq!(outcome.info["safety_check"]["confidence"], 0.9);
    }

    #[tokio::test]
    async fn test_prompt_prefix_sent_to_checker() {
        let backend = Arc::new(MockBackend::with_text(r#"{"is_safe": true}"#));
        let gateway = Gateway::new(backend.clone());
        let sales = agent("Sales", "Write");
        let ctx = GuardrailContext {
            gateway: &gateway,
            agent: &sales,
        };

        let outcome = checker(CheckKind::PersonalData, "data")
            .check(&ctx, "Hello there")
            .await;
        assert!(!outcome.triggered);
        assert_eq!(
            backend.requests()[0].messages[1].content.to_text(),
            "Analyze this content for personal data: Hello there"
        );
    }

    #[tokio::test]
    async fn test_keyword_fallback() {
        let gateway = Gateway::new(Arc::new(MockBackend::with_texts([
            "This mentions Vanta directly.",
            "Looks fine to me.",
        ])));
        let sales = agent("Sales", "Write");
        let ctx = GuardrailContext {
            gateway: &gateway,
            agent: &sales,
        };
        let guardrail = checker(CheckKind::BusinessContext, "context");

        assert!(guardrail.check(&ctx, "x").await.triggered);
        assert!(!guardrail.check(&ctx, "x").await.triggered);
    }

    #[tokio::test]
    async fn test_comprehensive_ignores_failed_checker() {
        let backend = RoutingMockBackend::new()
            .route_error("SAFETY")
            .route_text("CONTEXT", r#"{"is_safe": true, "reason": "on brand"}"#)
            .route_text("DATA", r#"{"is_safe": true, "reason": "no names"}"#);
        let gateway = Gateway::new(Arc::new(backend));
        let sales = agent("Sales", "Write");
        let ctx = GuardrailContext {
            gateway: &gateway,
            agent: &sales,
        };

        let comprehensive = ComprehensiveGuardrail::new(vec![
            checker(CheckKind::ContentSafety, "SAFETY"),
            checker(CheckKind::BusinessContext, "CONTEXT"),
            checker(CheckKind::PersonalData, "DATA"),
        ]);

        let outcome = comprehensive.check(&ctx, "Hi there").await;
        assert!(!outcome.triggered);
        assert_eq!(outcome.detail, "All checks passed");
        assert_eq!(outcome.info["context_check"]["reason"], "on brand");
        assert!(outcome.info.get("safety_check").is_none());
    }

    #[tokio::test]
    async fn test_comprehensive_or_combines() {
        let backend = RoutingMockBackend::new()
            .route_text("SAFETY", r#"{"is_safe": true}"#)
            .route_text("CONTEXT", r#"{"is_safe": true}"#)
            .route_text(
                "DATA",
                r#"{"is_safe": false, "contains_personal_names": true, "reason": "names John"}"#,
            );
        let gateway = Gateway::new(Arc::new(backend));
        let sales = agent("Sales", "Write");
        let ctx = GuardrailContext {
            gateway: &gateway,
            agent: &sales,
        };

        let report = evaluate(
            &ctx,
            &[
                checker(CheckKind::ContentSafety, "SAFETY"),
                checker(CheckKind::BusinessContext, "CONTEXT"),
                checker(CheckKind::PersonalData, "DATA"),
            ],
            "Hi John",
        )
        .await;

        assert!(report.triggered());
        assert_eq!(report.reasons(), vec!["personal_data: names John"]);
    }
}
