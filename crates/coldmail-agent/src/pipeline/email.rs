//! The deterministic five-stage email pipeline.
//!
//! ```text
//! prompt ─► generate (3 personas, concurrent, guardrailed)
//!        ─► analyze (concurrent)
//!        ─► select (weighted score, first max wins)
//!        ─► subject
//!        ─► html + send
//! ```
//!
//! Stage order is fixed in code; the models only fill in content.

use coldmail_services::{EmailTransport, SendReport};
use futures::future::join_all;
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::gateway::Gateway;
use crate::guardrail::{self, GuardrailContext, GuardrailMode, GuardrailReport};
use crate::models::{EmailAnalysis, EmailSubject, SalesEmail};
use crate::pipeline::reporter::{Stage, StepSummary, run_step};
use crate::pipeline::result::EmailPipelineResult;
use crate::roles::EmailAgents;

const GENERATE: Stage = Stage::new("email", 1, 5, "Generating email variations");
const ANALYZE: Stage = Stage::new("email", 2, 5, "Analyzing emails");
const SELECT: Stage = Stage::new("email", 3, 5, "Selecting best email");
const SUBJECT: Stage = Stage::new("email", 4, 5, "Writing subject line");
const SEND: Stage = Stage::new("email", 5, 5, "Converting to HTML and sending");

const BODY_UNAVAILABLE: &str = "Email body not available";
const BODY_UNAVAILABLE_FOR_ANALYSIS: &str = "Email body not available for analysis";

// ─────────────────────────────────────────────────────────────────────────────
// Stage outputs
// ─────────────────────────────────────────────────────────────────────────────

/// One generated email and how it fared against its agent's guardrails.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub agent: String,
    pub email: SalesEmail,
    /// Whether the reply decoded into a [`SalesEmail`].
    pub structured: bool,
    pub guardrails: GuardrailReport,
}

/// Outcome of the select stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub score: f64,
    /// Score of every candidate, in candidate order.
    pub scores: Vec<f64>,
}

/// The HTML that went out and the transport's report.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub html: String,
    pub report: SendReport,
}

impl StepSummary for Vec<Variant> {
    fn step_summary(&self) -> String {
        let flagged = self.iter().filter(|v| v.guardrails.triggered()).count();
        format!("{} variants generated, {} flagged by guardrails", self.len(), flagged)
    }
}

impl StepSummary for Vec<EmailAnalysis> {
    fn step_summary(&self) -> String {
        let scores: Vec<String> = self
            .iter()
            .map(|a| format!("{}", a.effectiveness_score))
            .collect();
        format!("{} emails analyzed (scores: {})", self.len(), scores.join(", "))
    }
}

impl StepSummary for Selection {
    fn step_summary(&self) -> String {
        format!("candidate {} selected (score {:.2})", self.index + 1, self.score)
    }
}

impl StepSummary for EmailSubject {
    fn step_summary(&self) -> String {
        format!("subject \"{}\"", self.primary_subject)
    }
}

impl StepSummary for Delivery {
    fn step_summary(&self) -> String {
        format!("{:?}: {}", self.report.status, self.report.message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric weight of an analyzer's personalization level.
pub fn personalization_score(level: &str) -> f64 {
    match level.trim().to_lowercase().as_str() {
        "high" => 10.0,
        "medium" => 7.0,
        _ => 4.0,
    }
}

/// Weighted score of one candidate.
pub fn score(email: &SalesEmail, analysis: &EmailAnalysis) -> f64 {
    let cta = if analysis.has_call_to_action { 10.0 } else { 0.0 };
    0.4 * analysis.effectiveness_score
        + 0.3 * email.expected_response_rate
        + 0.2 * personalization_score(&analysis.personalization_level)
        + 0.1 * cta
}

/// The highest-scoring candidate; ties go to the earliest.
///
/// Returns `None` when there are no candidates.
pub fn select_best(emails: &[SalesEmail], analyses: &[EmailAnalysis]) -> Option<Selection> {
    let scores: Vec<f64> = emails
        .iter()
        .zip(analyses)
        .map(|(email, analysis)| score(email, analysis))
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, score)| Selection {
        index,
        score,
        scores,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

pub struct EmailPipeline {
    gateway: Gateway,
    agents: EmailAgents,
    transport: Arc<dyn EmailTransport>,
    mode: GuardrailMode,
}

impl EmailPipeline {
    pub fn new(gateway: Gateway, agents: EmailAgents, transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            gateway,
            agents,
            transport,
            mode: GuardrailMode::default(),
        }
    }

    pub fn with_guardrail_mode(mut self, mode: GuardrailMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn guardrail_mode(&self) -> GuardrailMode {
        self.mode
    }

    /// Run all five stages for `prompt`.
    pub async fn run(&self, prompt: &str) -> Result<EmailPipelineResult> {
        if prompt.trim().is_empty() {
            return Err(AgentError::invalid_argument("Prompt cannot be blank"));
        }

        let variants = run_step(&GENERATE, self.generate(prompt)).await?;
        let analyses = run_step(&ANALYZE, self.analyze(&variants)).await?;

        let emails: Vec<SalesEmail> = variants.iter().map(|v| v.email.clone()).collect();
        let selection = run_step(&SELECT, async {
            select_best(&emails, &analyses)
                .ok_or_else(|| AgentError::internal("No email candidates to select from"))
        })
        .await?;

        let winner = &variants[selection.index];
        let analysis = analyses[selection.index].clone();
        tracing::info!(agent = %winner.agent, score = selection.score, "Selected email");

        let subject = run_step(&SUBJECT, self.write_subject(&winner.email)).await?;
        let delivery = run_step(&SEND, self.deliver(&winner.email, &subject)).await?;

        Ok(EmailPipelineResult {
            selected_agent: winner.agent.clone(),
            selected: winner.email.clone(),
            analysis,
            subject,
            html: delivery.html,
            send: delivery.report,
            score: selection.score,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<Variant>> {
        let drafts = join_all(
            self.agents
                .personas()
                .into_iter()
                .map(|agent| self.draft(agent, prompt)),
        )
        .await;
        let variants = drafts.into_iter().collect::<Result<Vec<_>>>()?;

        match self.mode {
            GuardrailMode::Advisory => Ok(variants),
            GuardrailMode::Enforcing => enforce(variants),
        }
    }

    async fn draft(&self, agent: &Agent, prompt: &str) -> Result<Variant> {
        let result = self.gateway.complete(agent, prompt).await?;
        let decoded = result.decode::<SalesEmail>();
        let structured = decoded.is_structured();
        let mut email = decoded.into_value();

        if email.body.trim().is_empty() {
            email.body = if result.output.trim().is_empty() {
                BODY_UNAVAILABLE.to_string()
            } else {
                result.output.clone()
            };
        }

        let ctx = GuardrailContext {
            gateway: &self.gateway,
            agent,
        };
        let guardrails = guardrail::evaluate(&ctx, agent.guardrails(), &email.body).await;
        if guardrails.triggered() {
            tracing::warn!(
                agent = %agent.name(),
                reasons = ?guardrails.reasons(),
                mode = ?self.mode,
                "Generated email tripped guardrails"
            );
        }

        Ok(Variant {
            agent: agent.name().to_string(),
            email,
            structured,
            guardrails,
        })
    }

    async fn analyze(&self, variants: &[Variant]) -> Result<Vec<EmailAnalysis>> {
        let runs = join_all(variants.iter().map(|variant| {
            let body = non_blank(&variant.email.body, BODY_UNAVAILABLE_FOR_ANALYSIS);
            self.gateway.complete(&self.agents.analyzer, body)
        }))
        .await;

        runs.into_iter()
            .map(|run| run.map(|result| result.typed_or_fallback::<EmailAnalysis>()))
            .collect()
    }

    async fn write_subject(&self, email: &SalesEmail) -> Result<EmailSubject> {
        let body = non_blank(&email.body, BODY_UNAVAILABLE);
        let result = self.gateway.complete(&self.agents.subject_writer, body).await?;
        Ok(result.typed_or_fallback::<EmailSubject>())
    }

    async fn deliver(&self, email: &SalesEmail, subject: &EmailSubject) -> Result<Delivery> {
        let body = non_blank(&email.body, BODY_UNAVAILABLE);
        let converted = self.gateway.complete(&self.agents.html_converter, body).await?;

        let report = if converted.provider_failed {
            tracing::warn!("HTML conversion failed, sending plain-text body");
            self.transport.send_text(body, &subject.primary_subject).await
        } else {
            self.transport
                .send_html(&converted.output, &subject.primary_subject)
                .await
        };

        let html = if converted.provider_failed {
            String::new()
        } else {
            converted.output
        };
        Ok(Delivery { html, report })
    }
}

impl std::fmt::Debug for EmailPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailPipeline")
            .field("gateway", &self.gateway)
            .field("transport", &self.transport.name())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Drop tripped variants; fail when none are left.
fn enforce(variants: Vec<Variant>) -> Result<Vec<Variant>> {
    let total = variants.len();
    let mut reasons = Vec::new();
    let kept: Vec<Variant> = variants
        .into_iter()
        .filter(|v| {
            if v.guardrails.triggered() {
                reasons.extend(
                    v.guardrails
                        .reasons()
                        .into_iter()
                        .map(|r| format!("{} ({})", r, v.agent)),
                );
                false
            } else {
                true
            }
        })
        .collect();

    if kept.is_empty() {
        return Err(AgentError::GuardrailRejected(format!(
            "all {} generated emails were rejected: {}",
            total,
            reasons.join("; ")
        )));
    }
    if kept.len() < total {
        tracing::info!(kept = kept.len(), total, "Excluded variants that tripped guardrails");
    }
    Ok(kept)
}

fn non_blank<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() { fallback } else { text }
}
