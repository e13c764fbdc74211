//! Results handed back to callers of the sales manager.

use coldmail_services::SendReport;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::error::AgentError;
use crate::models::{EmailAnalysis, EmailSubject, SalesEmail};

/// Steps of the deterministic email pipeline, in order.
pub const EMAIL_PIPELINE_STEPS: [&str; 6] =
    ["generate", "analyze", "select", "subject", "html", "send"];

// ─────────────────────────────────────────────────────────────────────────────
// Email pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the email pipeline decided and did.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailPipelineResult {
    /// Agent that wrote the winning email.
    pub selected_agent: String,
    pub selected: SalesEmail,
    pub analysis: EmailAnalysis,
    pub subject: EmailSubject,
    /// The HTML body that was sent.
    pub html: String,
    pub send: SendReport,
    /// Weighted score of the winner.
    pub score: f64,
}

impl EmailPipelineResult {
    /// `"success"` iff the transport reported success.
    pub fn status(&self) -> &'static str {
        if self.send.is_success() { "success" } else { "error" }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status(),
            "selected_email": {
                "subject": self.subject.primary_subject,
                "body": self.selected.body,
                "tone": self.selected.tone,
                "expected_response_rate": self.selected.expected_response_rate,
            },
            "analysis": {
                "effectiveness_score": self.analysis.effectiveness_score,
                "personalization_level": self.analysis.personalization_level,
                "strengths": self.analysis.strengths,
                "improvement_suggestions": self.analysis.improvement_suggestions,
            },
            "subject_options": {
                "primary": self.subject.primary_subject,
                "alternatives": self.subject.alternative_subjects,
                "predicted_open_rate": self.subject.predicted_open_rate,
                "subject_type": self.subject.subject_type,
            },
            "email_result": self.send,
        })
    }
}

impl Serialize for EmailPipelineResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hybrid
// ─────────────────────────────────────────────────────────────────────────────

/// Research phase metadata of a hybrid run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchPhase {
    pub tools_used: usize,
    pub tool_names: Vec<String>,
    pub research_summary: String,
}

/// Email phase metadata of a hybrid run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPhase {
    pub pattern: String,
    pub steps: Vec<String>,
}

impl Default for EmailPhase {
    fn default() -> Self {
        Self {
            pattern: "manual-orchestration".to_string(),
            steps: EMAIL_PIPELINE_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Research followed by the email pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridResult {
    pub email: EmailPipelineResult,
    pub research: ResearchPhase,
    pub email_phase: EmailPhase,
}

impl HybridResult {
    pub fn status(&self) -> &'static str {
        self.email.status()
    }

    pub fn to_json(&self) -> Value {
        let mut out = self.email.to_json();
        if let Value::Object(map) = &mut out {
            map.insert("pattern".to_string(), json!("hybrid"));
            map.insert(
                "research_phase".to_string(),
                json!({
                    "pattern": "agent-of-agents",
                    "tools_used": self.research.tools_used,
                    "tool_names": self.research.tool_names,
                    "research_summary": self.research.research_summary,
                }),
            );
            map.insert("email_phase".to_string(), json!(self.email_phase));
        }
        out
    }
}

impl Serialize for HybridResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors and the caller-facing union
// ─────────────────────────────────────────────────────────────────────────────

/// A run that could not complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            error_type: None,
        }
    }

    pub fn from_error(prefix: &str, error: &AgentError) -> Self {
        Self {
            status: "error",
            message: format!("{}: {}", prefix, error),
            error_type: Some(error.kind().to_string()),
        }
    }
}

/// What `run_prompt` and `run_hybrid` return.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineResult {
    Email(EmailPipelineResult),
    Hybrid(HybridResult),
    Error(ErrorResult),
}

impl PipelineResult {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Email(r) => r.status(),
            Self::Hybrid(r) => r.status(),
            Self::Error(_) => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == "success"
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Email(r) => r.to_json(),
            Self::Hybrid(r) => r.to_json(),
            Self::Error(r) => json!(r),
        }
    }
}
