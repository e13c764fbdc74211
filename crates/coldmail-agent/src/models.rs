//! Structured outputs the agents are asked to produce.
//!
//! Every type here decodes leniently: missing fields take their defaults, and
//! each one knows how to build itself from raw text when the model ignored
//! the schema (see [`StructuredOutput::fallback`]).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::decode::StructuredOutput;

// ─────────────────────────────────────────────────────────────────────────────
// Email tone
// ─────────────────────────────────────────────────────────────────────────────

/// Register of a generated email. Unknown values read as `Professional`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EmailTone {
    #[default]
    Professional,
    Engaging,
    Casual,
    Urgent,
    Friendly,
}

impl EmailTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Engaging => "engaging",
            Self::Casual => "casual",
            Self::Urgent => "urgent",
            Self::Friendly => "friendly",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "engaging" => Self::Engaging,
            "casual" => Self::Casual,
            "urgent" => Self::Urgent,
            "friendly" => Self::Friendly,
            _ => Self::Professional,
        }
    }
}

impl From<String> for EmailTone {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}

impl fmt::Display for EmailTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sales email
// ─────────────────────────────────────────────────────────────────────────────

/// One candidate email from a sales persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesEmail {
    pub subject: String,
    pub body: String,
    pub tone: EmailTone,
    pub call_to_action: String,
    pub personalization_notes: String,
    /// Expected response rate, 0-100.
    #[serde(deserialize_with = "lenient_f64")]
    pub expected_response_rate: f64,
}

impl StructuredOutput for SalesEmail {
    const TYPE_NAME: &'static str = "SalesEmail";

    fn fallback(raw: &str) -> Self {
        Self {
            subject: "Generated Email".to_string(),
            body: raw.to_string(),
            tone: EmailTone::Professional,
            call_to_action: "Please reply if interested".to_string(),
            personalization_notes: "Generic email".to_string(),
            expected_response_rate: 10.0,
        }
    }

    fn is_unset(&self) -> bool {
        self.subject.is_empty()
            && self.body.is_empty()
            && self.tone == EmailTone::default()
            && self.call_to_action.is_empty()
            && self.personalization_notes.is_empty()
            && self.expected_response_rate == 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Email analysis
// ─────────────────────────────────────────────────────────────────────────────

/// Analyzer verdict on one candidate email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAnalysis {
    /// Overall effectiveness, 0-10.
    #[serde(deserialize_with = "lenient_f64")]
    pub effectiveness_score: f64,
    pub tone: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub word_count: u32,
    pub has_call_to_action: bool,
    /// "low", "medium" or "high".
    pub personalization_level: String,
    #[serde(deserialize_with = "string_or_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub improvement_suggestions: Vec<String>,
}

impl StructuredOutput for EmailAnalysis {
    const TYPE_NAME: &'static str = "EmailAnalysis";

    fn fallback(raw: &str) -> Self {
        Self {
            effectiveness_score: 5.0,
            tone: "professional".to_string(),
            word_count: raw.split_whitespace().count() as u32,
            has_call_to_action: true,
            personalization_level: "medium".to_string(),
            strengths: vec!["Clear and professional".to_string()],
            weaknesses: vec!["Could be more personalized".to_string()],
            improvement_suggestions: vec!["Consider more specific value propositions".to_string()],
        }
    }

    fn is_unset(&self) -> bool {
        self.effectiveness_score == 0.0
            && self.tone.is_empty()
            && self.word_count == 0
            && !self.has_call_to_action
            && self.personalization_level.is_empty()
            && self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.improvement_suggestions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subject options
// ─────────────────────────────────────────────────────────────────────────────

const MAX_FALLBACK_SUBJECT_CHARS: usize = 100;

const FALLBACK_ALTERNATIVE_SUBJECTS: [&str; 3] = [
    "ComplAI: Streamline Your SOC2 Audit Process",
    "Cut Your Audit Prep Time by 80% with AI",
    "From Weeks to Days: Automate Your SOC2 Compliance",
];

/// Subject line options for the selected email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSubject {
    pub primary_subject: String,
    #[serde(deserialize_with = "string_or_list")]
    pub alternative_subjects: Vec<String>,
    pub subject_type: String,
    /// Predicted open rate, 0-100.
    #[serde(deserialize_with = "lenient_f64")]
    pub predicted_open_rate: f64,
}

impl StructuredOutput for EmailSubject {
    const TYPE_NAME: &'static str = "EmailSubject";

    fn fallback(raw: &str) -> Self {
        let mut primary: String = raw.chars().take(MAX_FALLBACK_SUBJECT_CHARS).collect();
        if raw.chars().count() > MAX_FALLBACK_SUBJECT_CHARS {
            primary.push_str("...");
        }

        Self {
            primary_subject: primary,
            alternative_subjects: FALLBACK_ALTERNATIVE_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            subject_type: "benefit".to_string(),
            predicted_open_rate: 25.0,
        }
    }

    fn is_unset(&self) -> bool {
        self.primary_subject.is_empty()
            && self.alternative_subjects.is_empty()
            && self.subject_type.is_empty()
            && self.predicted_open_rate == 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prospect research
// ─────────────────────────────────────────────────────────────────────────────

/// Findings of the research agent about one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProspectResearch {
    pub company_overview: String,
    pub company_size: String,
    pub industry: String,
    #[serde(deserialize_with = "string_or_list")]
    pub key_pain_points: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub personalization_opportunities: Vec<String>,
    pub recommended_approach: String,
    #[serde(deserialize_with = "string_or_list")]
    pub recent_hooks: Vec<String>,
    pub confidence_level: String,
}

impl ProspectResearch {
    /// Prose summary handed to the email phase.
    pub fn summary(&self, company_name: &str) -> String {
        let mut out = format!("Company: {}\n", company_name);
        out.push_str(&format!(
            "Overview: {}\n",
            or_default(&self.company_overview, "Not available")
        ));
        out.push_str(&format!("Size: {}\n", or_default(&self.company_size, "Unknown")));
        out.push_str(&format!("Industry: {}\n", or_default(&self.industry, "Unknown")));

        out.push_str("\nKey Pain Points:\n");
        push_bullets(&mut out, &self.key_pain_points, "Not specified");

        out.push_str("\nPersonalization Hooks:\n");
        push_bullets(
            &mut out,
            &self.personalization_opportunities,
            "General personalization",
        );

        out.push_str(&format!(
            "\nRecommended Approach: {}",
            or_default(&self.recommended_approach, "Use general SOC2 positioning")
        ));

        if !self.recent_hooks.is_empty() {
            out.push_str("\n\nRecent News:\n");
            push_bullets(&mut out, &self.recent_hooks, "");
        }

        out
    }
}

impl StructuredOutput for ProspectResearch {
    const TYPE_NAME: &'static str = "ProspectResearch";

    fn fallback(raw: &str) -> Self {
        Self {
            company_overview: raw.to_string(),
            company_size: "Unknown".to_string(),
            industry: "Unknown".to_string(),
            key_pain_points: vec!["Not specified".to_string()],
            personalization_opportunities: vec!["General personalization".to_string()],
            recommended_approach: "Use general SOC2 positioning".to_string(),
            recent_hooks: Vec::new(),
            confidence_level: "low".to_string(),
        }
    }

    fn is_unset(&self) -> bool {
        self.company_overview.is_empty()
            && self.company_size.is_empty()
            && self.industry.is_empty()
            && self.key_pain_points.is_empty()
            && self.personalization_opportunities.is_empty()
            && self.recommended_approach.is_empty()
            && self.recent_hooks.is_empty()
            && self.confidence_level.is_empty()
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

fn push_bullets(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        out.push_str(&format!("- {}\n", empty));
        return;
    }
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Guardrail checks
// ─────────────────────────────────────────────────────────────────────────────

/// Verdict of the content-safety checker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSafetyCheck {
    pub is_safe: bool,
    pub contains_spam_indicators: bool,
    pub inappropriate_content: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub policy_violations: Vec<String>,
    pub reason: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub confidence: f64,
}

impl StructuredOutput for ContentSafetyCheck {
    const TYPE_NAME: &'static str = "ContentSafetyCheck";

    fn fallback(raw: &str) -> Self {
        Self {
            is_safe: true,
            reason: raw.to_string(),
            ..Self::default()
        }
    }

    fn is_unset(&self) -> bool {
        !self.is_safe
            && !self.contains_spam_indicators
            && !self.inappropriate_content
            && self.policy_violations.is_empty()
            && self.reason.is_empty()
            && self.confidence == 0.0
    }
}

/// Verdict of the business-context checker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessContextCheck {
    pub is_safe: bool,
    pub mentions_competitors: bool,
    pub off_brand_messaging: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub compliance_issues: Vec<String>,
    pub reason: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub confidence: f64,
}

impl StructuredOutput for BusinessContextCheck {
    const TYPE_NAME: &'static str = "BusinessContextCheck";

    fn fallback(raw: &str) -> Self {
        Self {
            is_safe: true,
            reason: raw.to_string(),
            ..Self::default()
        }
    }

    fn is_unset(&self) -> bool {
        !self.is_safe
            && !self.mentions_competitors
            && !self.off_brand_messaging
            && self.compliance_issues.is_empty()
            && self.reason.is_empty()
            && self.confidence == 0.0
    }
}

/// Verdict of the personal-data checker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDataCheck {
    pub is_safe: bool,
    pub contains_personal_names: bool,
    pub contains_sensitive_data: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub data_types_found: Vec<String>,
    pub reason: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub confidence: f64,
}

impl StructuredOutput for PersonalDataCheck {
    const TYPE_NAME: &'static str = "PersonalDataCheck";

    fn fallback(raw: &str) -> Self {
        Self {
            is_safe: true,
            reason: raw.to_string(),
            ..Self::default()
        }
    }

    fn is_unset(&self) -> bool {
        !self.is_safe
            && !self.contains_personal_names
            && !self.contains_sensitive_data
            && self.data_types_found.is_empty()
            && self.reason.is_empty()
            && self.confidence == 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serde helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Accept either a JSON list of strings or a single string (split into one
/// item per non-empty line). `null` reads as an empty list.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(text)) => text
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Accept a JSON number or a numeric string such as `"15"` or `"15%"`.
/// `null` reads as zero.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrText::Number(value)) => Ok(value),
        Some(NumberOrText::Text(text)) => {
            let trimmed = text.trim().trim_end_matches('%').trim_end();
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {text:?}")))
        }
    }
}

/// Like [`lenient_f64`], rounded to a whole non-negative count.
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    if value < 0.0 {
        return Err(serde::de::Error::custom(format!("expected a count, got {value}")));
    }
    Ok(value.round().min(f64::from(u32::MAX)) as u32)
}
