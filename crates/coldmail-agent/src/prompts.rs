//! Agent instructions, embedded at compile time from `prompts/`.
//!
//! Prompt ids are the file paths under `prompts/` without the `.md`
//! extension, e.g. `sales/busy-sales-agent`.

use crate::error::{AgentError, Result};

const PROMPTS: &[(&str, &str)] = &[
    (
        "sales/professional-sales-agent",
        include_str!("../prompts/sales/professional-sales-agent.md"),
    ),
    (
        "sales/engaging-sales-agent",
        include_str!("../prompts/sales/engaging-sales-agent.md"),
    ),
    (
        "sales/busy-sales-agent",
        include_str!("../prompts/sales/busy-sales-agent.md"),
    ),
    (
        "email/email-analyzer-agent",
        include_str!("../prompts/email/email-analyzer-agent.md"),
    ),
    (
        "email/subject-writer-agent",
        include_str!("../prompts/email/subject-writer-agent.md"),
    ),
    (
        "email/html-converter-agent",
        include_str!("../prompts/email/html-converter-agent.md"),
    ),
    (
        "research/prospect-research-agent",
        include_str!("../prompts/research/prospect-research-agent.md"),
    ),
    (
        "research/analyzers/company-website-analyzer-agent",
        include_str!("../prompts/research/analyzers/company-website-analyzer-agent.md"),
    ),
    (
        "research/analyzers/linkedin-company-analyzer",
        include_str!("../prompts/research/analyzers/linkedin-company-analyzer.md"),
    ),
    (
        "research/analyzers/news-and-press-analyzer-agent",
        include_str!("../prompts/research/analyzers/news-and-press-analyzer-agent.md"),
    ),
    (
        "research/analyzers/competitor-analyzer-agent",
        include_str!("../prompts/research/analyzers/competitor-analyzer-agent.md"),
    ),
    (
        "guardrails/content-safety-checker",
        include_str!("../prompts/guardrails/content-safety-checker.md"),
    ),
    (
        "guardrails/business-context-checker",
        include_str!("../prompts/guardrails/business-context-checker.md"),
    ),
    (
        "guardrails/personal-data-checker",
        include_str!("../prompts/guardrails/personal-data-checker.md"),
    ),
];

/// Instructions for the prompt `id`, trimmed.
pub fn load(id: &str) -> Result<&'static str> {
    PROMPTS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, text)| text.trim())
        .ok_or_else(|| AgentError::config(format!("Unknown prompt id: {}", id)))
}

/// Every known prompt id.
pub fn ids() -> impl Iterator<Item = &'static str> {
    PROMPTS.iter().map(|(id, _)| *id)
}
