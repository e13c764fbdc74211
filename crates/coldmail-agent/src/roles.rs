//! Factory functions for every agent role.

use coldmail_services::ServicesRegistry;
use std::sync::Arc;

use crate::agent::{Agent, AgentBuilder};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::guardrail::{CheckKind, CheckerGuardrail, ComprehensiveGuardrail, Guardrail};
use crate::models::{
    BusinessContextCheck, ContentSafetyCheck, EmailAnalysis, EmailSubject, PersonalDataCheck,
    ProspectResearch, SalesEmail,
};
use crate::prompts;
use crate::tools;

pub const PROFESSIONAL_SALES_AGENT: &str = "Professional Sales Agent (Structured)";
pub const ENGAGING_SALES_AGENT: &str = "Engaging Sales Agent (Structured)";
pub const BUSY_SALES_AGENT: &str = "Busy Sales Agent (Structured)";
pub const EMAIL_ANALYZER: &str = "Email Analyzer";
pub const SUBJECT_WRITER: &str = "Subject Writer (Structured)";
pub const HTML_CONVERTER: &str = "HTML Email Body Converter";
pub const PROSPECT_RESEARCHER: &str = "Prospect Research Agent";

fn role(name: &str, prompt_id: &str, model: &str) -> Result<AgentBuilder> {
    Ok(Agent::builder()
        .with_name(name)
        .with_instructions(prompts::load(prompt_id)?)
        .with_model(model))
}

// ─────────────────────────────────────────────────────────────────────────────
// Guardrails
// ─────────────────────────────────────────────────────────────────────────────

pub fn checker_agent(kind: CheckKind, model: &str) -> Result<Agent> {
    match kind {
        CheckKind::ContentSafety => role(
            "Content Safety Checker",
            "guardrails/content-safety-checker",
            model,
        )?
        .with_output::<ContentSafetyCheck>()
        .build(),
        CheckKind::BusinessContext => role(
            "Business Context Checker",
            "guardrails/business-context-checker",
            model,
        )?
        .with_output::<BusinessContextCheck>()
        .build(),
        CheckKind::PersonalData => role(
            "Personal Data Checker",
            "guardrails/personal-data-checker",
            model,
        )?
        .with_output::<PersonalDataCheck>()
        .build(),
    }
}

/// The three checks as separate guardrails, in [`CheckKind::ALL`] order.
pub fn sales_guardrails(model: &str) -> Result<Vec<Arc<dyn Guardrail>>> {
    CheckKind::ALL
        .iter()
        .map(|&kind| {
            let checker = Arc::new(checker_agent(kind, model)?);
            Ok(Arc::new(CheckerGuardrail::new(kind, checker)) as Arc<dyn Guardrail>)
        })
        .collect()
}

/// All three checks run concurrently as one OR-combined guardrail.
pub fn comprehensive_guardrail(model: &str) -> Result<ComprehensiveGuardrail> {
    Ok(ComprehensiveGuardrail::new(sales_guardrails(model)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Email roles
// ─────────────────────────────────────────────────────────────────────────────

fn sales_agent(
    name: &str,
    prompt_id: &str,
    model: &str,
    guardrails: &[Arc<dyn Guardrail>],
) -> Result<Agent> {
    role(name, prompt_id, model)?
        .with_output::<SalesEmail>()
        .with_guardrails(guardrails.iter().cloned())
        .build()
}

pub fn professional_sales_agent(model: &str, guardrails: &[Arc<dyn Guardrail>]) -> Result<Agent> {
    sales_agent(
        PROFESSIONAL_SALES_AGENT,
        "sales/professional-sales-agent",
        model,
        guardrails,
    )
}

pub fn engaging_sales_agent(model: &str, guardrails: &[Arc<dyn Guardrail>]) -> Result<Agent> {
    sales_agent(
        ENGAGING_SALES_AGENT,
        "sales/engaging-sales-agent",
        model,
        guardrails,
    )
}

pub fn busy_sales_agent(model: &str, guardrails: &[Arc<dyn Guardrail>]) -> Result<Agent> {
    sales_agent(BUSY_SALES_AGENT, "sales/busy-sales-agent", model, guardrails)
}

pub fn email_analyzer(model: &str) -> Result<Agent> {
    role(EMAIL_ANALYZER, "email/email-analyzer-agent", model)?
        .with_output::<EmailAnalysis>()
        .build()
}

pub fn subject_writer(model: &str) -> Result<Agent> {
    role(SUBJECT_WRITER, "email/subject-writer-agent", model)?
        .with_output::<EmailSubject>()
        .build()
}

pub fn html_converter(model: &str) -> Result<Agent> {
    role(HTML_CONVERTER, "email/html-converter-agent", model)?.build()
}

/// The agents the email pipeline runs, built once and shared.
#[derive(Debug, Clone)]
pub struct EmailAgents {
    pub professional: Arc<Agent>,
    pub engaging: Arc<Agent>,
    pub busy: Arc<Agent>,
    pub analyzer: Arc<Agent>,
    pub subject_writer: Arc<Agent>,
    pub html_converter: Arc<Agent>,
}

impl EmailAgents {
    /// Build every email role; the sales personas carry `guardrails`.
    pub fn new(model: &str, guardrails: &[Arc<dyn Guardrail>]) -> Result<Self> {
        Ok(Self {
            professional: Arc::new(professional_sales_agent(model, guardrails)?),
            engaging: Arc::new(engaging_sales_agent(model, guardrails)?),
            busy: Arc::new(busy_sales_agent(model, guardrails)?),
            analyzer: Arc::new(email_analyzer(model)?),
            subject_writer: Arc::new(subject_writer(model)?),
            html_converter: Arc::new(html_converter(model)?),
        })
    }

    /// The sales personas in generation order.
    pub fn personas(&self) -> [&Arc<Agent>; 3] {
        [&self.professional, &self.engaging, &self.busy]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Research roles
// ─────────────────────────────────────────────────────────────────────────────

pub fn website_analyzer(model: &str) -> Result<Agent> {
    role(
        "Company Website Analyzer",
        "research/analyzers/company-website-analyzer-agent",
        model,
    )?
    .build()
}

pub fn linkedin_analyzer(model: &str) -> Result<Agent> {
    role(
        "LinkedIn Company Analyzer",
        "research/analyzers/linkedin-company-analyzer",
        model,
    )?
    .build()
}

pub fn news_analyzer(model: &str) -> Result<Agent> {
    role(
        "News and Press Analyzer",
        "research/analyzers/news-and-press-analyzer-agent",
        model,
    )?
    .build()
}

pub fn competitor_analyzer(model: &str) -> Result<Agent> {
    role(
        "Competitor Analyzer",
        "research/analyzers/competitor-analyzer-agent",
        model,
    )?
    .build()
}

/// The research agent with its four analyzer tools.
///
/// Each tool runs its analyzer through `gateway`; the service-backed ones
/// use the scrapers owned by `services`.
pub fn prospect_researcher(
    model: &str,
    gateway: &Gateway,
    services: &ServicesRegistry,
) -> Result<Agent> {
    role(PROSPECT_RESEARCHER, "research/prospect-research-agent", model)?
        .with_output::<ProspectResearch>()
        .with_tool(tools::website_tool(
            Arc::new(website_analyzer(model)?),
            gateway.clone(),
            services.web_scraper().clone(),
        ))
        .with_tool(tools::linkedin_tool(
            Arc::new(linkedin_analyzer(model)?),
            gateway.clone(),
            services.linkedin_scraper().clone(),
        ))
        .with_tool(tools::news_tool(
            Arc::new(news_analyzer(model)?),
            gateway.clone(),
            services.news_search().clone(),
        ))
        .with_tool(tools::competitive_tool(
            Arc::new(competitor_analyzer(model)?),
            gateway.clone(),
        ))
        .build()
}
