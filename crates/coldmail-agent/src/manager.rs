//! The caller-facing entry point.
//!
//! [`SalesManager`] wires every agent role to one gateway and exposes the two
//! workflows:
//!
//! - [`SalesManager::run_prompt`]: the deterministic email pipeline on a
//!   caller-written prompt.
//! - [`SalesManager::run_hybrid`]: tool-calling prospect research first, then
//!   the email pipeline on a prompt enriched with the research summary.
//!
//! Both return a [`PipelineResult`]; failures come back as
//! [`PipelineResult::Error`] rather than as `Err`.

use coldmail_llm::SharedBackend;
use coldmail_services::ServicesRegistry;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::gateway::{Gateway, GatewayConfig};
use crate::guardrail::GuardrailMode;
use crate::pipeline::{
    EmailPhase, EmailPipeline, ErrorResult, HybridResult, PipelineResult, ResearchPhase,
    ResearchPipeline,
};
use crate::roles::{self, EmailAgents};
use crate::tool_loop::{LoopConfig, ToolLoop};

/// Knobs for a [`SalesManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub model: String,
    pub gateway: GatewayConfig,
    pub tool_loop: LoopConfig,
    pub guardrail_mode: GuardrailMode,
}

impl ManagerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            gateway: GatewayConfig::default(),
            tool_loop: LoopConfig::default(),
            guardrail_mode: GuardrailMode::default(),
        }
    }

    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.tool_loop.max_iterations = max_iterations;
        self
    }

    pub fn with_guardrail_mode(mut self, mode: GuardrailMode) -> Self {
        self.guardrail_mode = mode;
        self
    }
}

/// Email prompt for the hybrid workflow.
pub fn enhanced_prompt(company: &str, role: &str, research_summary: &str) -> String {
    format!(
        "Write a highly personalized cold sales email for ComplAI (SOC2 compliance automation platform).\n\n\
         Target: {role} at {company}\n\n\
         RESEARCH INSIGHTS:\n{research_summary}\n\n\
         REQUIREMENTS:\n\
         - Use the research insights to make the email feel personal and relevant\n\
         - Reference specific pain points or opportunities identified in research\n\
         - Mention recent news/events if available\n\
         - Keep tone professional but approachable\n\
         - Clear call to action for a 15-minute demo"
    )
}

#[derive(Debug)]
pub struct SalesManager {
    email: EmailPipeline,
    research: ResearchPipeline,
}

impl SalesManager {
    /// Build every role against `backend`, sending through `services`' transport.
    pub fn new(
        backend: SharedBackend,
        services: &ServicesRegistry,
        config: ManagerConfig,
    ) -> Result<Self> {
        if config.tool_loop.max_iterations == 0 {
            return Err(AgentError::config("max_iterations must be at least 1"));
        }

        let gateway = Gateway::new(backend).with_config(config.gateway);
        let guardrails = roles::sales_guardrails(&config.model)?;
        let agents = EmailAgents::new(&config.model, &guardrails)?;
        let researcher = roles::prospect_researcher(&config.model, &gateway, services)?;

        tracing::info!(
            model = %config.model,
            backend = %gateway.backend().name(),
            transport = %services.email().name(),
            guardrail_mode = ?config.guardrail_mode,
            max_iterations = config.tool_loop.max_iterations,
            "Sales manager initialized"
        );

        let email = EmailPipeline::new(gateway.clone(), agents, services.email().clone())
            .with_guardrail_mode(config.guardrail_mode);
        let research = ResearchPipeline::new(
            ToolLoop::new(gateway).with_config(config.tool_loop),
            Arc::new(researcher),
        );

        Ok(Self { email, research })
    }

    /// Run the email pipeline on `prompt`.
    pub async fn run_prompt(&self, prompt: &str) -> PipelineResult {
        tracing::info!("Running email pipeline: generate, analyze, select, send");
        match self.email.run(prompt).await {
            Ok(result) => PipelineResult::Email(result),
            Err(e) => failure("Error in email pipeline", e),
        }
    }

    /// Research `company` for `role`, then write and send a personalized email.
    pub async fn run_hybrid(&self, company: &str, role: &str) -> PipelineResult {
        tracing::info!(company, role, "Running hybrid workflow");
        match self.hybrid(company, role).await {
            Ok(result) => {
                tracing::info!(
                    status = result.status(),
                    tools_used = result.research.tools_used,
                    "Hybrid workflow finished"
                );
                PipelineResult::Hybrid(result)
            }
            Err(e) => failure("Error in hybrid workflow", e),
        }
    }

    async fn hybrid(&self, company: &str, role: &str) -> Result<HybridResult> {
        let research = self.research.run(company, role).await?;
        if !research.structured {
            tracing::warn!(company, "Research reply was not structured, summary uses fallback");
        }

        let prompt = enhanced_prompt(company, role, &research.summary);
        let email = self.email.run(&prompt).await?;

        Ok(HybridResult {
            email,
            research: ResearchPhase {
                tools_used: research.tool_calls,
                tool_names: research.tool_names,
                research_summary: research.summary,
            },
            email_phase: EmailPhase::default(),
        })
    }
}

fn failure(prefix: &str, error: AgentError) -> PipelineResult {
    tracing::error!(error = %error, kind = error.kind(), "{}", prefix);
    PipelineResult::Error(ErrorResult::from_error(prefix, &error))
}
