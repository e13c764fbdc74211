//! Prospect research: one tool-calling run, then a prose summary.

use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::gateway::ExecutionResult;
use crate::models::ProspectResearch;
use crate::pipeline::reporter::{Stage, StepSummary, run_step};
use crate::tool_loop::ToolLoop;

const FETCH: Stage = Stage::new("research", 1, 2, "Researching prospect");
const SUMMARIZE: Stage = Stage::new("research", 2, 2, "Building research summary");

/// Prompt handed to the research agent.
pub fn research_prompt(company: &str, role: &str) -> String {
    format!(
        "Research {company} to enable highly personalized cold sales outreach.\n\n\
         Target role: {role}\n\
         Our product: ComplAI - SOC2 compliance automation platform\n\n\
         Focus your research on:\n\
         - Company size, industry, and growth stage\n\
         - Pain points related to compliance, audits, or security\n\
         - Recent news or events that create outreach opportunities\n\
         - How SOC2 compliance affects their business\n\n\
         Use the available research tools to gather this information."
    )
}

/// Everything the research phase produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchOutcome {
    pub research: ProspectResearch,
    /// Whether the agent's final reply decoded into [`ProspectResearch`].
    pub structured: bool,
    pub summary: String,
    pub tool_calls: usize,
    pub tool_names: Vec<String>,
    pub execution: ExecutionResult,
}

impl StepSummary for ExecutionResult {
    fn step_summary(&self) -> String {
        format!(
            "{} tool calls ({}), {} tokens",
            self.tool_calls,
            if self.tools_used.is_empty() {
                "none".to_string()
            } else {
                self.tools_used.join(", ")
            },
            self.tokens
        )
    }
}

impl StepSummary for String {
    fn step_summary(&self) -> String {
        format!("{} characters", self.chars().count())
    }
}

#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    tool_loop: ToolLoop,
    researcher: Arc<Agent>,
}

impl ResearchPipeline {
    pub fn new(tool_loop: ToolLoop, researcher: Arc<Agent>) -> Self {
        Self {
            tool_loop,
            researcher,
        }
    }

    pub async fn run(&self, company: &str, role: &str) -> Result<ResearchOutcome> {
        if company.trim().is_empty() {
            return Err(AgentError::invalid_argument("Company name cannot be blank"));
        }
        if role.trim().is_empty() {
            return Err(AgentError::invalid_argument("Target role cannot be blank"));
        }
        tracing::info!(company, role, "Starting prospect research");

        let prompt = research_prompt(company, role);
        let execution = run_step(&FETCH, async {
            let execution = self.tool_loop.run(&self.researcher, &prompt).await?;
            if execution.max_iterations_reached {
                return Err(AgentError::MaxIterations(self.tool_loop.config().max_iterations));
            }
            Ok(execution)
        })
        .await?;

        let decoded = execution.decode::<ProspectResearch>();
        let structured = decoded.is_structured();
        let research = decoded.into_value();
        let summary = run_step(&SUMMARIZE, async { Ok(research.summary(company)) }).await?;

        Ok(ResearchOutcome {
            research,
            structured,
            summary,
            tool_calls: execution.tool_calls,
            tool_names: execution.tools_used.clone(),
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Gateway;
    use coldmail_llm::MockBackend;

    #[test]
    fn test_research_prompt() {
        let prompt = research_prompt("Stripe", "CTO");
        assert!(
            prompt.starts_with("Research Stripe to enable highly personalized cold sales outreach.")
        );
        assert!(prompt.contains("\n\nTarget role: CTO\nOur product: ComplAI"));
        assert!(prompt.ends_with("Use the available research tools to gather this information."));
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let backend = Arc::new(MockBackend::with_text("unused"));
        let researcher = Arc::new(
            Agent::builder()
                .with_name("Researcher")
                .with_instructions("Research")
                .with_model("m")
                .build()
                .unwrap(),
        );
        let pipeline =
            ResearchPipeline::new(ToolLoop::new(Gateway::new(backend.clone())), researcher);

        assert!(matches!(
            pipeline.run(" ", "CTO").await,
            Err(AgentError::InvalidArgument(_))
        ));
        assert!(matches!(
            pipeline.run("Acme", "").await,
            Err(AgentError::InvalidArgument(_))
        ));
        assert_eq!(backend.request_count(), 0);
    }
}
