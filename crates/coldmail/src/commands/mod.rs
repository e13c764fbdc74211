//! CLI command handlers.

pub mod output;
pub mod prompt;
pub mod research;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use coldmail_agent::{GuardrailMode, ManagerConfig, PipelineResult, SalesManager};
use coldmail_config::Settings;
use coldmail_llm::{OpenAiBackend, OpenAiConfig};
use coldmail_services::{DryRunTransport, ServicesRegistry};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Cap on research round-trips.
    pub max_iterations: u32,
    /// Exclude variants that trip a guardrail.
    pub enforce_guardrails: bool,
    /// Record the email instead of sending it.
    pub dry_run: bool,
}

/// A manager plus the services it runs on.
///
/// The registry shuts its resources down when dropped, so it lives exactly
/// as long as the manager that uses it.
pub struct Session {
    pub manager: SalesManager,
    pub services: ServicesRegistry,
    pub settings: Settings,
}

impl Session {
    /// Load settings and wire the manager the way `ctx` asks.
    pub fn open(ctx: &Context) -> Result<Self> {
        let settings = Settings::load().context("Failed to load configuration")?;

        let mut openai = OpenAiConfig::openai(settings.openai_api_key.clone());
        if let Some(url) = &settings.openai_base_url {
            openai = openai.with_base_url(url.clone());
        }
        let backend = OpenAiBackend::new(openai).context("Failed to create LLM backend")?;

        let mut services = ServicesRegistry::builder().settings(settings.clone());
        if ctx.dry_run {
            services = services.email_transport(Arc::new(DryRunTransport::new()));
        }
        let services = services.build().context("Failed to initialize services")?;

        let mode = if ctx.enforce_guardrails {
            GuardrailMode::Enforcing
        } else {
            GuardrailMode::Advisory
        };
        let config = ManagerConfig::new(settings.model.clone())
            .with_max_iterations(ctx.max_iterations)
            .with_guardrail_mode(mode);

        let manager = SalesManager::new(Arc::new(backend), &services, config)
            .context("Failed to initialize sales manager")?;

        tracing::info!(
            from = %settings.from_email,
            to = %settings.to_email,
            model = %settings.model,
            dry_run = ctx.dry_run,
            "Configuration loaded"
        );

        Ok(Self {
            manager,
            services,
            settings,
        })
    }

    pub fn close(self) {
        self.services.shutdown();
    }
}

/// Print `result` and turn an error status into a failing exit.
pub fn finish(result: &PipelineResult, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    } else {
        output::print_result(result, ctx.verbose);
    }

    if result.is_success() {
        Ok(())
    } else {
        anyhow::bail!("Pipeline finished with status \"{}\"", result.status())
    }
}
