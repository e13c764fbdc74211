//! coldmail - researched, scored and guardrailed cold sales email
//!
//! Main entry point for the coldmail CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{prompt, research};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// coldmail - write, score and send cold sales email with LLM agents
#[derive(Parser)]
#[command(name = "coldmail")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Maximum tool-calling round-trips during research
    #[arg(long, global = true, default_value_t = coldmail_agent::DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// Drop generated emails that trip a guardrail instead of only logging
    #[arg(long, global = true)]
    pub enforce_guardrails: bool,

    /// Log the final email instead of sending it
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate, score and send an email from a prompt
    Prompt(prompt::PromptArgs),

    /// Research a company, then write and send a personalized email
    Research(research::ResearchArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "coldmail=debug,coldmail_agent=debug,coldmail_llm=debug,coldmail_services=debug,coldmail_config=debug,info"
    } else {
        "coldmail=info,coldmail_agent=info,coldmail_services=info,warn"
    };

    let log_dir = dirs::data_local_dir()
        .map(|d| d.join("coldmail").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "coldmail.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "coldmail=trace,coldmail_agent=trace,coldmail_llm=trace,coldmail_services=trace,coldmail_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        max_iterations: cli.max_iterations,
        enforce_guardrails: cli.enforce_guardrails,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Prompt(args) => prompt::run(args, &ctx).await,
        Commands::Research(args) => research::run(args, &ctx).await,
    }
}
