//! Prompt command - run the email pipeline on a written brief.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, Session, finish};

const DEFAULT_PROMPT: &str = "Write a cold sales email for ComplAI, our SOC2 compliance automation platform.\n\n\
Target: CTO at a 200-person SaaS company\n\
Pain point: Manual audit preparation taking weeks of engineering time\n\
Value prop: Reduce audit prep from weeks to days with AI automation\n\
Goal: Schedule a 15-minute demo call";

/// Arguments for the prompt command.
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// The brief for the email (a SOC2 demo pitch to a SaaS CTO when omitted)
    pub prompt: Option<String>,
}

/// Run the prompt command.
pub async fn run(args: PromptArgs, ctx: &Context) -> Result<()> {
    let prompt = args.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let session = Session::open(ctx)?;

    if !ctx.json_output {
        let dim = Style::new().dim();
        println!(
            "{}",
            dim.apply_to("Pipeline: generate -> analyze -> select -> subject -> send")
        );
        println!(
            "{}",
            dim.apply_to(format!("Sending to: {}", session.settings.to_email))
        );
        println!();
    }

    let result = session.manager.run_prompt(&prompt).await;
    session.close();
    finish(&result, ctx)
}
