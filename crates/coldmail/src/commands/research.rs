//! Research command - research a prospect, then run the email pipeline.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, Session, finish};

/// Arguments for the research command.
#[derive(Args, Debug)]
pub struct ResearchArgs {
    /// Company to research
    #[arg(required = true)]
    pub company: String,

    /// Role of the person the email is addressed to
    #[arg(required = true)]
    pub role: String,
}

/// Run the research command.
pub async fn run(args: ResearchArgs, ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;

    if !ctx.json_output {
        let dim = Style::new().dim();
        println!("Researching {} for the {}...", args.company, args.role);
        println!(
            "{}",
            dim.apply_to(format!(
                "Phase 1: tool-calling research (up to {} round-trips)",
                ctx.max_iterations
            ))
        );
        println!("{}", dim.apply_to("Phase 2: generate -> analyze -> select -> subject -> send"));
        println!();
    }

    let result = session.manager.run_hybrid(&args.company, &args.role).await;
    session.close();
    finish(&result, ctx)
}
