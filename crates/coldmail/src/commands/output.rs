//! Human-readable rendering of pipeline results.

use coldmail_agent::{EmailPipelineResult, HybridResult, PipelineResult};
use console::Style;

pub fn print_result(result: &PipelineResult, verbose: bool) {
    match result {
        PipelineResult::Email(email) => print_email(email, verbose),
        PipelineResult::Hybrid(hybrid) => print_hybrid(hybrid, verbose),
        PipelineResult::Error(error) => {
            let red = Style::new().red().bold();
            println!("{} {}", red.apply_to("Error:"), error.message);
            if let Some(kind) = &error.error_type {
                println!("{}", Style::new().dim().apply_to(format!("Type: {}", kind)));
            }
        }
    }
}

fn print_hybrid(hybrid: &HybridResult, verbose: bool) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();

    println!("{}", bold.apply_to("Research"));
    println!(
        "  Tools used: {} ({})",
        hybrid.research.tools_used,
        if hybrid.research.tool_names.is_empty() {
            "none".to_string()
        } else {
            hybrid.research.tool_names.join(", ")
        }
    );
    if verbose {
        for line in hybrid.research.research_summary.lines() {
            println!("  {}", dim.apply_to(line));
        }
    }
    println!();

    print_email(&hybrid.email, verbose);
}

fn print_email(email: &EmailPipelineResult, verbose: bool) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();
    let status = if email.send.is_success() {
        Style::new().green().bold()
    } else {
        Style::new().red().bold()
    };

    println!("{}", bold.apply_to("Selected email"));
    println!("  Agent:   {}", email.selected_agent);
    println!("  Subject: {}", email.subject.primary_subject);
    println!("  Tone:    {}", email.selected.tone);
    println!(
        "  Score:   {:.2} (effectiveness {}/10, personalization {})",
        email.score, email.analysis.effectiveness_score, email.analysis.personalization_level
    );
    println!();
    for line in email.selected.body.lines() {
        println!("  {}", line);
    }
    println!();

    if verbose {
        if !email.subject.alternative_subjects.is_empty() {
            println!("{}", dim.apply_to("Alternative subjects:"));
            for subject in &email.subject.alternative_subjects {
                println!("{}", dim.apply_to(format!("  - {}", subject)));
            }
        }
        if !email.analysis.improvement_suggestions.is_empty() {
            println!("{}", dim.apply_to("Suggestions:"));
            for suggestion in &email.analysis.improvement_suggestions {
                println!("{}", dim.apply_to(format!("  - {}", suggestion)));
            }
        }
        println!();
    }

    println!(
        "{} {}",
        status.apply_to(email.status().to_uppercase()),
        email.send.message
    );
}
