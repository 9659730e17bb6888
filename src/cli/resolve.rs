use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use text_locator::{AnchorCoordinator, AttemptVerdict, ResolutionReport};

use super::io::{read_anchor, read_tree};
use super::output::{emit, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Current document snapshot (JSON node description)
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,

    /// Anchor JSON produced by `create`
    #[arg(long, value_name = "FILE")]
    pub anchor: PathBuf,

    /// Override the resolution time budget
    #[arg(long)]
    pub budget_ms: Option<u64>,
}

pub async fn cmd_resolve(args: ResolveArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let tree = read_tree(&args.tree).await?;
    let anchor = read_anchor(&args.anchor).await?;

    let mut engine = config.engine.clone();
    if let Some(budget_ms) = args.budget_ms {
        engine = engine.with_time_budget_ms(budget_ms);
    }
    let coordinator = AnchorCoordinator::new(engine);
    let report = coordinator.resolve_with_report(&anchor, &tree);

    emit(&report, output, print_report)?;

    if !report.outcome.is_success() {
        bail!("Anchor did not resolve ({:?})", report.outcome);
    }
    Ok(())
}

fn print_report(report: &ResolutionReport) {
    match &report.resolved {
        Some(resolved) => println!(
            "resolved via {}: '{}' at {} [{}..{}] similarity={:.3} checksum={}",
            resolved.strategy,
            resolved.span.text,
            resolved.span.container,
            resolved.span.range.start,
            resolved.span.range.end,
            resolved.similarity,
            if resolved.checksum_verified {
                "verified"
            } else {
                "changed"
            }
        ),
        None => println!("not found ({:?})", report.outcome),
    }
    for attempt in &report.attempts {
        let verdict = match &attempt.verdict {
            AttemptVerdict::Validated => "validated".to_string(),
            AttemptVerdict::Rejected { similarity } => format!("rejected ({similarity:.3})"),
            AttemptVerdict::NoCandidate => "no candidate".to_string(),
            AttemptVerdict::Errored { message } => format!("error: {message}"),
        };
        println!(
            "  {:<13} {:<24} {:.3}ms",
            attempt.strategy.name(),
            verdict,
            attempt.elapsed_ms
        );
    }
    println!("elapsed: {:.3}ms", report.elapsed_ms);
}
