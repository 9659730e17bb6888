use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use text_locator::AnchorCoordinator;

use super::io::read_anchor;
use super::output::{emit, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Anchor JSON to check
    #[arg(long, value_name = "FILE")]
    pub anchor: PathBuf,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub async fn cmd_validate(args: ValidateArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let anchor = read_anchor(&args.anchor).await?;
    let coordinator = AnchorCoordinator::new(config.engine.clone());
    let verdict = coordinator.check_anchor(&anchor);

    let payload = ValidationOutput {
        valid: verdict.is_ok(),
        reason: verdict.as_ref().err().map(|err| err.to_string()),
    };
    emit(&payload, output, |payload| match &payload.reason {
        None => println!("valid"),
        Some(reason) => println!("invalid: {reason}"),
    })?;

    if let Err(err) = verdict {
        bail!(err);
    }
    Ok(())
}
