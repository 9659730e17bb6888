use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use text_locator::{
    compute_offset, resolve_path, AnchorCoordinator, FlatText, TextSelection,
};
use tracing::debug;

use super::io::read_tree;
use super::output::{emit, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Document snapshot (JSON node description)
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,

    /// Structural path of the selection's container, e.g. /article[1]/p[2]
    #[arg(long)]
    pub container: String,

    /// Selected text
    #[arg(long)]
    pub text: String,

    /// Text immediately before the selection; captured from the tree when omitted
    #[arg(long)]
    pub before: Option<String>,

    /// Text immediately after the selection; captured from the tree when omitted
    #[arg(long)]
    pub after: Option<String>,

    /// Logical id of the container (message, section, ...)
    #[arg(long)]
    pub container_id: String,

    /// Char offset where the selection starts in the container text
    #[arg(long, requires = "end")]
    pub start: Option<usize>,

    /// Char offset where the selection ends (exclusive)
    #[arg(long, requires = "start")]
    pub end: Option<usize>,
}

pub async fn cmd_create(args: CreateArgs, config: &Config, output: OutputFormat) -> Result<()> {
    let tree = read_tree(&args.tree).await?;
    let container = resolve_path(&tree, &args.container)
        .with_context(|| format!("Container {} not found in tree", args.container))?;

    let mut selection = TextSelection::new(args.text.as_str(), container, args.container_id.as_str());
    let range = match (args.start, args.end) {
        (Some(start), Some(end)) => {
            selection = selection.with_range(start..end);
            Some(start..end)
        }
        _ => None,
    };

    let (before, after) = match (args.before, args.after) {
        (None, None) => {
            let flat = FlatText::build(&tree, container);
            let start = match &range {
                Some(range) => range.start,
                None => match compute_offset(&tree, container, &args.text) {
                    Some(start) => start,
                    None => bail!("'{}' does not occur under {}", args.text, args.container),
                },
            };
            let end = start + args.text.chars().count();
            debug!(start, end, "Capturing context from the tree");
            (
                flat.before(start, config.context_chars).to_string(),
                flat.after(end, config.context_chars).to_string(),
            )
        }
        (before, after) => (before.unwrap_or_default(), after.unwrap_or_default()),
    };
    selection = selection.with_context(before, after);

    let coordinator = AnchorCoordinator::new(config.engine.clone());
    let anchor = coordinator
        .create_anchor(&selection, &tree)
        .context("Failed to create anchor")?;

    // anchors are always printed as data
    let output = match output {
        OutputFormat::Human => OutputFormat::Json,
        other => other,
    };
    emit(&anchor, output, |_| {})
}
