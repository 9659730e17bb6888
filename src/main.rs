use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use textanchor_cli::cli::{
    cmd_create, cmd_inspect, cmd_resolve, cmd_similarity, cmd_validate, CreateArgs, InspectArgs,
    OutputFormat, ResolveArgs, SimilarityArgs, ValidateArgs,
};
use textanchor_cli::config::{apply_env_overrides, load_config};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// textanchor - resilient text anchors over document snapshots
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an anchor for a selection in a document snapshot
    Create(CreateArgs),

    /// Resolve an anchor against a (possibly changed) snapshot
    Resolve(ResolveArgs),

    /// Run the anchor validation gate
    Validate(ValidateArgs),

    /// Combined similarity score of two strings
    Similarity(SimilarityArgs),

    /// List text-bearing nodes with their structural paths
    Inspect(InspectArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_json)?;
    debug!("Starting textanchor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref()).await?;
    apply_env_overrides(&mut config)?;

    let result = match cli.command {
        Commands::Create(args) => cmd_create(args, &config, cli.output).await,
        Commands::Resolve(args) => cmd_resolve(args, &config, cli.output).await,
        Commands::Validate(args) => cmd_validate(args, &config, cli.output).await,
        Commands::Similarity(args) => cmd_similarity(args, cli.output),
        Commands::Inspect(args) => cmd_inspect(args, cli.output).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    // stdout carries command output; logs go to stderr
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    Ok(())
}
