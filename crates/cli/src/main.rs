//! Indexing replay
//!
//! Replays a recorded log of repository lifecycle events through the
//! indexing stack, one unit of work per transaction, and prints what each
//! commit hands off to the search-index writer.
//!
//! ## Usage
//!
//! ```text
//! indexing-replay events.json --config stacker.toml --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use indexing_stack::StackerConfig;
use std::path::PathBuf;

mod replay;

#[derive(Debug, Parser)]
#[command(
    name = "indexing-replay",
    version,
    about = "Replay document events through the indexing stack"
)]
struct Cli {
    /// JSON event log to replay
    log: PathBuf,

    /// TOML stacker configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Repository name for events that do not carry one
    #[arg(long, default_value = "default")]
    repository: String,

    /// Print one JSON object per transaction
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StackerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StackerConfig::default(),
    };

    let raw = std::fs::read(&cli.log)
        .with_context(|| format!("failed to read event log {}", cli.log.display()))?;
    let log: replay::EventLog = serde_json::from_slice(&raw)
        .with_context(|| format!("invalid event log {}", cli.log.display()))?;

    log::info!(
        "Replaying {} transactions from {}",
        log.transactions.len(),
        cli.log.display()
    );

    for report in replay::replay(&log, &config, &cli.repository)? {
        if cli.json {
            println!("{}", serde_json::to_string(&report.to_json()?)?);
        } else {
            println!("{}", report.render());
        }
    }
    Ok(())
}
