//! GridQ CLI - Train and inspect gridworld Q-learning runs
//!
//! `gridq train` runs a session headlessly (or with `--render`), prints the
//! learned values and greedy policy, and can export the report for
//! `gridq inspect`.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::cast_precision_loss)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;
mod settings;

use commands::{config, inspect, train};

#[derive(Parser)]
#[command(name = "gridq")]
#[command(author, version, about = "GridQ - tabular Q-learning on a gridworld", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent and print what it learned
    Train(train::TrainArgs),

    /// Show an exported training report
    Inspect(inspect::InspectArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gridq={log_level},gridq_rl={log_level},gridq_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Train(args) => train::run(args).await,
        Commands::Inspect(args) => inspect::run(args).await,
        Commands::Config(cmd) => config::run(cmd).await,
    }
}
