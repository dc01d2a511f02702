//! Inspect an exported training report

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gridq_rl::TrainingReport;

use crate::render::print_report;

#[derive(Args)]
pub struct InspectArgs {
    /// Report written by `gridq train --export`
    pub path: PathBuf,

    /// Print the raw JSON instead of the summary
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: InspectArgs) -> Result<()> {
    let report = TrainingReport::load(&args.path)
        .with_context(|| format!("Failed to load report from {}", args.path.display()))?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }
    Ok(())
}
