//! Train a Q-learning agent

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use gridq_core::{Config, GoalMode};
use gridq_rl::{NoopObserver, TrainingLoop};
use tracing::{info, warn};

use crate::render::{parse_goal_line, print_report, TerminalRenderer};
use crate::settings;

#[derive(Args, Default)]
pub struct TrainArgs {
    /// Config file (defaults to GRIDQ_CONFIG, ./gridq.toml, ~/.config/gridq/gridq.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of episodes
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Step budget per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Goal mode: fixed, random_per_episode, or manual
    #[arg(long)]
    pub goal_mode: Option<GoalMode>,

    /// Fixed (or initial manual) goal as X,Y
    #[arg(long)]
    pub goal: Option<String>,

    /// Redraw the grid after every step
    #[arg(long)]
    pub render: bool,

    /// Pause between rendered steps
    #[arg(long, default_value_t = 20)]
    pub delay_ms: u64,

    /// Write the training report as JSON
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl TrainArgs {
    /// Command-line flags take precedence over file and environment
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(episodes) = self.episodes {
            config.training.num_episodes = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.training.max_steps = max_steps;
        }
        if let Some(seed) = self.seed {
            config.training.seed = Some(seed);
        }
        if let Some(mode) = self.goal_mode {
            config.goal.mode = mode;
        }
        if let Some(goal) = &self.goal {
            let (x, y) = parse_goal_line(goal).ok_or_else(|| anyhow!("Invalid goal: {goal}"))?;
            let x = usize::try_from(x).context("Goal x must not be negative")?;
            let y = usize::try_from(y).context("Goal y must not be negative")?;
            config.goal.fixed_goal = (x, y).into();
        }
        Ok(())
    }
}

pub async fn run(args: TrainArgs) -> Result<()> {
    let (mut config, _) = settings::load(args.config.as_deref())?;
    args.apply(&mut config)?;
    config.validate().context("Invalid configuration")?;

    let (tx, rx) = mpsc::channel();
    let mut trainer = TrainingLoop::new(config.clone())?.with_goal_input(rx);

    if config.goal.mode == GoalMode::Manual {
        println!("Type `x y` and press Enter to move the goal at any time");
        println!("(not on the start cell or an obstacle)\n");
        spawn_goal_reader(tx);
    } else {
        drop(tx);
    }

    let halt = trainer.halt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            halt.halt();
        }
    });

    let render = args.render;
    let delay = Duration::from_millis(args.delay_ms);
    let report = tokio::task::spawn_blocking(move || {
        if render {
            let mut renderer = TerminalRenderer::new(trainer.env(), delay);
            trainer.run(&mut renderer)
        } else {
            trainer.run(&mut NoopObserver)
        }
    })
    .await
    .context("Training task failed")?;

    println!();
    print_report(&report);

    if let Some(path) = &args.export {
        report
            .save(path)
            .with_context(|| format!("Failed to export report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

/// Forward goal requests typed on stdin. Runs on a plain thread so a pending
/// read never holds up runtime shutdown.
fn spawn_goal_reader(tx: Sender<(i64, i64)>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_goal_line(&line) {
                Some(point) => {
                    if tx.send(point).is_err() {
                        break;
                    }
                }
                None => warn!("Could not parse goal {:?}, expected `x y`", line.trim()),
            }
        }
    });
}
