//! Episode summaries and the end-of-training report

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridq_core::{Cell, Config, ConfigError, GoalMode, Result, RunId};

use crate::agent::{greedy_rollout, Rollout};
use crate::environment::GridEnvironment;
use crate::q_table::{QTable, ValueFunction};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    ReachedGoal,
    /// Not an error: the episode simply did not converge in time
    StepBudgetExhausted,
    Halted,
}

impl std::fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeOutcome::ReachedGoal => write!(f, "reached_goal"),
            EpisodeOutcome::StepBudgetExhausted => write!(f, "step_budget_exhausted"),
            EpisodeOutcome::Halted => write!(f, "halted"),
        }
    }
}

/// Per-episode record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// 1-based episode index
    pub episode: usize,
    /// Goal resolved at episode start
    pub goal: Cell,
    /// Goal when the episode ended (differs after a manual move)
    pub final_goal: Cell,
    pub total_reward: f64,
    pub steps: usize,
    pub outcome: EpisodeOutcome,
    /// Exploration rate after the end-of-episode decay
    pub epsilon: f64,
    pub rejected_goals: usize,
}

/// Everything a training run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub learner: String,
    pub params: serde_json::Value,
    pub config: Config,
    pub episodes: Vec<EpisodeSummary>,
    pub final_epsilon: f64,
    /// False when the run was halted before the last episode
    pub completed: bool,
    pub q_table: QTable,
    pub values: ValueFunction,
}

impl TrainingReport {
    /// Fraction of episodes that reached the goal
    pub fn success_rate(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let reached = self
            .episodes
            .iter()
            .filter(|e| e.outcome == EpisodeOutcome::ReachedGoal)
            .count();
        reached as f64 / self.episodes.len() as f64
    }

    pub fn mean_reward(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        self.episodes.iter().map(|e| e.total_reward).sum::<f64>() / self.episodes.len() as f64
    }

    pub fn total_steps(&self) -> usize {
        self.episodes.iter().map(|e| e.steps).sum()
    }

    /// Goal in force at the end of the run
    pub fn final_goal(&self) -> Cell {
        self.episodes
            .last()
            .map_or(self.config.goal.fixed_goal, |e| e.final_goal)
    }

    /// Environment with the goal pinned to [`Self::final_goal`]
    pub fn environment(&self) -> std::result::Result<GridEnvironment, ConfigError> {
        let mut config = self.config.clone();
        config.goal.mode = GoalMode::Fixed;
        config.goal.fixed_goal = self.final_goal();
        GridEnvironment::from_config(&config)
    }

    /// Greedy path under the learned table toward the final goal
    pub fn greedy_path(&self) -> Result<Rollout> {
        let env = self.environment()?;
        let limit = env.size() * env.size();
        Ok(greedy_rollout(&self.q_table, &env, limit))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a report, rejecting one whose parts disagree on the grid size
    pub fn from_json(text: &str) -> Result<Self> {
        let report: Self = serde_json::from_str(text)?;
        report.check_consistency()?;
        Ok(report)
    }

    fn check_consistency(&self) -> std::result::Result<(), ConfigError> {
        self.config.validate()?;
        let expected = self.config.grid.size;
        for (what, actual) in [("q_table", self.q_table.size()), ("values", self.values.size())] {
            if actual != expected {
                return Err(ConfigError::SizeMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
