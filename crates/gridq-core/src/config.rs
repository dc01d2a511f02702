//! Training configuration
//!
//! Every section is defaulted so a partial TOML file (or none at all) yields a
//! runnable setup. [`Config::validate`] must pass before any episode starts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::Cell;

/// Largest accepted side length; the Q-table holds `size * size * 4` values
pub const MAX_GRID_SIZE: usize = 1024;

/// Configuration for a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub rewards: RewardConfig,
    pub learning: LearningConfig,
    pub training: TrainingConfig,
    pub goal: GoalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: usize,
    pub start: Cell,
    pub obstacles: Vec<Cell>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 5,
            start: Cell::new(0, 0),
            obstacles: vec![Cell::new(2, 2)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub goal: f64,
    pub step: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            goal: 10.0,
            step: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon_start: 0.9,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub num_episodes: usize,
    pub max_steps: usize,
    /// Log a progress line every N episodes
    pub report_interval: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_episodes: 30,
            max_steps: 100,
            report_interval: 50,
            seed: None,
        }
    }
}

/// How the goal cell is chosen. Modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMode {
    /// Goal never changes
    #[default]
    Fixed,
    /// New goal drawn at the start of every episode
    RandomPerEpisode,
    /// Goal moved by external input events, starting at `fixed_goal`
    Manual,
}

impl std::fmt::Display for GoalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalMode::Fixed => write!(f, "fixed"),
            GoalMode::RandomPerEpisode => write!(f, "random_per_episode"),
            GoalMode::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for GoalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fixed" => Ok(GoalMode::Fixed),
            "random" | "random_per_episode" => Ok(GoalMode::RandomPerEpisode),
            "manual" => Ok(GoalMode::Manual),
            other => Err(format!("unknown goal mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    pub mode: GoalMode,
    /// Goal for `fixed` mode and the initial goal for `manual` mode
    pub fixed_goal: Cell,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            mode: GoalMode::Fixed,
            fixed_goal: Cell::new(4, 4),
        }
    }
}

impl Config {
    /// Reject out-of-range hyperparameters and inconsistent grid layouts
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_grid()?;
        self.validate_rewards()?;
        self.validate_learning()?;
        self.validate_training()?;

        tracing::debug!(
            size = self.grid.size,
            obstacles = self.grid.obstacles.len(),
            goal_mode = %self.goal.mode,
            "Configuration validated"
        );
        Ok(())
    }

    fn validate_grid(&self) -> Result<(), ConfigError> {
        let size = self.grid.size;
        if size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        if size == 0 {
            return Err(ConfigError::GridTooSmall(size));
        }

        let start = self.grid.start;
        if !start.in_bounds(size) {
            return Err(ConfigError::OutOfBounds {
                what: "start cell",
                cell: start,
                size,
            });
        }

        let obstacles: HashSet<Cell> = self.grid.obstacles.iter().copied().collect();
        for obstacle in &obstacles {
            if !obstacle.in_bounds(size) {
                return Err(ConfigError::OutOfBounds {
                    what: "obstacle",
                    cell: *obstacle,
                    size,
                });
            }
        }
        if obstacles.contains(&start) {
            return Err(ConfigError::StartOnObstacle(start));
        }

        let cells = size.checked_mul(size).unwrap_or(usize::MAX);
        if cells <= obstacles.len() + 1 {
            return Err(ConfigError::NoGoalCells);
        }

        let goal = self.goal.fixed_goal;
        if !goal.in_bounds(size) {
            return Err(ConfigError::OutOfBounds {
                what: "fixed goal",
                cell: goal,
                size,
            });
        }
        if goal == start {
            return Err(ConfigError::GoalOnStart(goal));
        }
        if obstacles.contains(&goal) {
            return Err(ConfigError::GoalOnObstacle(goal));
        }

        Ok(())
    }

    fn validate_rewards(&self) -> Result<(), ConfigError> {
        if !self.rewards.goal.is_finite() {
            return Err(ConfigError::NotFinite("rewards.goal"));
        }
        if !self.rewards.step.is_finite() {
            return Err(ConfigError::NotFinite("rewards.step"));
        }
        Ok(())
    }

    fn validate_learning(&self) -> Result<(), ConfigError> {
        let l = &self.learning;
        check_unit("alpha", l.alpha)?;
        check_unit("gamma", l.gamma)?;
        check_unit("epsilon_start", l.epsilon_start)?;
        check_unit("epsilon_min", l.epsilon_min)?;

        if !(l.epsilon_decay > 0.0 && l.epsilon_decay <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "epsilon_decay",
                value: l.epsilon_decay,
                range: "(0, 1]",
            });
        }
        if l.epsilon_min > l.epsilon_start {
            return Err(ConfigError::EpsilonOrder {
                min: l.epsilon_min,
                start: l.epsilon_start,
            });
        }
        Ok(())
    }

    fn validate_training(&self) -> Result<(), ConfigError> {
        if self.training.max_steps == 0 {
            return Err(ConfigError::Zero("max_steps"));
        }
        if self.training.report_interval == 0 {
            return Err(ConfigError::Zero("report_interval"));
        }
        Ok(())
    }
}

// NaN fails the range check as well
fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            range: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.size, 5);
        assert_eq!(config.goal.fixed_goal, Cell::new(4, 4));
        assert_eq!(config.training.num_episodes, 30);
    }

    #[test]
    fn test_zero_grid_rejected() {
        let mut config = Config::default();
        config.grid.size = 0;
        assert_eq!(config.validate(), Err(ConfigError::GridTooSmall(0)));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let mut config = Config::default();
        config.grid.size = 1usize << 33;
        assert_eq!(
            config.validate(),
            Err(ConfigError::GridTooLarge {
                size: 1usize << 33,
                max: MAX_GRID_SIZE,
            })
        );

        config.grid.size = 100_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooLarge { size: 100_000, .. })
        ));

        config.grid.size = MAX_GRID_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_cell_grid_has_no_goal_cells() {
        let mut config = Config::default();
        config.grid.size = 1;
        config.grid.obstacles.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoGoalCells));
    }

    #[test]
    fn test_alpha_out_of_range() {
        let mut config = Config::default();
        config.learning.alpha = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "alpha", .. })
        ));

        config.learning.alpha = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "alpha", .. })
        ));
    }

    #[test]
    fn test_epsilon_decay_bounds() {
        let mut config = Config::default();
        config.learning.epsilon_decay = 0.0;
        assert!(config.validate().is_err());

        config.learning.epsilon_decay = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_epsilon_order() {
        let mut config = Config::default();
        config.learning.epsilon_min = 0.95;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EpsilonOrder { .. })
        ));
    }

    #[test]
    fn test_goal_placement_rejected() {
        let mut config = Config::default();
        config.goal.fixed_goal = Cell::new(0, 0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::GoalOnStart(Cell::new(0, 0)))
        );

        config.goal.fixed_goal = Cell::new(2, 2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::GoalOnObstacle(Cell::new(2, 2)))
        );

        config.goal.fixed_goal = Cell::new(5, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfBounds { what: "fixed goal", .. })
        ));
    }

    #[test]
    fn test_start_on_obstacle() {
        let mut config = Config::default();
        config.grid.obstacles.push(Cell::new(0, 0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::StartOnObstacle(Cell::new(0, 0)))
        );
    }

    #[test]
    fn test_zero_max_steps() {
        let mut config = Config::default();
        config.training.max_steps = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("max_steps")));
    }

    #[test]
    fn test_goal_mode_from_str() {
        assert_eq!("fixed".parse::<GoalMode>(), Ok(GoalMode::Fixed));
        assert_eq!(
            "random-per-episode".parse::<GoalMode>(),
            Ok(GoalMode::RandomPerEpisode)
        );
        assert_eq!("Manual".parse::<GoalMode>(), Ok(GoalMode::Manual));
        assert!("teleport".parse::<GoalMode>().is_err());
    }
}
