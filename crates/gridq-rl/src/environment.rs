//! Gridworld environment and goal bookkeeping

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gridq_core::{
    Action, Cell, Config, ConfigError, GoalMode, GoalRejection, InvalidGoalAssignment,
};

/// Result of a single transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub next_state: Cell,
    pub reward: f64,
    pub done: bool,
}

/// Owns the current goal and decides which goal changes are allowed.
///
/// Valid goal cells are every cell except the start cell and the obstacles,
/// kept sorted so membership is a binary search.
#[derive(Debug, Clone)]
pub struct GoalController {
    mode: GoalMode,
    goal: Cell,
    start: Cell,
    size: usize,
    valid_cells: Vec<Cell>,
}

impl GoalController {
    pub fn new(
        mode: GoalMode,
        initial: Cell,
        start: Cell,
        size: usize,
        mut valid_cells: Vec<Cell>,
    ) -> Self {
        valid_cells.sort_unstable();
        valid_cells.dedup();
        Self {
            mode,
            goal: initial,
            start,
            size,
            valid_cells,
        }
    }

    /// Current goal
    pub fn goal(&self) -> Cell {
        self.goal
    }

    pub fn mode(&self) -> GoalMode {
        self.mode
    }

    /// Cells the goal may occupy
    pub fn valid_cells(&self) -> &[Cell] {
        &self.valid_cells
    }

    /// Check a candidate without applying it
    pub fn check(&self, cell: Cell) -> Result<(), InvalidGoalAssignment> {
        if !cell.in_bounds(self.size) {
            return Err(InvalidGoalAssignment::at(cell, GoalRejection::OutOfBounds));
        }
        if cell == self.start {
            return Err(InvalidGoalAssignment::at(cell, GoalRejection::StartCell));
        }
        if self.valid_cells.binary_search(&cell).is_err() {
            return Err(InvalidGoalAssignment::at(cell, GoalRejection::Obstacle));
        }
        Ok(())
    }

    /// Move the goal. Only `manual` mode accepts external assignments; on
    /// rejection the previous goal is kept.
    pub fn assign(&mut self, cell: Cell) -> Result<(), InvalidGoalAssignment> {
        if self.mode != GoalMode::Manual {
            return Err(InvalidGoalAssignment::at(cell, GoalRejection::ModeLocked));
        }
        self.check(cell)?;
        if cell != self.goal {
            debug!(from = %self.goal, to = %cell, "Goal moved");
        }
        self.goal = cell;
        Ok(())
    }

    /// Assign from raw pointer coordinates, which may be negative or off-grid
    pub fn assign_point(&mut self, x: i64, y: i64) -> Result<(), InvalidGoalAssignment> {
        match Cell::from_signed(x, y) {
            Some(cell) => self.assign(cell),
            None if self.mode != GoalMode::Manual => {
                Err(InvalidGoalAssignment::new(x, y, GoalRejection::ModeLocked))
            }
            None => Err(InvalidGoalAssignment::new(x, y, GoalRejection::OutOfBounds)),
        }
    }

    /// Resolve the goal at the start of an episode
    pub fn begin_episode<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Cell {
        if self.mode == GoalMode::RandomPerEpisode {
            if let Some(cell) = self.valid_cells.choose(rng) {
                self.goal = *cell;
            }
        }
        self.goal
    }
}

/// Deterministic gridworld: bounds, static obstacles, and a movable goal
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    size: usize,
    start: Cell,
    obstacles: HashSet<Cell>,
    reward_goal: f64,
    reward_step: f64,
    goals: GoalController,
}

impl GridEnvironment {
    /// Build the environment from a configuration, validating it first
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.grid.size;
        let start = config.grid.start;
        let obstacles: HashSet<Cell> = config.grid.obstacles.iter().copied().collect();

        let valid_cells: Vec<Cell> = all_cells(size)
            .filter(|c| *c != start && !obstacles.contains(c))
            .collect();

        let goals = GoalController::new(
            config.goal.mode,
            config.goal.fixed_goal,
            start,
            size,
            valid_cells,
        );

        Ok(Self {
            size,
            start,
            obstacles,
            reward_goal: config.rewards.goal,
            reward_step: config.rewards.step,
            goals,
        })
    }

    /// Apply `action` to `state`.
    ///
    /// Coordinates clamp at the walls. A move into an obstacle leaves the
    /// state unchanged and still costs the step reward.
    pub fn step(&self, state: Cell, action: Action) -> StepOutcome {
        let moved = state.offset_clamped(action.delta(), self.size);

        if self.obstacles.contains(&moved) {
            return StepOutcome {
                next_state: state,
                reward: self.reward_step,
                done: false,
            };
        }

        if moved == self.goals.goal() {
            StepOutcome {
                next_state: moved,
                reward: self.reward_goal,
                done: true,
            }
        } else {
            StepOutcome {
                next_state: moved,
                reward: self.reward_step,
                done: false,
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goals.goal()
    }

    pub fn goals(&self) -> &GoalController {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut GoalController {
        &mut self.goals
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.size)
    }

    /// Obstacles in `(x, y)` order
    pub fn obstacles(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.obstacles.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Every cell in `(x, y)` order
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        all_cells(self.size)
    }
}

fn all_cells(size: usize) -> impl Iterator<Item = Cell> {
    (0..size).flat_map(move |x| (0..size).map(move |y| Cell::new(x, y)))
}
