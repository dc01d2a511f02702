//! Learner trait and the tabular Q-learning agent

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use gridq_core::config::LearningConfig;
use gridq_core::{Action, Cell, Config};

use crate::environment::GridEnvironment;
use crate::experience::Experience;
use crate::q_table::QTable;

/// Trait for learners driven by the training loop
pub trait Learner: Send {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Pick the action to take in `state`
    fn choose_action(&mut self, state: Cell) -> Action;

    /// Learn from one transition, returning the TD error
    fn update(&mut self, experience: &Experience) -> f64;

    /// Called once after every completed episode
    fn decay_epsilon(&mut self);

    /// Current exploration rate
    fn epsilon(&self) -> f64;

    /// Learned action values
    fn q_table(&self) -> &QTable;

    /// Get algorithm parameters as JSON
    fn params(&self) -> serde_json::Value;
}

/// Greedy rollout result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rollout {
    /// Cells visited, starting with the start cell
    pub path: Vec<Cell>,
    pub reached_goal: bool,
}

/// Epsilon-greedy, one-step tabular Q-learning
pub struct QLearningAgent {
    q_table: QTable,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    epsilon_min: f64,
    epsilon_decay: f64,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(grid_size: usize, learning: &LearningConfig) -> Self {
        Self {
            q_table: QTable::new(grid_size),
            alpha: learning.alpha,
            gamma: learning.gamma,
            epsilon: learning.epsilon_start,
            epsilon_min: learning.epsilon_min,
            epsilon_decay: learning.epsilon_decay,
            rng: StdRng::from_entropy(),
        }
    }

    /// Agent for a validated config, seeded when the config carries a seed
    pub fn from_config(config: &Config) -> Self {
        let agent = Self::new(config.grid.size, &config.learning);
        match config.training.seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        }
    }

    /// Make exploration reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Follow the greedy policy from the start cell without learning
    pub fn greedy_path(&self, env: &GridEnvironment, limit: usize) -> Rollout {
        greedy_rollout(&self.q_table, env, limit)
    }
}

/// Follow the greedy policy of `q_table` from the start cell.
///
/// Stops at the goal, on the first revisited cell, or after `limit` moves.
pub fn greedy_rollout(q_table: &QTable, env: &GridEnvironment, limit: usize) -> Rollout {
    let mut state = env.start();
    let mut path = vec![state];
    let mut seen: HashSet<Cell> = HashSet::from([state]);

    for _ in 0..limit {
        let action = q_table.best_action(state);
        let outcome = env.step(state, action);
        path.push(outcome.next_state);
        if outcome.done {
            return Rollout {
                path,
                reached_goal: true,
            };
        }
        if !seen.insert(outcome.next_state) {
            break;
        }
        state = outcome.next_state;
    }

    Rollout {
        path,
        reached_goal: false,
    }
}

impl Learner for QLearningAgent {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn choose_action(&mut self, state: Cell) -> Action {
        if self.rng.gen::<f64>() < self.epsilon {
            Action::ALL[self.rng.gen_range(0..Action::COUNT)]
        } else {
            self.q_table.best_action(state)
        }
    }

    fn update(&mut self, exp: &Experience) -> f64 {
        // No bootstrapping past a terminal transition
        let target = if exp.done {
            exp.reward
        } else {
            exp.reward + self.gamma * self.q_table.max_value(exp.next_state)
        };
        self.q_table.nudge(exp.state, exp.action, target, self.alpha)
    }

    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn q_table(&self) -> &QTable {
        &self.q_table
    }

    fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "alpha": self.alpha,
            "gamma": self.gamma,
            "epsilon": self.epsilon,
            "epsilon_min": self.epsilon_min,
            "epsilon_decay": self.epsilon_decay,
            "grid_size": self.q_table.size()
        })
    }
}
