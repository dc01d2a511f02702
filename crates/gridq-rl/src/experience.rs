//! Transition tuples and the per-episode trace

use serde::{Deserialize, Serialize};

use gridq_core::{Action, Cell};

use crate::environment::StepOutcome;

/// A single experience tuple (s, a, r, s', done)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Cell,
    pub action: Action,
    pub reward: f64,
    pub next_state: Cell,
    pub done: bool,
}

impl Experience {
    /// Create a new experience
    pub fn new(state: Cell, action: Action, reward: f64, next_state: Cell, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }

    /// Build from a state, the chosen action and the environment's answer
    pub fn from_outcome(state: Cell, action: Action, outcome: StepOutcome) -> Self {
        Self::new(state, action, outcome.reward, outcome.next_state, outcome.done)
    }
}

/// Ordered transitions of the episode in progress. Cleared at every episode start.
#[derive(Debug, Clone, Default)]
pub struct EpisodeTrace {
    steps: Vec<Experience>,
}

impl EpisodeTrace {
    /// Create a trace sized for a full step budget
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, experience: Experience) {
        self.steps.push(experience);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[Experience] {
        &self.steps
    }

    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|e| e.reward).sum()
    }

    /// States visited after each step, in order
    pub fn path(&self) -> Vec<Cell> {
        self.steps.iter().map(|e| e.next_state).collect()
    }

    /// Whether the last recorded step was terminal
    pub fn reached_terminal(&self) -> bool {
        self.steps.last().is_some_and(|e| e.done)
    }
}
