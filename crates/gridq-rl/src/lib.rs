//! GridQ RL - Tabular Q-learning on a gridworld with a movable goal
//!
//! The environment, Q-table, agent, and training loop. Rendering and input
//! live outside this crate and plug in through [`TrainingObserver`] and a
//! goal-input channel.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_range_loop)]

pub mod agent;
pub mod environment;
pub mod experience;
pub mod q_table;
pub mod report;
pub mod trainer;

pub use agent::{greedy_rollout, Learner, QLearningAgent, Rollout};
pub use environment::{GoalController, GridEnvironment, StepOutcome};
pub use experience::{EpisodeTrace, Experience};
pub use q_table::{QTable, QTableError, ValueFunction};
pub use report::{EpisodeOutcome, EpisodeSummary, TrainingReport};
pub use trainer::{HaltHandle, NoopObserver, StepEvent, TrainingLoop, TrainingObserver};
