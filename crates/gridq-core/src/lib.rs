//! GridQ Core - Grid types, configuration, and shared errors
//!
//! This crate provides the foundational types used by the GridQ trainer and CLI.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod error;
pub mod grid;
pub mod types;

pub use config::{Config, GoalMode, MAX_GRID_SIZE};
pub use error::{ConfigError, GoalRejection, GridQError, InvalidGoalAssignment, Result};
pub use grid::{Action, Cell};
pub use types::RunId;
