//! Error types for GridQ

use thiserror::Error;

use crate::grid::Cell;

/// Main error type for GridQ
#[derive(Error, Debug)]
pub enum GridQError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidGoal(#[from] InvalidGoalAssignment),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GridQ operations
pub type Result<T> = std::result::Result<T, GridQError>;

/// Why a goal assignment was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalRejection {
    /// Target is the start cell
    StartCell,
    /// Target is an obstacle
    Obstacle,
    /// Target lies outside the grid
    OutOfBounds,
    /// Goal mode does not accept external assignments
    ModeLocked,
}

impl std::fmt::Display for GoalRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalRejection::StartCell => write!(f, "goal cannot be placed on the start cell"),
            GoalRejection::Obstacle => write!(f, "goal cannot be placed on an obstacle"),
            GoalRejection::OutOfBounds => write!(f, "goal is outside the grid"),
            GoalRejection::ModeLocked => write!(f, "goal mode does not accept manual assignment"),
        }
    }
}

/// A rejected goal assignment. The previous goal stays in place.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid goal assignment ({x}, {y}): {reason}")]
pub struct InvalidGoalAssignment {
    pub x: i64,
    pub y: i64,
    pub reason: GoalRejection,
}

impl InvalidGoalAssignment {
    pub fn new(x: i64, y: i64, reason: GoalRejection) -> Self {
        Self { x, y, reason }
    }

    pub fn at(cell: Cell, reason: GoalRejection) -> Self {
        Self::new(cell.x as i64, cell.y as i64, reason)
    }
}

/// Out-of-range or inconsistent configuration, rejected before any episode runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid size must be at least 1, got {0}")]
    GridTooSmall(usize),

    #[error("grid size must be at most {max}, got {size}")]
    GridTooLarge { size: usize, max: usize },

    #[error("grid must contain at least one cell besides the start cell")]
    NoGoalCells,

    #[error("{what} {cell} is outside the {size}x{size} grid")]
    OutOfBounds {
        what: &'static str,
        cell: Cell,
        size: usize,
    },

    #[error("start cell {0} is an obstacle")]
    StartOnObstacle(Cell),

    #[error("fixed goal {0} is the start cell")]
    GoalOnStart(Cell),

    #[error("fixed goal {0} is an obstacle")]
    GoalOnObstacle(Cell),

    #[error("{name} must be within {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("epsilon_min ({min}) must not exceed epsilon_start ({start})")]
    EpsilonOrder { min: f64, start: f64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("{what} covers a {actual}x{actual} grid but grid.size is {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}
