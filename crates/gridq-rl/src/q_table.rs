//! Dense Q-table indexed by `(x, y, action)`

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridq_core::{Action, Cell};

/// Shape mismatch when loading a serialized table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QTableError {
    #[error("q-table shape {actual:?} does not match a {size}x{size} grid")]
    Shape { size: usize, actual: Vec<usize> },

    #[error("value function shape {actual:?} does not match a {size}x{size} grid")]
    ValueShape { size: usize, actual: Vec<usize> },
}

/// Action values for every cell of the grid.
///
/// Every cell (obstacles included) has a row, and all entries start at `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QTableRepr")]
pub struct QTable {
    size: usize,
    values: Array3<f64>,
}

#[derive(Deserialize)]
struct QTableRepr {
    size: usize,
    values: Array3<f64>,
}

impl TryFrom<QTableRepr> for QTable {
    type Error = QTableError;

    fn try_from(repr: QTableRepr) -> Result<Self, Self::Error> {
        if repr.values.dim() != (repr.size, repr.size, Action::COUNT) {
            return Err(QTableError::Shape {
                size: repr.size,
                actual: repr.values.shape().to_vec(),
            });
        }
        Ok(Self {
            size: repr.size,
            values: repr.values,
        })
    }
}

impl QTable {
    /// Create an all-zero table for a `size x size` grid
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: Array3::zeros((size, size, Action::COUNT)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Q-value of one action
    pub fn get(&self, cell: Cell, action: Action) -> f64 {
        self.values[[cell.x, cell.y, action.to_index()]]
    }

    /// All action values for a cell, in action index order
    pub fn row(&self, cell: Cell) -> [f64; Action::COUNT] {
        let mut row = [0.0; Action::COUNT];
        for (i, slot) in row.iter_mut().enumerate() {
            *slot = self.values[[cell.x, cell.y, i]];
        }
        row
    }

    /// Greedy action. Ties go to the lowest action index.
    pub fn best_action(&self, cell: Cell) -> Action {
        let row = self.row(cell);
        let mut best = 0;
        for i in 1..Action::COUNT {
            if row[i] > row[best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    /// Highest action value for a cell
    pub fn max_value(&self, cell: Cell) -> f64 {
        self.row(cell)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Move one entry toward `target` by `alpha`, returning the TD error
    pub(crate) fn nudge(&mut self, cell: Cell, action: Action, target: f64, alpha: f64) -> f64 {
        let entry = &mut self.values[[cell.x, cell.y, action.to_index()]];
        let td_error = target - *entry;
        *entry += alpha * td_error;
        td_error
    }

    /// Whether every entry is still zero
    pub fn is_zeroed(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// `V(cell) = max_a Q(cell, a)` for every cell
    pub fn value_function(&self) -> ValueFunction {
        let values = Array2::from_shape_fn((self.size, self.size), |(x, y)| {
            self.max_value(Cell::new(x, y))
        });
        ValueFunction {
            size: self.size,
            values,
        }
    }
}

/// Per-cell state value derived from a Q-table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueFunctionRepr")]
pub struct ValueFunction {
    size: usize,
    values: Array2<f64>,
}

#[derive(Deserialize)]
struct ValueFunctionRepr {
    size: usize,
    values: Array2<f64>,
}

impl TryFrom<ValueFunctionRepr> for ValueFunction {
    type Error = QTableError;

    fn try_from(repr: ValueFunctionRepr) -> Result<Self, Self::Error> {
        if repr.values.dim() != (repr.size, repr.size) {
            return Err(QTableError::ValueShape {
                size: repr.size,
                actual: repr.values.shape().to_vec(),
            });
        }
        Ok(Self {
            size: repr.size,
            values: repr.values,
        })
    }
}

impl ValueFunction {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, cell: Cell) -> f64 {
        self.values[[cell.x, cell.y]]
    }

    /// Smallest and largest values, `None` for an empty grid
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.values.is_empty() {
            return None;
        }
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}
