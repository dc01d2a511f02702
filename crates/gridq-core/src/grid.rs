//! Cell and Action types for the gridworld

use serde::{Deserialize, Serialize};

/// A grid coordinate. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Whether the cell lies inside a `size x size` grid
    pub fn in_bounds(&self, size: usize) -> bool {
        self.x < size && self.y < size
    }

    /// Move by `(dx, dy)`, clamping each coordinate into `[0, size - 1]`
    pub fn offset_clamped(&self, (dx, dy): (i64, i64), size: usize) -> Cell {
        let max = size.saturating_sub(1) as i64;
        let x = (self.x as i64 + dx).clamp(0, max);
        let y = (self.y as i64 + dy).clamp(0, max);
        Cell::new(x as usize, y as usize)
    }

    /// Convert signed pointer coordinates, `None` when either is negative
    pub fn from_signed(x: i64, y: i64) -> Option<Cell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        Some(Cell::new(x, y))
    }
}

impl From<(usize, usize)> for Cell {
    fn from((x, y): (usize, usize)) -> Self {
        Cell::new(x, y)
    }
}

impl From<Cell> for (usize, usize) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Movement action. Index order is fixed: down, up, left, right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Down,
    Up,
    Left,
    Right,
}

impl Action {
    /// All actions in index order
    pub const ALL: [Action; 4] = [Action::Down, Action::Up, Action::Left, Action::Right];

    /// Number of discrete actions
    pub const COUNT: usize = 4;

    /// Convert action to index for the discrete action space
    pub fn to_index(self) -> usize {
        match self {
            Action::Down => 0,
            Action::Up => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    /// Create action from index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Unit displacement `(dx, dy)`; `up` increases `y`
    pub fn delta(self) -> (i64, i64) {
        match self {
            Action::Down => (0, -1),
            Action::Up => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }

    /// Arrow glyph for policy rendering
    pub fn arrow(self) -> char {
        match self {
            Action::Down => 'v',
            Action::Up => '^',
            Action::Left => '<',
            Action::Right => '>',
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Down => write!(f, "down"),
            Action::Up => write!(f, "up"),
            Action::Left => write!(f, "left"),
            Action::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index_roundtrip() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.to_index(), i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert!(Action::from_index(4).is_none());
    }

    #[test]
    fn test_action_deltas() {
        assert_eq!(Action::Down.delta(), (0, -1));
        assert_eq!(Action::Up.delta(), (0, 1));
        assert_eq!(Action::Left.delta(), (-1, 0));
        assert_eq!(Action::Right.delta(), (1, 0));
    }

    #[test]
    fn test_offset_clamps_each_axis() {
        let corner = Cell::new(0, 0);
        assert_eq!(corner.offset_clamped((-1, 0), 5), corner);
        assert_eq!(corner.offset_clamped((0, -1), 5), corner);

        let far = Cell::new(4, 4);
        assert_eq!(far.offset_clamped((1, 0), 5), far);
        assert_eq!(far.offset_clamped((0, 1), 5), far);
        assert_eq!(far.offset_clamped((-1, 0), 5), Cell::new(3, 4));
    }

    #[test]
    fn test_from_signed() {
        assert_eq!(Cell::from_signed(2, 3), Some(Cell::new(2, 3)));
        assert!(Cell::from_signed(-1, 0).is_none());
        assert!(Cell::from_signed(0, -7).is_none());
    }

    #[test]
    fn test_cell_serializes_as_pair() {
        let json = serde_json::to_string(&Cell::new(1, 3)).unwrap();
        assert_eq!(json, "[1,3]");

        let parsed: Cell = serde_json::from_str("[4,2]").unwrap();
        assert_eq!(parsed, Cell::new(4, 2));
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&Action::Left).unwrap();
        assert_eq!(json, "\"left\"");
        let parsed: Action = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(parsed, Action::Up);
    }
}
