//! Board geometry: cells, entry points and the landmarks derived from the board size.

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A cell on the board, 0-indexed from the top-left corner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("({}, {})", row, col)]
pub struct Position {
    /// Row, counted downwards.
    pub row: usize,
    /// Column, counted rightwards.
    pub col: usize,
}

impl Position {
    /// Creates a position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Chebyshev (king-move) distance between two cells.
    pub fn chebyshev(self, other: Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// The neighbouring cell in `direction`, or `None` when it would leave the first quadrant.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dr, dc) = direction.delta();
        Some(Position {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    /// Rotates the cell a quarter turn anti-clockwise about the board centre.
    ///
    /// Applying this to the top entry point yields the left entry point.
    pub fn rotate_quarter(self, size: BoardSize) -> Position {
        let last = size.get() - 1;
        Position::new(last - self.col, self.row)
    }

    /// Rotates the cell `turns` quarter turns anti-clockwise.
    pub fn rotate(self, size: BoardSize, turns: usize) -> Position {
        (0..turns % 4).fold(self, |pos, _| pos.rotate_quarter(size))
    }
}

/// One of the four orthogonal headings on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl Direction {
    /// Row and column displacement of one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Next heading when walking a ring clockwise (as drawn on screen).
    pub fn turn_clockwise(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    /// Next heading when walking a ring anti-clockwise.
    pub fn turn_anticlockwise(self) -> Self {
        match self {
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
        }
    }

    /// The heading after rotating the whole board `turns` quarter turns anti-clockwise.
    ///
    /// Consistent with [`Position::rotate_quarter`]: a step taken in `self` from `p`
    /// lands on the rotation of `p + self`.
    pub fn rotate(self, turns: usize) -> Self {
        (0..turns % 4).fold(self, |dir, _| dir.turn_anticlockwise())
    }
}

/// Side length of a square board: odd and at least [`BoardSize::MIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "usize", into = "usize")]
pub struct BoardSize(usize);

impl BoardSize {
    /// Smallest playable board.
    pub const MIN: usize = 5;

    /// Validates a board size.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidBoardSize`] for even sizes or sizes below 5.
    #[instrument]
    pub fn new(n: usize) -> Result<Self, RuleError> {
        if n < Self::MIN || n % 2 == 0 {
            return Err(RuleError::InvalidBoardSize(n));
        }
        Ok(Self(n))
    }

    /// Side length.
    pub fn get(self) -> usize {
        self.0
    }

    /// Index of the centre row/column, `(n - 1) / 2`. Also the index of the innermost ring.
    pub fn half(self) -> usize {
        (self.0 - 1) / 2
    }

    /// Whether the cell lies on the board.
    pub fn contains(self, pos: Position) -> bool {
        pos.row < self.0 && pos.col < self.0
    }
}

impl TryFrom<usize> for BoardSize {
    type Error = RuleError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<BoardSize> for usize {
    fn from(size: BoardSize) -> Self {
        size.0
    }
}

/// The four mid-edge cells where players' tokens enter the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryPoint {
    /// Top-center cell.
    Top,
    /// Left-center cell.
    Left,
    /// Right-center cell.
    Right,
    /// Bottom-center cell.
    Bottom,
}

impl EntryPoint {
    /// All entry points, in seat-assignment order.
    pub const ALL: [EntryPoint; 4] = [
        EntryPoint::Top,
        EntryPoint::Left,
        EntryPoint::Right,
        EntryPoint::Bottom,
    ];

    /// Quarter turns (anti-clockwise) that carry the top entry onto this one.
    pub fn quarter_turns(self) -> usize {
        match self {
            EntryPoint::Top => 0,
            EntryPoint::Left => 1,
            EntryPoint::Bottom => 2,
            EntryPoint::Right => 3,
        }
    }

    /// The entry cell on a board of the given size.
    pub fn position(self, size: BoardSize) -> Position {
        let half = size.half();
        let last = size.get() - 1;
        match self {
            EntryPoint::Top => Position::new(0, half),
            EntryPoint::Left => Position::new(half, 0),
            EntryPoint::Right => Position::new(half, last),
            EntryPoint::Bottom => Position::new(last, half),
        }
    }
}

/// A fixed mapping holding one value per entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerEntry<T> {
    /// Value for [`EntryPoint::Top`].
    pub top: T,
    /// Value for [`EntryPoint::Left`].
    pub left: T,
    /// Value for [`EntryPoint::Right`].
    pub right: T,
    /// Value for [`EntryPoint::Bottom`].
    pub bottom: T,
}

impl<T> PerEntry<T> {
    /// Builds the mapping by evaluating `f` for every entry point.
    pub fn from_fn(mut f: impl FnMut(EntryPoint) -> T) -> Self {
        Self {
            top: f(EntryPoint::Top),
            left: f(EntryPoint::Left),
            right: f(EntryPoint::Right),
            bottom: f(EntryPoint::Bottom),
        }
    }

    /// Value for one entry point.
    pub fn get(&self, entry: EntryPoint) -> &T {
        match entry {
            EntryPoint::Top => &self.top,
            EntryPoint::Left => &self.left,
            EntryPoint::Right => &self.right,
            EntryPoint::Bottom => &self.bottom,
        }
    }

    /// Iterates `(entry, value)` pairs in [`EntryPoint::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (EntryPoint, &T)> {
        EntryPoint::ALL.into_iter().map(move |entry| (entry, self.get(entry)))
    }
}

/// Structural landmarks of a board: corners, entry cells and the final cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct BoardLandmarks {
    /// Top-left, top-right, bottom-left, bottom-right.
    corners: [Position; 4],
    /// Entry cell of each entry point.
    entry_points: PerEntry<Position>,
    /// Centre cell, where tokens go home.
    final_pos: Position,
}

impl BoardLandmarks {
    /// Derives the landmarks of a validated board size.
    #[instrument]
    pub fn for_size(size: BoardSize) -> Self {
        let last = size.get() - 1;
        let half = size.half();
        Self {
            corners: [
                Position::new(0, 0),
                Position::new(0, last),
                Position::new(last, 0),
                Position::new(last, last),
            ],
            entry_points: PerEntry::from_fn(|entry| entry.position(size)),
            final_pos: Position::new(half, half),
        }
    }

    /// Entry cell of one entry point.
    pub fn entry(&self, entry: EntryPoint) -> Position {
        *self.entry_points.get(entry)
    }

    /// True iff `pos` is an entry cell or the final cell.
    pub fn is_safe_cell(&self, pos: Position) -> bool {
        self.is_final_cell(pos) || self.entry_points.iter().any(|(_, cell)| *cell == pos)
    }

    /// True iff `pos` is the final (centre) cell.
    pub fn is_final_cell(&self, pos: Position) -> bool {
        pos == self.final_pos
    }
}

/// Computes the landmarks of an `n`×`n` board.
///
/// # Errors
///
/// Returns [`RuleError::InvalidBoardSize`] if `n` is even or below 5.
#[instrument]
pub fn compute_landmarks(n: usize) -> Result<BoardLandmarks, RuleError> {
    Ok(BoardLandmarks::for_size(BoardSize::new(n)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_even_and_small_sizes() {
        for n in [0, 1, 3, 4, 6, 12] {
            assert_eq!(compute_landmarks(n), Err(RuleError::InvalidBoardSize(n)));
        }
    }

    #[test]
    fn test_landmarks_five() {
        let landmarks = compute_landmarks(5).expect("valid size");
        assert_eq!(*landmarks.final_pos(), Position::new(2, 2));
        assert_eq!(landmarks.entry(EntryPoint::Top), Position::new(0, 2));
        assert_eq!(landmarks.entry(EntryPoint::Left), Position::new(2, 0));
        assert_eq!(landmarks.entry(EntryPoint::Right), Position::new(2, 4));
        assert_eq!(landmarks.entry(EntryPoint::Bottom), Position::new(4, 2));
        assert_eq!(landmarks.corners()[3], Position::new(4, 4));
    }

    #[test]
    fn test_safe_cells() {
        let landmarks = compute_landmarks(7).expect("valid size");
        assert!(landmarks.is_safe_cell(Position::new(3, 3)));
        assert!(landmarks.is_safe_cell(Position::new(0, 3)));
        assert!(landmarks.is_safe_cell(Position::new(6, 3)));
        assert!(!landmarks.is_safe_cell(Position::new(0, 0)));
        assert!(!landmarks.is_safe_cell(Position::new(1, 3)));
        assert!(landmarks.is_final_cell(Position::new(3, 3)));
        assert!(!landmarks.is_final_cell(Position::new(0, 3)));
    }

    #[test]
    fn test_rotation_carries_top_entry_around_the_board() {
        let size = BoardSize::new(9).expect("valid size");
        let top = EntryPoint::Top.position(size);
        for entry in EntryPoint::ALL {
            assert_eq!(top.rotate(size, entry.quarter_turns()), entry.position(size));
        }
    }

    #[test]
    fn test_direction_rotation_matches_position_rotation() {
        let size = BoardSize::new(7).expect("valid size");
        let from = Position::new(2, 3);
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let stepped = from.step(dir).expect("interior cell");
            assert_eq!(
                from.rotate_quarter(size).step(dir.rotate(1)),
                Some(stepped.rotate_quarter(size))
            );
        }
    }
}
