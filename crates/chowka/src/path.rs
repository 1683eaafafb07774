//! Spiral traverse paths.
//!
//! The board is a nest of square rings. Ring `i` spans rows and columns
//! `i..=n-1-i`; ring `(n-1)/2` is the single final cell. A token first walks
//! the whole outer ring anti-clockwise from its entry cell, then steps inward
//! and walks every inner ring clockwise, ending next to the final cell.

use crate::geometry::{BoardLandmarks, BoardSize, Direction, EntryPoint, PerEntry, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Ordered, duplicate-free cells a token visits from its entry cell up to
/// (but excluding) the final cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraversePath(Vec<Position>);

impl TraversePath {
    /// Cells in walking order.
    pub fn cells(&self) -> &[Position] {
        &self.0
    }

    /// Number of cells on the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path is empty (never true for a built path).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Step index of a cell, if the cell lies on the path.
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        self.0.iter().position(|cell| *cell == pos)
    }

    /// Whether the path visits `pos`.
    pub fn contains(&self, pos: Position) -> bool {
        self.0.contains(&pos)
    }

    /// Last cell before the final cell.
    pub fn last(&self) -> Option<Position> {
        self.0.last().copied()
    }
}

/// Walking sense around a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sense {
    Clockwise,
    Anticlockwise,
}

impl Sense {
    fn turn(self, heading: Direction) -> Direction {
        match self {
            Sense::Clockwise => heading.turn_clockwise(),
            Sense::Anticlockwise => heading.turn_anticlockwise(),
        }
    }
}

/// Perimeter of one square ring.
#[derive(Debug, Clone, Copy)]
struct Ring {
    lo: usize,
    hi: usize,
}

impl Ring {
    fn new(size: BoardSize, index: usize) -> Self {
        Self {
            lo: index,
            hi: size.get() - 1 - index,
        }
    }

    /// Whether `pos` lies on this ring's perimeter.
    fn holds(self, pos: Position) -> bool {
        let inside = (self.lo..=self.hi).contains(&pos.row) && (self.lo..=self.hi).contains(&pos.col);
        inside && (pos.row == self.lo || pos.row == self.hi || pos.col == self.lo || pos.col == self.hi)
    }

    /// Projects a cell of the enclosing ring one step inward onto this ring.
    fn project(self, pos: Position) -> Position {
        Position::new(pos.row.clamp(self.lo, self.hi), pos.col.clamp(self.lo, self.hi))
    }
}

/// Walks a ring side by side from `start`, returning to the cell before `start`.
///
/// Each side walk repeats the corner it starts from, so the result contains
/// consecutive duplicates that [`stable_dedup`] removes.
fn walk_ring(ring: Ring, start: Position, first: Direction, sense: Sense) -> Vec<Position> {
    let mut cells = vec![start];
    let mut cursor = start;
    let mut heading = first;

    // One partial side, three full sides, and the partial side back towards the start.
    for _ in 0..5 {
        cells.push(cursor);
        while let Some(next) = cursor
            .step(heading)
            .filter(|next| ring.holds(*next) && *next != start)
        {
            cells.push(next);
            cursor = next;
        }
        heading = sense.turn(heading);
    }

    cells
}

/// Removes repeated cells, keeping the first occurrence of each in order.
fn stable_dedup(cells: Vec<Position>) -> Vec<Position> {
    let mut seen = HashSet::with_capacity(cells.len());
    cells.into_iter().filter(|cell| seen.insert(*cell)).collect()
}

/// Builds the traverse path for one entry point.
///
/// Pure and deterministic. The result visits every cell of the board except
/// the final cell exactly once, so it has `n² - 1` cells.
#[instrument]
pub fn build_traverse_path(size: BoardSize, entry: EntryPoint) -> TraversePath {
    let turns = entry.quarter_turns();
    let outer_heading = Direction::Left.rotate(turns);
    let inner_heading = Direction::Right.rotate(turns);

    let mut cells = walk_ring(
        Ring::new(size, 0),
        entry.position(size),
        outer_heading,
        Sense::Anticlockwise,
    );

    for index in 1..size.half() {
        let ring = Ring::new(size, index);
        let previous = *cells.last().unwrap_or(&entry.position(size));
        let start = ring.project(previous);
        cells.extend(walk_ring(ring, start, inner_heading, Sense::Clockwise));
    }

    let path = stable_dedup(cells);
    debug!(size = size.get(), %entry, len = path.len(), "Built traverse path");
    TraversePath(path)
}

/// Builds the traverse paths of all four entry points.
#[instrument(skip(landmarks))]
pub fn find_traverse_paths(size: BoardSize, landmarks: &BoardLandmarks) -> PerEntry<TraversePath> {
    PerEntry::from_fn(|entry| {
        let path = build_traverse_path(size, entry);
        debug_assert_eq!(path.cells().first(), Some(&landmarks.entry(entry)));
        path
    })
}

/// Renders a path as a grid of step indices (`**` marks the final cell).
pub fn render(size: BoardSize, path: &TraversePath) -> String {
    let n = size.get();
    let width = (n * n).to_string().len().max(2);
    let mut out = String::new();
    for row in 0..n {
        let line: Vec<String> = (0..n)
            .map(|col| {
                let pos = Position::new(row, col);
                match path.index_of(pos) {
                    Some(step) => format!("{step:>width$}"),
                    None => format!("{:>width$}", "**"),
                }
            })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}
