//! Four-stick dice.
//!
//! Each stick lands on its inner (0) or outer (1) face. The score is looked up
//! from how many sticks show the outer face; it is not their sum.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of sticks thrown per roll.
pub const STICK_COUNT: usize = 4;

/// Score indexed by the number of outer faces showing.
const SCORE_BY_OUTER_COUNT: [u8; STICK_COUNT + 1] = [4, 3, 2, 1, 8];

/// Face a single stick lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Stick {
    /// Inner face, recorded as 0.
    Inner,
    /// Outer face, recorded as 1.
    Outer,
}

impl From<Stick> for u8 {
    fn from(stick: Stick) -> Self {
        match stick {
            Stick::Inner => 0,
            Stick::Outer => 1,
        }
    }
}

impl TryFrom<u8> for Stick {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stick::Inner),
            1 => Ok(Stick::Outer),
            other => Err(format!("stick value must be 0 or 1, got {other}")),
        }
    }
}

/// Outcome of one throw of the four sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickThrow {
    rolled_values: [Stick; STICK_COUNT],
    total_value: u8,
}

impl StickThrow {
    /// Scores a given set of stick faces.
    pub fn from_sticks(rolled_values: [Stick; STICK_COUNT]) -> Self {
        let outer = rolled_values.iter().filter(|s| **s == Stick::Outer).count();
        Self {
            rolled_values,
            total_value: SCORE_BY_OUTER_COUNT[outer],
        }
    }

    /// Throws the sticks, each landing on either face with equal probability.
    #[instrument(skip(rng))]
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let sticks = std::array::from_fn(|_| {
            if rng.gen_bool(0.5) {
                Stick::Outer
            } else {
                Stick::Inner
            }
        });
        let throw = Self::from_sticks(sticks);
        debug!(total = throw.total_value, "Sticks thrown");
        throw
    }

    /// Faces of the four sticks.
    pub fn rolled_values(&self) -> &[Stick; STICK_COUNT] {
        &self.rolled_values
    }

    /// Movement value of the throw: one of 1, 2, 3, 4 or 8.
    pub fn total_value(&self) -> u8 {
        self.total_value
    }

    /// Whether the throw lets a token enter the board (1 or 4).
    pub fn allows_entry(&self) -> bool {
        matches!(self.total_value, 1 | 4)
    }
}

/// Throws the four sticks with the given random source.
pub fn roll_sticks<R: Rng + ?Sized>(rng: &mut R) -> StickThrow {
    StickThrow::roll(rng)
}
