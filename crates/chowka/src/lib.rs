//! Rules for a four-player cross-board race game played with stick dice.
//!
//! # Architecture
//!
//! - **Geometry**: corners, entry cells and the final cell of an odd N×N board
//! - **Paths**: the spiral each player's tokens follow to the centre
//! - **Dice**: four two-faced sticks scored by a fixed table
//! - **State**: one match, with occupancy, turn pointer and winner
//! - **Moves**: legality checks, captures, stacking and win detection
//!
//! # Example
//!
//! ```
//! use chowka::{BoardSize, GameState, PlayerId, Stick, StickThrow, TokenChoice, TokenId};
//!
//! let size = BoardSize::new(5)?;
//! let roster = [TokenChoice { player_id: PlayerId(1), token_id: TokenId(1) }];
//! let mut game = GameState::new(size, &roster)?;
//! game.record_roll(PlayerId(1), StickThrow::from_sticks([Stick::Inner; 4]))?;
//! assert_eq!(*game.remaining_dice_value(), 4);
//! # Ok::<(), chowka::RuleError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contracts;
mod dice;
mod error;
mod geometry;
mod moves;
mod path;
mod state;
mod turn;

pub use contracts::{LegalMove, LegalTarget, MovePlan, OwnsToken, PlayersTurn};
pub use dice::{STICK_COUNT, Stick, StickThrow, roll_sticks};
pub use error::RuleError;
pub use geometry::{BoardLandmarks, BoardSize, Direction, EntryPoint, PerEntry, Position, compute_landmarks};
pub use moves::{MoveOutcome, MoveRequest, TokenRef, apply_move};
pub use path::{TraversePath, build_traverse_path, find_traverse_paths, render as render_path};
pub use state::{
    CellOccupancy, GameState, MAX_PLAYERS, OccupiedCell, Occupant, PlayerId, RemovedToken, Seat,
    TOKENS_PER_PLAYER, TokenChoice, TokenId, TurnPhase, seat_roster,
};
pub use turn::next_player;
