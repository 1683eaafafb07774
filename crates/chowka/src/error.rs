//! Rule violations reported by the game engine.
//!
//! Every variant except [`RuleError::CorruptedState`] is a recoverable
//! validation failure: the caller is told why, and the game state is left
//! exactly as it was.

use crate::geometry::Position;
use crate::state::{PlayerId, TokenId};

/// Error that can occur when building, rolling or moving.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RuleError {
    /// The board size is even or smaller than the minimum.
    #[display("Board size {} is invalid: it must be odd and at least 5", _0)]
    InvalidBoardSize(usize),

    /// The board size exceeds the configured maximum.
    #[display("Board size {} exceeds the maximum of {}", size, max)]
    BoardTooLarge {
        /// Requested size.
        size: usize,
        /// Largest accepted size.
        max: usize,
    },

    /// The player roster is unusable (empty, too large, duplicated or inconsistent).
    #[display("Invalid player roster: {}", _0)]
    InvalidRoster(String),

    /// The game already has a winner.
    #[display("Game is already over")]
    GameOver,

    /// The acting player is not the one the turn expects.
    #[display("It's not player {}'s turn, waiting for player {}", actual, expected)]
    WrongPlayer {
        /// Player whose action is expected.
        expected: PlayerId,
        /// Player who attempted the action.
        actual: PlayerId,
    },

    /// The player has not rolled, or has spent the whole roll.
    #[display("No dice value left to move with")]
    NoDiceValue,

    /// The request's dice values disagree with the authoritative state.
    #[display(
        "Dice values out of date: request has total {} remaining {}, game has total {} remaining {}",
        requested_total,
        requested_remaining,
        total,
        remaining
    )]
    StaleDiceValue {
        /// Total claimed by the request.
        requested_total: u8,
        /// Remaining value claimed by the request.
        requested_remaining: u8,
        /// Total of the last recorded throw.
        total: u8,
        /// Remaining value recorded in the game.
        remaining: u8,
    },

    /// The moved token does not belong to the acting player.
    #[display("Token belongs to player {}, not player {}", owner, player)]
    NotTokenOwner {
        /// Owner named in the request.
        owner: PlayerId,
        /// Acting player.
        player: PlayerId,
    },

    /// The token id is not the one the player chose for this game.
    #[display("Player {} does not play with token {}", player, token)]
    UnknownToken {
        /// Acting player.
        player: PlayerId,
        /// Token named in the request.
        token: TokenId,
    },

    /// The token's reported position disagrees with the source cell.
    #[display("Token position does not match the source cell")]
    SourceMismatch,

    /// No piece of the player's token sits on the source cell.
    #[display("No token of player {} at {}", player, source_cell)]
    NoTokenAtSource {
        /// Acting player.
        player: PlayerId,
        /// Cell named as the source.
        source_cell: Position,
    },

    /// All four pieces of the player are already on the board.
    #[display("Player {} has no token left off the board", _0)]
    NoTokenOffBoard(PlayerId),

    /// A token only enters on a throw of 1 or 4.
    #[display("A token can only enter on a throw of 1 or 4, not {}", _0)]
    EntryNeedsOneOrFour(u8),

    /// Entering tokens must land exactly on the player's entry cell.
    #[display("A token must enter at {}", _0)]
    EntryMustTargetEntryPoint(Position),

    /// The cell lies outside the board.
    #[display("Cell {} is outside the board", _0)]
    OutsideBoard(Position),

    /// The cell is not on the mover's traverse path.
    #[display("Cell {} is not on the player's path", _0)]
    NotOnPath(Position),

    /// The target is not strictly ahead of the source.
    #[display("Target {} is not ahead of {}", target, source_cell)]
    NotForward {
        /// Cell the token moves from.
        source_cell: Position,
        /// Requested target cell.
        target: Position,
    },

    /// The move needs more steps than the dice value left.
    #[display("Move needs {} steps but only {} remain", needed, remaining)]
    ExceedsDiceValue {
        /// Steps the move would consume.
        needed: usize,
        /// Dice value still available.
        remaining: u8,
    },

    /// Tokens already home cannot move again.
    #[display("Token at {} is already home", _0)]
    AlreadyHome(Position),

    /// A safe cell is held by another player's tokens.
    #[display("Safe cell {} is held by another player", _0)]
    CellBlocked(Position),

    /// A loaded state breaks the structural invariants (landmarks or paths).
    #[display("Corrupted game state: {}", _0)]
    CorruptedState(String),
}

impl RuleError {
    /// Returns true for failures that indicate a broken invariant rather than a bad request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuleError::CorruptedState(_))
    }
}

impl std::error::Error for RuleError {}
