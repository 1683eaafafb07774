//! Applying token moves.
//!
//! A move is validated against [`LegalMove`] first; only a fully legal move
//! produces a new state. The input state is never modified.

use crate::contracts::{LegalMove, MovePlan};
use crate::error::RuleError;
use crate::geometry::Position;
use crate::state::{GameState, PlayerId, RemovedToken, TOKENS_PER_PLAYER, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// The piece being moved, as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    /// Owner of the piece.
    pub token_belongs_to: PlayerId,
    /// Token design of the piece.
    pub token_id: TokenId,
    /// Cell the piece is on; `None` while off the board.
    pub current_pos: Option<Position>,
}

/// A request to move one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Player asking to move.
    pub player_id: PlayerId,
    /// Total of the throw the client believes is current.
    pub total_diced_value: u8,
    /// Value the client believes is left.
    pub remaining_dice_value: u8,
    /// Piece to move.
    pub moved_token: TokenRef,
    /// Cell the piece leaves; `None` to enter a piece.
    pub source: Option<Position>,
    /// Cell the piece should land on.
    pub target: Position,
}

/// Result of an applied move.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_getters::Dissolve)]
pub struct MoveOutcome {
    /// State after the move.
    state: GameState,
    /// The moved piece at its new cell.
    moved_token: TokenRef,
    /// Pieces captured by the move.
    removed_tokens: Vec<RemovedToken>,
    /// Winner, if this move decided the match.
    winner_id: Option<PlayerId>,
}

impl MoveOutcome {
    /// Dice value left after the move.
    pub fn remaining_dice_value(&self) -> u8 {
        *self.state.remaining_dice_value()
    }
}

/// Validates `request` against `state` and returns the resulting state.
///
/// # Errors
///
/// Returns the first [`RuleError`] the request violates; `state` is untouched either way.
#[instrument(skip(state), fields(player = %request.player_id, target = %request.target))]
pub fn apply_move(state: &GameState, request: &MoveRequest) -> Result<MoveOutcome, RuleError> {
    let plan = LegalMove::check(state, request)?;
    Ok(execute(state, request, plan))
}

fn execute(state: &GameState, request: &MoveRequest, plan: MovePlan) -> MoveOutcome {
    let player = request.player_id;
    let token = request.moved_token.token_id;
    let safe = state.landmarks().is_safe_cell(plan.target);
    let mut next = state.clone();

    if let Some(source) = plan.source {
        let lifted = next.occupancy_mut().remove_one(source, player, token);
        debug_assert!(lifted, "validated source must hold the token");
    }

    let removed_tokens = if safe {
        Vec::new()
    } else {
        next.occupancy_mut().evict_others(plan.target, player)
    };
    for removed in &removed_tokens {
        info!(
            captured = %removed.token_belongs_to,
            count = removed.count,
            at = %removed.old_pos,
            "Tokens captured"
        );
    }

    let height = next.occupancy_mut().stack(plan.target, player, token);
    next.spend(plan.steps);
    debug!(steps = plan.steps, height, "Token moved");

    if plan.reaches_home && next.home_count(player) >= TOKENS_PER_PLAYER {
        next.declare_winner(player);
    }

    let winner_id = *next.winner_id();
    MoveOutcome {
        state: next,
        moved_token: TokenRef {
            current_pos: Some(plan.target),
            ..request.moved_token
        },
        removed_tokens,
        winner_id,
    }
}
