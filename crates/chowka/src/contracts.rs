//! Preconditions a move must satisfy before it touches the board.
//!
//! Each check is a small named rule; [`LegalMove`] composes them and returns
//! a [`MovePlan`] describing what the move will do.

use crate::error::RuleError;
use crate::moves::MoveRequest;
use crate::geometry::Position;
use crate::state::{GameState, Seat};
use tracing::{instrument, warn};

/// A validated move, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Cell the piece leaves; `None` when it enters from off the board.
    pub source: Option<Position>,
    /// Cell the piece lands on.
    pub target: Position,
    /// Dice value the move consumes.
    pub steps: u8,
    /// Whether the piece lands on the final cell.
    pub reaches_home: bool,
}

/// Precondition: the mover made the last throw, has value left, and quotes it correctly.
pub struct PlayersTurn;

impl PlayersTurn {
    /// Checks turn ownership and the dice values quoted by the request.
    #[instrument(skip_all, fields(player = %request.player_id))]
    pub fn check(state: &GameState, request: &MoveRequest) -> Result<(), RuleError> {
        state.ensure_mover(request.player_id)?;
        let total = (*state.last_dice_set()).map_or(0, |t| t.total_value());
        let remaining = *state.remaining_dice_value();
        if request.total_diced_value != total || request.remaining_dice_value != remaining {
            return Err(RuleError::StaleDiceValue {
                requested_total: request.total_diced_value,
                requested_remaining: request.remaining_dice_value,
                total,
                remaining,
            });
        }
        Ok(())
    }
}

/// Precondition: the moved token is the mover's own, and sits where the request says.
pub struct OwnsToken;

impl OwnsToken {
    /// Returns the mover's seat when the token checks out.
    #[instrument(skip_all, fields(player = %request.player_id))]
    pub fn check<'a>(state: &'a GameState, request: &MoveRequest) -> Result<&'a Seat, RuleError> {
        let token = &request.moved_token;
        if token.token_belongs_to != request.player_id {
            return Err(RuleError::NotTokenOwner {
                owner: token.token_belongs_to,
                player: request.player_id,
            });
        }
        let seat = state.seat(request.player_id).ok_or_else(|| {
            RuleError::InvalidRoster(format!("player {} is not seated", request.player_id))
        })?;
        if *seat.token_id() != token.token_id {
            return Err(RuleError::UnknownToken {
                player: request.player_id,
                token: token.token_id,
            });
        }
        if token.current_pos != request.source {
            return Err(RuleError::SourceMismatch);
        }
        Ok(seat)
    }
}

/// Precondition: the target is reachable with the dice value left.
pub struct LegalTarget;

impl LegalTarget {
    /// Works out how many steps the move takes, rejecting unreachable targets.
    #[instrument(skip_all, fields(target = %request.target))]
    pub fn check(state: &GameState, seat: &Seat, request: &MoveRequest) -> Result<MovePlan, RuleError> {
        let size = *state.board_size();
        let landmarks = state.landmarks();
        let player = request.player_id;
        let target = request.target;
        let remaining = *state.remaining_dice_value();

        for cell in request.source.into_iter().chain(std::iter::once(target)) {
            if !size.contains(cell) {
                return Err(RuleError::OutsideBoard(cell));
            }
        }

        let plan = match request.source {
            None => {
                let throw = (*state.last_dice_set()).ok_or(RuleError::NoDiceValue)?;
                if !throw.allows_entry() {
                    return Err(RuleError::EntryNeedsOneOrFour(throw.total_value()));
                }
                if target != *seat.entry_pos() {
                    return Err(RuleError::EntryMustTargetEntryPoint(*seat.entry_pos()));
                }
                if state.off_board_count(player) == 0 {
                    return Err(RuleError::NoTokenOffBoard(player));
                }
                let steps = throw.total_value();
                if steps > remaining {
                    return Err(RuleError::ExceedsDiceValue {
                        needed: usize::from(steps),
                        remaining,
                    });
                }
                MovePlan {
                    source: None,
                    target,
                    steps,
                    reaches_home: false,
                }
            }
            Some(source) => {
                if !state.occupancy().has_token(source, player, *seat.token_id()) {
                    return Err(RuleError::NoTokenAtSource {
                        player,
                        source_cell: source,
                    });
                }
                if landmarks.is_final_cell(source) {
                    return Err(RuleError::AlreadyHome(source));
                }
                let path = state.path(*seat.entry_point());
                let from = path.index_of(source).ok_or(RuleError::NotOnPath(source))?;
                let reaches_home = landmarks.is_final_cell(target);
                let to = if reaches_home {
                    path.len()
                } else {
                    path.index_of(target).ok_or(RuleError::NotOnPath(target))?
                };
                if to <= from {
                    return Err(RuleError::NotForward {
                        source_cell: source,
                        target,
                    });
                }
                let needed = to - from;
                let steps = u8::try_from(needed)
                    .ok()
                    .filter(|steps| *steps <= remaining)
                    .ok_or(RuleError::ExceedsDiceValue { needed, remaining })?;
                MovePlan {
                    source: Some(source),
                    target,
                    steps,
                    reaches_home,
                }
            }
        };

        // The final cell is everyone's home and never blocks.
        if landmarks.is_safe_cell(target)
            && !landmarks.is_final_cell(target)
            && state.occupancy().held_by_other(target, player)
        {
            return Err(RuleError::CellBlocked(target));
        }

        Ok(plan)
    }
}

/// Composite precondition: turn, ownership and target are all legal.
pub struct LegalMove;

impl LegalMove {
    /// Validates every precondition for a move.
    #[instrument(skip_all, fields(player = %request.player_id))]
    pub fn check(state: &GameState, request: &MoveRequest) -> Result<MovePlan, RuleError> {
        let result = PlayersTurn::check(state, request)
            .and_then(|()| OwnsToken::check(state, request))
            .and_then(|seat| LegalTarget::check(state, seat, request));
        if let Err(e) = &result {
            warn!(error = %e, "Move rejected");
        }
        result
    }
}
