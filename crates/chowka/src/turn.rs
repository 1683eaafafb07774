//! Turn order.

use crate::error::RuleError;
use crate::state::PlayerId;
use tracing::instrument;

/// Returns the player who acts after `current`, wrapping to the first seat.
///
/// # Errors
///
/// Returns [`RuleError::InvalidRoster`] if `current` is not seated.
#[instrument]
pub fn next_player(order: &[PlayerId], current: PlayerId) -> Result<PlayerId, RuleError> {
    let index = order
        .iter()
        .position(|id| *id == current)
        .ok_or_else(|| RuleError::InvalidRoster(format!("player {current} is not seated")))?;
    Ok(order[(index + 1) % order.len()])
}
