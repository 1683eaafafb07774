//! Authoritative state of one match.

use crate::dice::StickThrow;
use crate::error::RuleError;
use crate::geometry::{BoardLandmarks, BoardSize, EntryPoint, PerEntry, Position};
use crate::path::{TraversePath, find_traverse_paths};
use crate::turn::next_player;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Pieces each player brings to the board.
pub const TOKENS_PER_PLAYER: u8 = 4;

/// Largest number of seated players.
pub const MAX_PLAYERS: usize = EntryPoint::ALL.len();

/// Identifier of a registered player.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

/// Identifier of a token design (the piece a player chose to play with).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct TokenId(pub i32);

/// A player's token choice for a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenChoice {
    /// Player making the choice.
    pub player_id: PlayerId,
    /// Token design chosen.
    pub token_id: TokenId,
}

/// Seats the players of a new game.
///
/// Seats follow registration order, truncated to the number of players who
/// chose a token. Every one of those players must have chosen exactly one token.
///
/// # Errors
///
/// Returns [`RuleError::InvalidRoster`] for empty or oversized rosters,
/// duplicate players, or registered players without a token choice.
#[instrument]
pub fn seat_roster(
    registered: &[PlayerId],
    choices: &[TokenChoice],
) -> Result<Vec<TokenChoice>, RuleError> {
    if choices.is_empty() || choices.len() > MAX_PLAYERS {
        return Err(RuleError::InvalidRoster(format!(
            "between 1 and {MAX_PLAYERS} players must choose a token, got {}",
            choices.len()
        )));
    }
    let order: Vec<PlayerId> = if registered.is_empty() {
        choices.iter().map(|c| c.player_id).collect()
    } else {
        registered.iter().copied().take(choices.len()).collect()
    };
    if order.len() < choices.len() {
        return Err(RuleError::InvalidRoster(format!(
            "{} players chose tokens but only {} are registered",
            choices.len(),
            order.len()
        )));
    }

    let mut seen = HashSet::new();
    order
        .into_iter()
        .map(|player_id| {
            if !seen.insert(player_id) {
                return Err(RuleError::InvalidRoster(format!("player {player_id} listed twice")));
            }
            let mut picks = choices.iter().filter(|c| c.player_id == player_id);
            match (picks.next(), picks.next()) {
                (Some(choice), None) => Ok(*choice),
                (None, _) => Err(RuleError::InvalidRoster(format!(
                    "player {player_id} has not chosen a token"
                ))),
                (Some(_), Some(_)) => Err(RuleError::InvalidRoster(format!(
                    "player {player_id} chose more than one token"
                ))),
            }
        })
        .collect()
}

/// A seated player and the entry point assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    player_id: PlayerId,
    token_id: TokenId,
    entry_point: EntryPoint,
    entry_pos: Position,
}

/// Pieces of one player's token sharing a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    /// Owner of the pieces.
    pub player_id: PlayerId,
    /// Token design of the pieces.
    pub token_id: TokenId,
    /// How many pieces are stacked here.
    pub count: u8,
}

/// Pieces sent back off the board by a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedToken {
    /// Owner of the captured pieces.
    pub token_belongs_to: PlayerId,
    /// Token design of the captured pieces.
    pub token_id: TokenId,
    /// Number of pieces captured together.
    pub count: u8,
    /// Cell the pieces were captured on.
    pub old_pos: Position,
}

/// Serialized form of one occupied cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedCell {
    /// The cell.
    pub pos: Position,
    /// Stacks on the cell.
    pub tokens: Vec<Occupant>,
}

/// Which pieces sit on which cells. Empty cells are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OccupiedCell>", into = "Vec<OccupiedCell>")]
pub struct CellOccupancy(BTreeMap<Position, Vec<Occupant>>);

impl CellOccupancy {
    /// Stacks on a cell, empty when nothing is there.
    pub fn occupants(&self, pos: Position) -> &[Occupant] {
        self.0.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &[Occupant])> {
        self.0.iter().map(|(pos, stacks)| (*pos, stacks.as_slice()))
    }

    /// Pieces of `player` on `pos`.
    pub fn count_at(&self, pos: Position, player: PlayerId) -> u8 {
        self.occupants(pos)
            .iter()
            .filter(|o| o.player_id == player)
            .map(|o| o.count)
            .sum()
    }

    /// Pieces of `player` anywhere on the board, including home.
    pub fn pieces_on_board(&self, player: PlayerId) -> u8 {
        self.0
            .values()
            .flatten()
            .filter(|o| o.player_id == player)
            .map(|o| o.count)
            .sum()
    }

    /// Whether `player` has a piece of `token` on `pos`.
    pub fn has_token(&self, pos: Position, player: PlayerId, token: TokenId) -> bool {
        self.occupants(pos)
            .iter()
            .any(|o| o.player_id == player && o.token_id == token && o.count > 0)
    }

    /// Whether any other player's pieces sit on `pos`.
    pub fn held_by_other(&self, pos: Position, player: PlayerId) -> bool {
        self.occupants(pos).iter().any(|o| o.player_id != player)
    }

    /// Lifts one piece off `pos`. Returns false if there was none to lift.
    pub(crate) fn remove_one(&mut self, pos: Position, player: PlayerId, token: TokenId) -> bool {
        let Some(stacks) = self.0.get_mut(&pos) else {
            return false;
        };
        let Some(index) = stacks
            .iter()
            .position(|o| o.player_id == player && o.token_id == token && o.count > 0)
        else {
            return false;
        };
        stacks[index].count -= 1;
        if stacks[index].count == 0 {
            stacks.remove(index);
        }
        if stacks.is_empty() {
            self.0.remove(&pos);
        }
        true
    }

    /// Sends every piece on `pos` not owned by `player` back off the board.
    pub(crate) fn evict_others(&mut self, pos: Position, player: PlayerId) -> Vec<RemovedToken> {
        let Some(stacks) = self.0.get_mut(&pos) else {
            return Vec::new();
        };
        let (evicted, kept): (Vec<Occupant>, Vec<Occupant>) =
            stacks.drain(..).partition(|o| o.player_id != player);
        *stacks = kept;
        if stacks.is_empty() {
            self.0.remove(&pos);
        }
        evicted
            .into_iter()
            .map(|o| RemovedToken {
                token_belongs_to: o.player_id,
                token_id: o.token_id,
                count: o.count,
                old_pos: pos,
            })
            .collect()
    }

    /// Puts one piece on `pos`, stacking onto a matching stack. Returns the stack height.
    pub(crate) fn stack(&mut self, pos: Position, player: PlayerId, token: TokenId) -> u8 {
        let stacks = self.0.entry(pos).or_default();
        match stacks
            .iter_mut()
            .find(|o| o.player_id == player && o.token_id == token)
        {
            Some(existing) => {
                existing.count += 1;
                existing.count
            }
            None => {
                stacks.push(Occupant {
                    player_id: player,
                    token_id: token,
                    count: 1,
                });
                1
            }
        }
    }
}

impl From<Vec<OccupiedCell>> for CellOccupancy {
    fn from(cells: Vec<OccupiedCell>) -> Self {
        Self(
            cells
                .into_iter()
                .filter(|cell| !cell.tokens.is_empty())
                .map(|cell| (cell.pos, cell.tokens))
                .collect(),
        )
    }
}

impl From<CellOccupancy> for Vec<OccupiedCell> {
    fn from(occupancy: CellOccupancy) -> Self {
        occupancy
            .0
            .into_iter()
            .map(|(pos, tokens)| OccupiedCell { pos, tokens })
            .collect()
    }
}

/// Where the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting for `player` to throw the sticks.
    AwaitingRoll {
        /// Expected roller.
        player: PlayerId,
    },
    /// `player` has thrown and may still move `remaining` steps.
    AwaitingMove {
        /// Player who threw.
        player: PlayerId,
        /// Dice value not yet spent.
        remaining: u8,
    },
    /// The match is over.
    Finished {
        /// Player with four pieces home.
        winner: PlayerId,
    },
}

/// Complete state of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Side length of the board.
    board_size: BoardSize,
    /// Most recent throw.
    last_dice_set: Option<StickThrow>,
    /// Player who made the most recent throw.
    last_player_id: Option<PlayerId>,
    /// Player expected to throw next.
    next_player_id: PlayerId,
    /// Value of the most recent throw not yet spent on moves.
    remaining_dice_value: u8,
    /// Corners, entry cells and final cell.
    #[serde(rename = "boardCornersAndSafePos")]
    landmarks: BoardLandmarks,
    /// Seats in turn order.
    #[serde(rename = "playersEntryPoint")]
    seats: Vec<Seat>,
    /// Path of each entry point.
    traverse_paths: PerEntry<TraversePath>,
    /// Pieces on the board.
    #[serde(rename = "tokenPositions")]
    occupancy: CellOccupancy,
    /// Winner, once decided.
    winner_id: Option<PlayerId>,
}

impl GameState {
    /// Sets up a fresh match: landmarks, paths and one seat per roster entry.
    ///
    /// The first seated player throws first.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidRoster`] for an empty, oversized or duplicated roster.
    #[instrument(skip(roster), fields(size = %size, players = roster.len()))]
    pub fn new(size: BoardSize, roster: &[TokenChoice]) -> Result<Self, RuleError> {
        if roster.is_empty() || roster.len() > MAX_PLAYERS {
            return Err(RuleError::InvalidRoster(format!(
                "a game seats between 1 and {MAX_PLAYERS} players, got {}",
                roster.len()
            )));
        }
        let distinct: HashSet<PlayerId> = roster.iter().map(|c| c.player_id).collect();
        if distinct.len() != roster.len() {
            return Err(RuleError::InvalidRoster("a player is seated twice".to_string()));
        }

        let landmarks = BoardLandmarks::for_size(size);
        let traverse_paths = find_traverse_paths(size, &landmarks);
        let seats: Vec<Seat> = roster
            .iter()
            .zip(EntryPoint::ALL)
            .map(|(choice, entry_point)| Seat {
                player_id: choice.player_id,
                token_id: choice.token_id,
                entry_point,
                entry_pos: landmarks.entry(entry_point),
            })
            .collect();

        info!(first = %seats[0].player_id, "Game state created");
        Ok(Self {
            board_size: size,
            last_dice_set: None,
            last_player_id: None,
            next_player_id: seats[0].player_id,
            remaining_dice_value: 0,
            landmarks,
            seats,
            traverse_paths,
            occupancy: CellOccupancy::default(),
            winner_id: None,
        })
    }

    /// Seat of a player, if seated.
    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player)
    }

    /// Player ids in turn order.
    pub fn turn_order(&self) -> Vec<PlayerId> {
        self.seats.iter().map(|s| s.player_id).collect()
    }

    /// Traverse path of one entry point.
    pub fn path(&self, entry: EntryPoint) -> &TraversePath {
        self.traverse_paths.get(entry)
    }

    /// Pieces of `player` not yet on the board.
    pub fn off_board_count(&self, player: PlayerId) -> u8 {
        TOKENS_PER_PLAYER.saturating_sub(self.occupancy.pieces_on_board(player))
    }

    /// Pieces of `player` on the final cell.
    pub fn home_count(&self, player: PlayerId) -> u8 {
        self.occupancy.count_at(*self.landmarks.final_pos(), player)
    }

    /// Current phase of the turn cycle.
    pub fn phase(&self) -> TurnPhase {
        match (self.winner_id, self.last_player_id) {
            (Some(winner), _) => TurnPhase::Finished { winner },
            (None, Some(player)) if self.remaining_dice_value > 0 => TurnPhase::AwaitingMove {
                player,
                remaining: self.remaining_dice_value,
            },
            _ => TurnPhase::AwaitingRoll {
                player: self.next_player_id,
            },
        }
    }

    /// Records a throw by `player` and hands the next throw to the following seat.
    ///
    /// Any value left over from the previous throw is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::GameOver`] once a winner exists, and
    /// [`RuleError::WrongPlayer`] if `player` is not the expected roller.
    #[instrument(skip(self, throw), fields(total = throw.total_value()))]
    pub fn record_roll(&mut self, player: PlayerId, throw: StickThrow) -> Result<(), RuleError> {
        if self.winner_id.is_some() {
            return Err(RuleError::GameOver);
        }
        if player != self.next_player_id {
            warn!(expected = %self.next_player_id, "Roll out of turn");
            return Err(RuleError::WrongPlayer {
                expected: self.next_player_id,
                actual: player,
            });
        }
        let next = next_player(&self.turn_order(), player)?;

        self.last_dice_set = Some(throw);
        self.last_player_id = Some(player);
        self.remaining_dice_value = throw.total_value();
        self.next_player_id = next;

        info!(next = %next, "Roll recorded");
        Ok(())
    }

    /// Forfeits whatever value is left of `player`'s throw.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::GameOver`], [`RuleError::WrongPlayer`] if `player`
    /// did not make the last throw, or [`RuleError::NoDiceValue`] if nothing is left.
    #[instrument(skip(self))]
    pub fn pass_turn(&mut self, player: PlayerId) -> Result<(), RuleError> {
        self.ensure_mover(player)?;
        debug!(forfeited = self.remaining_dice_value, "Turn passed");
        self.remaining_dice_value = 0;
        Ok(())
    }

    /// Checks that `player` may spend dice value right now.
    pub(crate) fn ensure_mover(&self, player: PlayerId) -> Result<(), RuleError> {
        if self.winner_id.is_some() {
            return Err(RuleError::GameOver);
        }
        match self.last_player_id {
            Some(last) if last == player => {}
            Some(last) if self.remaining_dice_value > 0 => {
                return Err(RuleError::WrongPlayer {
                    expected: last,
                    actual: player,
                });
            }
            _ if player == self.next_player_id => return Err(RuleError::NoDiceValue),
            _ => {
                return Err(RuleError::WrongPlayer {
                    expected: self.next_player_id,
                    actual: player,
                });
            }
        }
        if self.remaining_dice_value == 0 {
            return Err(RuleError::NoDiceValue);
        }
        Ok(())
    }

    /// Checks that the stored landmarks and paths are the ones the board size implies.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::CorruptedState`] describing the first mismatch.
    #[instrument(skip(self), fields(size = %self.board_size))]
    pub fn verify(&self) -> Result<(), RuleError> {
        let expected = BoardLandmarks::for_size(self.board_size);
        if self.landmarks != expected {
            return Err(RuleError::CorruptedState(
                "board landmarks do not match the board size".to_string(),
            ));
        }
        let paths = find_traverse_paths(self.board_size, &expected);
        if self.traverse_paths != paths {
            return Err(RuleError::CorruptedState(
                "traverse paths do not match the board size".to_string(),
            ));
        }
        if self.seats.is_empty() || self.seat(self.next_player_id).is_none() {
            return Err(RuleError::CorruptedState("turn pointer names no seat".to_string()));
        }
        if let Some((pos, _)) = self.occupancy.iter().find(|(pos, _)| !self.board_size.contains(*pos)) {
            return Err(RuleError::CorruptedState(format!("token outside the board at {pos}")));
        }
        Ok(())
    }

    pub(crate) fn occupancy_mut(&mut self) -> &mut CellOccupancy {
        &mut self.occupancy
    }

    pub(crate) fn spend(&mut self, steps: u8) {
        self.remaining_dice_value = self.remaining_dice_value.saturating_sub(steps);
    }

    pub(crate) fn declare_winner(&mut self, player: PlayerId) {
        info!(winner = %player, "Winner declared");
        self.winner_id = Some(player);
        self.remaining_dice_value = 0;
    }
}
