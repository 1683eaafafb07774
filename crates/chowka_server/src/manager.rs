//! Game management for the HTTP service.
//!
//! Each game lives behind its own async mutex. A mutation locks the game,
//! works on a copy, persists the copy, and only then replaces the shared state,
//! so a failed save leaves the game exactly as it was.

use chowka::{
    BoardSize, GameState, MoveOutcome, MoveRequest, PlayerId, RuleError, StickThrow, TokenChoice,
    apply_move, seat_roster,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use crate::db::{GameId, GameStore};
use crate::error::ServiceError;

type SharedGame = Arc<Mutex<GameState>>;

/// What became of a requested move.
#[derive(Debug, Clone)]
pub enum MoveResult {
    /// The move was legal and is now part of the game.
    Applied(MoveOutcome),
    /// The move broke a rule; `state` is the unchanged game it was checked against.
    Rejected {
        /// Rule the move broke.
        reason: RuleError,
        /// Game state at the time of the check.
        state: GameState,
    },
}

/// Owns every live game and serializes mutations per game.
#[derive(Debug, Clone)]
pub struct GameManager {
    store: Arc<dyn GameStore>,
    games: Arc<RwLock<HashMap<GameId, SharedGame>>>,
    max_board_size: usize,
}

impl GameManager {
    /// Creates a manager backed by `store`.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn GameStore>, max_board_size: usize) -> Self {
        info!("Creating game manager");
        Self {
            store,
            games: Arc::new(RwLock::new(HashMap::new())),
            max_board_size,
        }
    }

    /// Sets up and stores a new game.
    ///
    /// `registered` gives the seat order; when empty, the order of `choices` is used.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a bad size or roster, and
    /// [`ServiceError::Persistence`] if the game cannot be stored.
    #[instrument(skip(self, choices, registered), fields(players = choices.len()))]
    pub async fn create_game(
        &self,
        board_size: usize,
        choices: &[TokenChoice],
        registered: &[PlayerId],
    ) -> Result<(GameId, GameState), ServiceError> {
        if board_size > self.max_board_size {
            return Err(RuleError::BoardTooLarge {
                size: board_size,
                max: self.max_board_size,
            }
            .into());
        }
        let size = BoardSize::new(board_size)?;
        let roster = seat_roster(registered, choices)?;
        let state = GameState::new(size, &roster)?;

        let id = self.store.insert_game(&state).await?;
        self.games
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(state.clone())));

        info!(game_id = %id, size = board_size, "Game created");
        Ok((id, state))
    }

    /// Current state of a game.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown ids.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, id: GameId) -> Result<GameState, ServiceError> {
        let game = self.game(id).await?;
        let state = game.lock().await.clone();
        Ok(state)
    }

    /// Throws the sticks for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if `player` may not roll now.
    #[instrument(skip(self))]
    pub async fn roll_dice(&self, id: GameId, player: PlayerId) -> Result<GameState, ServiceError> {
        let throw = {
            let mut rng = rand::thread_rng();
            StickThrow::roll(&mut rng)
        };
        self.record_throw(id, player, throw).await
    }

    /// Records a given throw for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if `player` may not roll now.
    #[instrument(skip(self, throw), fields(total = throw.total_value()))]
    pub async fn record_throw(
        &self,
        id: GameId,
        player: PlayerId,
        throw: StickThrow,
    ) -> Result<GameState, ServiceError> {
        self.mutate(id, |state| state.record_roll(player, throw))
            .await
            .map(|(state, ())| state)
    }

    /// Validates and applies a move.
    ///
    /// An illegal move is not an error here: it comes back as
    /// [`MoveResult::Rejected`] together with the state it was judged against.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown games, and
    /// [`ServiceError::Persistence`] if an accepted move cannot be stored.
    #[instrument(skip(self, request), fields(player = %request.player_id, target = %request.target))]
    pub async fn move_token(
        &self,
        id: GameId,
        request: &MoveRequest,
    ) -> Result<MoveResult, ServiceError> {
        let game = self.game(id).await?;
        let mut current = game.lock().await;

        let outcome = match apply_move(&current, request) {
            Ok(outcome) => outcome,
            Err(reason) if reason.is_fatal() => return Err(reason.into()),
            Err(reason) => {
                debug!(game_id = %id, %reason, "Move rejected");
                return Ok(MoveResult::Rejected {
                    reason,
                    state: current.clone(),
                });
            }
        };

        self.store.save_game(id, outcome.state()).await?;
        *current = outcome.state().clone();

        if let Some(winner) = outcome.winner_id() {
            info!(game_id = %id, winner = %winner, "Game won");
        }
        Ok(MoveResult::Applied(outcome))
    }

    /// Gives up the rest of `player`'s throw.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if `player` has nothing to give up.
    #[instrument(skip(self))]
    pub async fn pass_turn(&self, id: GameId, player: PlayerId) -> Result<GameState, ServiceError> {
        self.mutate(id, |state| state.pass_turn(player))
            .await
            .map(|(state, ())| state)
    }

    /// Runs `change` on a copy of the game, persists it, then publishes it.
    async fn mutate<T>(
        &self,
        id: GameId,
        change: impl FnOnce(&mut GameState) -> Result<T, RuleError>,
    ) -> Result<(GameState, T), ServiceError> {
        let game = self.game(id).await?;
        let mut current = game.lock().await;

        let mut next = current.clone();
        let result = change(&mut next)?;
        self.store.save_game(id, &next).await?;
        *current = next.clone();

        debug!(game_id = %id, remaining = *next.remaining_dice_value(), "Game updated");
        Ok((next, result))
    }

    /// Finds a game in memory, loading it from the store on a miss.
    async fn game(&self, id: GameId) -> Result<SharedGame, ServiceError> {
        if let Some(game) = self.games.read().await.get(&id) {
            return Ok(Arc::clone(game));
        }

        debug!(game_id = %id, "Game not in memory, loading");
        let state = self
            .store
            .load_game(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        if let Err(e) = state.verify() {
            error!(game_id = %id, error = %e, "Stored game failed verification");
            return Err(ServiceError::Internal(e.to_string()));
        }
        let roster = self.store.load_roster(id).await?;
        if !seats_match(&state, &roster) {
            error!(game_id = %id, players = roster.len(), "Stored seats disagree with the game roster");
            return Err(ServiceError::Internal(format!(
                "seats of game {id} do not match its recorded players"
            )));
        }

        let mut games = self.games.write().await;
        let game = games
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(state)));
        Ok(Arc::clone(game))
    }
}

/// Whether the state's seats are exactly `roster`, in the same order.
fn seats_match(state: &GameState, roster: &[TokenChoice]) -> bool {
    state.seats().len() == roster.len()
        && state
            .seats()
            .iter()
            .zip(roster)
            .all(|(seat, choice)| {
                *seat.player_id() == choice.player_id && *seat.token_id() == choice.token_id
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use chowka::{Stick, TokenId};
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    /// In-memory store that can be told to fail saves.
    #[derive(Debug, Default)]
    struct MemoryStore {
        next_id: AtomicI32,
        fail_saves: AtomicBool,
        games: std::sync::Mutex<HashMap<GameId, GameState>>,
        rosters: std::sync::Mutex<HashMap<GameId, Vec<TokenChoice>>>,
    }

    #[async_trait::async_trait]
    impl GameStore for MemoryStore {
        async fn insert_game(&self, state: &GameState) -> Result<GameId, DbError> {
            let id = GameId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let roster = state
                .seats()
                .iter()
                .map(|seat| TokenChoice {
                    player_id: *seat.player_id(),
                    token_id: *seat.token_id(),
                })
                .collect();
            self.games.lock().expect("lock").insert(id, state.clone());
            self.rosters.lock().expect("lock").insert(id, roster);
            Ok(id)
        }

        async fn save_game(&self, id: GameId, state: &GameState) -> Result<(), DbError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(DbError::new("disk unavailable"));
            }
            self.games.lock().expect("lock").insert(id, state.clone());
            Ok(())
        }

        async fn load_game(&self, id: GameId) -> Result<Option<GameState>, DbError> {
            Ok(self.games.lock().expect("lock").get(&id).cloned())
        }

        async fn load_roster(&self, id: GameId) -> Result<Vec<TokenChoice>, DbError> {
            Ok(self
                .rosters
                .lock()
                .expect("lock")
                .get(&id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn choices() -> Vec<TokenChoice> {
        vec![
            TokenChoice {
                player_id: PlayerId(1),
                token_id: TokenId(1),
            },
            TokenChoice {
                player_id: PlayerId(2),
                token_id: TokenId(2),
            },
        ]
    }

    fn four() -> StickThrow {
        StickThrow::from_sticks([Stick::Inner; 4])
    }

    /// Player 1 entering a piece onto `target` with a fresh throw of four.
    fn enter(target: chowka::Position) -> MoveRequest {
        MoveRequest {
            player_id: PlayerId(1),
            total_diced_value: 4,
            remaining_dice_value: 4,
            moved_token: chowka::TokenRef {
                token_belongs_to: PlayerId(1),
                token_id: TokenId(1),
                current_pos: None,
            },
            source: None,
            target,
        }
    }

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store, 13);
        let (id, state) = manager.create_game(5, &choices(), &[]).await.expect("created");
        assert_eq!(manager.snapshot(id).await.expect("snapshot"), state);
    }

    #[tokio::test]
    async fn test_board_size_capped() {
        let manager = GameManager::new(Arc::new(MemoryStore::default()), 9);
        let result = manager.create_game(11, &choices(), &[]).await;
        assert!(matches!(
            result,
            Err(ServiceError::Validation(RuleError::BoardTooLarge { size: 11, max: 9 }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_game_not_found() {
        let manager = GameManager::new(Arc::new(MemoryStore::default()), 13);
        let result = manager.snapshot(GameId(42)).await;
        assert!(matches!(result, Err(ServiceError::NotFound(GameId(42)))));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_game_unchanged() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store.clone(), 13);
        let (id, before) = manager.create_game(5, &choices(), &[]).await.expect("created");

        store.fail_saves.store(true, Ordering::SeqCst);
        let result = manager.record_throw(id, PlayerId(1), four()).await;
        assert!(matches!(result, Err(ServiceError::Persistence(_))));
        assert_eq!(manager.snapshot(id).await.expect("snapshot"), before);

        store.fail_saves.store(false, Ordering::SeqCst);
        let after = manager.record_throw(id, PlayerId(1), four()).await.expect("rolled");
        assert_eq!(*after.remaining_dice_value(), 4);
    }

    #[tokio::test]
    async fn test_loads_games_missing_from_memory() {
        let store = Arc::new(MemoryStore::default());
        let first = GameManager::new(store.clone(), 13);
        let (id, state) = first.create_game(7, &choices(), &[]).await.expect("created");

        let restarted = GameManager::new(store, 13);
        assert_eq!(restarted.snapshot(id).await.expect("loaded"), state);
    }

    #[tokio::test]
    async fn test_corrupted_store_is_internal_error() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store.clone(), 13);
        let (id, state) = manager.create_game(5, &choices(), &[]).await.expect("created");

        let mut json = serde_json::to_value(&state).expect("serialize");
        json["traversePaths"]["top"] = serde_json::json!([]);
        let tampered: GameState = serde_json::from_value(json).expect("deserialize");
        store.games.lock().expect("lock").insert(id, tampered);

        let fresh = GameManager::new(store, 13);
        assert!(matches!(fresh.snapshot(id).await, Err(ServiceError::Internal(_))));
    }

    #[tokio::test]
    async fn test_concurrent_rolls_admit_one() {
        let manager = GameManager::new(Arc::new(MemoryStore::default()), 13);
        let (id, _) = manager.create_game(5, &choices(), &[]).await.expect("created");

        let a = manager.clone();
        let b = manager.clone();
        let (first, second) = tokio::join!(
            a.record_throw(id, PlayerId(1), four()),
            b.record_throw(id, PlayerId(1), four()),
        );
        assert_eq!(
            [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
            1
        );
        let state = manager.snapshot(id).await.expect("snapshot");
        assert_eq!(*state.next_player_id(), PlayerId(2));
    }

    #[tokio::test]
    async fn test_reordered_seats_are_internal_error() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store.clone(), 13);
        let (id, _) = manager.create_game(5, &choices(), &[]).await.expect("created");

        let mut swapped = choices();
        swapped.reverse();
        store.rosters.lock().expect("lock").insert(id, swapped);

        let fresh = GameManager::new(store, 13);
        assert!(matches!(fresh.snapshot(id).await, Err(ServiceError::Internal(_))));
    }

    #[tokio::test]
    async fn test_rejected_move_returns_checked_state() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store, 13);
        let (id, _) = manager.create_game(5, &choices(), &[]).await.expect("created");
        let rolled = manager.record_throw(id, PlayerId(1), four()).await.expect("rolled");

        // Entering onto a cell other than the player's own entry cell.
        let request = enter(chowka::Position::new(2, 0));
        match manager.move_token(id, &request).await.expect("checked") {
            MoveResult::Rejected { reason, state } => {
                assert!(matches!(reason, RuleError::EntryMustTargetEntryPoint(_)));
                assert_eq!(state, rolled);
            }
            MoveResult::Applied(_) => panic!("entry onto another seat's cell was accepted"),
        }
        assert_eq!(manager.snapshot(id).await.expect("snapshot"), rolled);
    }

    #[tokio::test]
    async fn test_applied_move_is_published() {
        let store = Arc::new(MemoryStore::default());
        let manager = GameManager::new(store.clone(), 13);
        let (id, _) = manager.create_game(5, &choices(), &[]).await.expect("created");
        manager.record_throw(id, PlayerId(1), four()).await.expect("rolled");

        let request = enter(chowka::Position::new(0, 2));
        let MoveResult::Applied(outcome) = manager.move_token(id, &request).await.expect("checked")
        else {
            panic!("entry on four was rejected");
        };
        assert_eq!(*outcome.state().remaining_dice_value(), 0);
        assert_eq!(&manager.snapshot(id).await.expect("snapshot"), outcome.state());
        assert_eq!(
            store.games.lock().expect("lock").get(&id),
            Some(outcome.state())
        );
    }
}
