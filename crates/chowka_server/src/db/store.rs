//! Async storage seam used by the game manager.

use chowka::{GameState, TokenChoice};
use tracing::instrument;

use crate::db::{DbError, GameId, GameRepository};

/// Where game states live between requests.
#[async_trait::async_trait]
pub trait GameStore: Send + Sync + std::fmt::Debug {
    /// Stores a new game and returns its id.
    async fn insert_game(&self, state: &GameState) -> Result<GameId, DbError>;

    /// Overwrites the state of an existing game.
    async fn save_game(&self, id: GameId, state: &GameState) -> Result<(), DbError>;

    /// Loads a game, or `None` if the id is unknown.
    async fn load_game(&self, id: GameId) -> Result<Option<GameState>, DbError>;

    /// Seats recorded when the game was created, in turn order.
    async fn load_roster(&self, id: GameId) -> Result<Vec<TokenChoice>, DbError>;
}

#[async_trait::async_trait]
impl GameStore for GameRepository {
    #[instrument(skip(self, state))]
    async fn insert_game(&self, state: &GameState) -> Result<GameId, DbError> {
        let repo = self.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || repo.insert_game(&state)).await?
    }

    #[instrument(skip(self, state))]
    async fn save_game(&self, id: GameId, state: &GameState) -> Result<(), DbError> {
        let repo = self.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || repo.save_game(id, &state)).await?
    }

    #[instrument(skip(self))]
    async fn load_game(&self, id: GameId) -> Result<Option<GameState>, DbError> {
        let repo = self.clone();
        let record = tokio::task::spawn_blocking(move || repo.find_game(id)).await??;
        record.map(|r| r.parse_state()).transpose()
    }

    #[instrument(skip(self))]
    async fn load_roster(&self, id: GameId) -> Result<Vec<TokenChoice>, DbError> {
        let repo = self.clone();
        let players = tokio::task::spawn_blocking(move || repo.list_game_players(id)).await??;
        Ok(players
            .iter()
            .map(|p| TokenChoice {
                player_id: p.player(),
                token_id: p.token(),
            })
            .collect())
    }
}
