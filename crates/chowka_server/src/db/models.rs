//! Database models.

use chowka::{GameState, PlayerId, TokenId};
use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{DbError, schema};

/// Primary key of a stored game.
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
pub struct GameId(pub i32);

/// Registered user.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    email: String,
    created_at: NaiveDateTime,
}

/// Insertable user.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    email: String,
}

/// Entry in the token catalogue.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_tokens)]
pub struct GameToken {
    id: i32,
    image_file_path: String,
}

/// A stored game: the full board state as one JSON document.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRecord {
    id: i32,
    board_state: String,
    winner_id: Option<i32>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GameRecord {
    /// Decodes the stored board state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the document is not a valid game state.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn parse_state(&self) -> Result<GameState, DbError> {
        Ok(serde_json::from_str(&self.board_state)?)
    }
}

/// Insertable game.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    board_state: String,
    winner_id: Option<i32>,
}

/// A player's seat in a stored game.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::games_users)]
#[diesel(belongs_to(GameRecord, foreign_key = game_id))]
pub struct GamePlayer {
    id: i32,
    game_id: i32,
    user_id: i32,
    game_token_id: i32,
}

impl GamePlayer {
    /// The seated player.
    pub fn player(&self) -> PlayerId {
        PlayerId(self.user_id)
    }

    /// The token the player chose.
    pub fn token(&self) -> TokenId {
        TokenId(self.game_token_id)
    }
}

/// Insertable seat.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games_users)]
pub struct NewGamePlayer {
    game_id: i32,
    user_id: i32,
    game_token_id: i32,
}
