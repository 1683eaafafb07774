//! HTTP service and persistence for chowka games.
//!
//! # Architecture
//!
//! - **Database**: users, the token catalogue and one JSON document per game
//! - **Manager**: live games, one writer at a time per game
//! - **Server**: axum routes speaking the camelCase JSON contracts in [`api`]

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
mod config;
mod db;
mod error;
mod manager;
mod server;

pub use config::{ConfigError, DEFAULT_CONFIG_FILE, ServerConfig};
pub use db::{
    DbError, GameId, GamePlayer, GameRecord, GameRepository, GameStore, GameToken, MIGRATIONS, NewGame,
    NewGamePlayer, NewUser, User,
};
pub use error::{ErrorBody, ServiceError};
pub use manager::{GameManager, MoveResult};
pub use server::{AppState, router};
