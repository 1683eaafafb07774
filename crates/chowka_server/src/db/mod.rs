//! SQLite persistence for users, the token catalogue and games.

mod error;
mod models;
mod repository;
mod schema;
mod store;

pub use error::DbError;
pub use models::{GameId, GamePlayer, GameRecord, GameToken, NewGame, NewGamePlayer, NewUser, User};
pub use repository::{GameRepository, MIGRATIONS};
pub use store::GameStore;
