//! Database repository for users, tokens and games.

use chowka::GameState;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    DbError, GameId, GamePlayer, GameRecord, GameToken, NewGame, NewGamePlayer, NewUser, User,
    schema,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository. Opens one SQLite connection per call.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies any migrations the database has not seen yet.
    ///
    /// Returns how many were applied.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the email is already registered or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_user(&self, email: String) -> Result<User, DbError> {
        let mut conn = self.connection()?;
        let user = diesel::insert_into(schema::users::table)
            .values(&NewUser::new(email))
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), email = %user.email(), "User created");
        Ok(user)
    }

    /// Lists users in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;
        let users = schema::users::table
            .order(schema::users::id.asc())
            .load::<User>(&mut conn)?;

        debug!(count = users.len(), "Users loaded");
        Ok(users)
    }

    /// Lists the token catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_tokens(&self) -> Result<Vec<GameToken>, DbError> {
        let mut conn = self.connection()?;
        let tokens = schema::game_tokens::table
            .order(schema::game_tokens::id.asc())
            .load::<GameToken>(&mut conn)?;

        debug!(count = tokens.len(), "Tokens loaded");
        Ok(tokens)
    }

    /// Stores a new game and one seat row per player, in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the state cannot be encoded or a database error occurs.
    #[instrument(skip(self, state), fields(players = state.seats().len()))]
    pub fn insert_game(&self, state: &GameState) -> Result<GameId, DbError> {
        let board_state = serde_json::to_string(state)?;
        let winner_id = state.winner_id().map(|w| w.0);
        let mut conn = self.connection()?;

        let id = conn.transaction::<_, DbError, _>(|conn| {
            let record = diesel::insert_into(schema::games::table)
                .values(&NewGame::new(board_state, winner_id))
                .returning(GameRecord::as_returning())
                .get_result(conn)?;

            let seats: Vec<NewGamePlayer> = state
                .seats()
                .iter()
                .map(|seat| NewGamePlayer::new(*record.id(), seat.player_id().0, seat.token_id().0))
                .collect();
            diesel::insert_into(schema::games_users::table)
                .values(&seats)
                .execute(conn)?;

            Ok(GameId(*record.id()))
        })?;

        info!(game_id = %id, "Game stored");
        Ok(id)
    }

    /// Overwrites the stored state of a game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the game does not exist or a database error occurs.
    #[instrument(skip(self, state))]
    pub fn save_game(&self, id: GameId, state: &GameState) -> Result<(), DbError> {
        let board_state = serde_json::to_string(state)?;
        let winner_id = state.winner_id().map(|w| w.0);
        let mut conn = self.connection()?;

        let updated = diesel::update(schema::games::table.find(id.0))
            .set((
                schema::games::board_state.eq(board_state),
                schema::games::winner_id.eq(winner_id),
                schema::games::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            warn!(game_id = %id, "Save targeted a missing game");
            return Err(DbError::new(format!("Game {} does not exist", id)));
        }
        debug!(game_id = %id, "Game saved");
        Ok(())
    }

    /// Loads a stored game. Returns `None` if there is no such game.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn find_game(&self, id: GameId) -> Result<Option<GameRecord>, DbError> {
        let mut conn = self.connection()?;
        let record = schema::games::table
            .find(id.0)
            .select(GameRecord::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(game_id = %id, found = record.is_some(), "Game looked up");
        Ok(record)
    }

    /// Loads the seats of a stored game, in seat order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_game_players(&self, id: GameId) -> Result<Vec<GamePlayer>, DbError> {
        let mut conn = self.connection()?;
        let players = schema::games_users::table
            .filter(schema::games_users::game_id.eq(id.0))
            .order(schema::games_users::id.asc())
            .select(GamePlayer::as_select())
            .load(&mut conn)?;

        debug!(game_id = %id, count = players.len(), "Game players loaded");
        Ok(players)
    }
}
