//! HTTP routes.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Path, Request, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use chowka::{MoveRequest, PlayerId};
use tracing::{info, instrument};

use crate::api::{
    BoardStateResponse, CreateGameRequest, CreateUserRequest, GameResponse, RollDiceResponse,
    TokenView, TurnRequest, UserView, ValidateMoveRequest, ValidateMoveResponse,
};
use crate::db::{DbError, GameId, GameRepository};
use crate::error::ServiceError;
use crate::manager::{GameManager, MoveResult};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live games.
    pub manager: GameManager,
    /// Users and token catalogue.
    pub repository: GameRepository,
}

/// JSON body extractor whose rejections use the service's error body.
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/createGame", post(create_game))
        .route("/rollDice", post(roll_dice))
        .route("/validateMove", post(validate_move))
        .route("/passTurn", post(pass_turn))
        .route("/games/{id}", get(get_game))
        .route("/tokens", get(list_tokens))
        .route("/all-users", get(list_users))
        .route("/users", post(create_user))
        .with_state(state)
}

#[instrument(skip(state, req), fields(size = req.board_size, players = req.player_token_array.len()))]
async fn create_game(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGameRequest>,
) -> Result<Json<GameResponse>, ServiceError> {
    let registered: Vec<PlayerId> = req.players_list.iter().map(|p| p.id).collect();
    let (game_id, current_board_state) = state
        .manager
        .create_game(req.board_size, &req.player_token_array, &registered)
        .await?;
    Ok(Json(GameResponse {
        game_id,
        current_board_state,
    }))
}

#[instrument(skip(state), fields(game_id = %req.game_id, player = %req.current_player_id))]
async fn roll_dice(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TurnRequest>,
) -> Result<Json<RollDiceResponse>, ServiceError> {
    let current_board_state = state
        .manager
        .roll_dice(req.game_id, req.current_player_id)
        .await?;
    let total_diced_value = (*current_board_state.last_dice_set()).map_or(0, |t| t.total_value());
    info!(total = total_diced_value, "Dice rolled");
    Ok(Json(RollDiceResponse {
        current_board_state,
        total_diced_value,
    }))
}

#[instrument(skip(state), fields(game_id = %req.game_id, player = %req.current_player_id))]
async fn validate_move(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ValidateMoveRequest>,
) -> Result<Json<ValidateMoveResponse>, ServiceError> {
    let request = MoveRequest::from(req);
    let response = match state.manager.move_token(req.game_id, &request).await? {
        MoveResult::Applied(outcome) => ValidateMoveResponse::accepted(outcome),
        MoveResult::Rejected { reason, state: current } => {
            ValidateMoveResponse::rejected(current, req.moved_token_data, reason.to_string())
        }
    };
    Ok(Json(response))
}

#[instrument(skip(state), fields(game_id = %req.game_id, player = %req.current_player_id))]
async fn pass_turn(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TurnRequest>,
) -> Result<Json<BoardStateResponse>, ServiceError> {
    let current_board_state = state
        .manager
        .pass_turn(req.game_id, req.current_player_id)
        .await?;
    Ok(Json(BoardStateResponse {
        current_board_state,
    }))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<GameResponse>, ServiceError> {
    let Path(id) = id?;
    let game_id = GameId(id);
    let current_board_state = state.manager.snapshot(game_id).await?;
    Ok(Json(GameResponse {
        game_id,
        current_board_state,
    }))
}

#[instrument(skip(state))]
async fn list_tokens(State(state): State<AppState>) -> Result<Json<Vec<TokenView>>, ServiceError> {
    let repo = state.repository.clone();
    let tokens = blocking(move || repo.list_tokens()).await?;
    Ok(Json(tokens.into_iter().map(TokenView::from).collect()))
}

#[instrument(skip(state))]
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, ServiceError> {
    let repo = state.repository.clone();
    let users = blocking(move || repo.list_users()).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

#[instrument(skip(state, req))]
async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<Json<UserView>, ServiceError> {
    let email = req.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::InvalidRequest(format!("'{}' is not an email address", email)));
    }
    let repo = state.repository.clone();
    let user = blocking(move || repo.create_user(email)).await?;
    Ok(Json(UserView::from(user)))
}

/// Runs a synchronous repository call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.map_err(DbError::from)?;
    Ok(result?)
}
