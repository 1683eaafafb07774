//! JSON request and response bodies of the REST API.

use chowka::{GameState, MoveOutcome, MoveRequest, PlayerId, Position, RemovedToken, TokenChoice, TokenRef};
use serde::{Deserialize, Serialize};

use crate::db::{GameId, GameToken, User};

/// A registered player as listed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// User id.
    pub id: PlayerId,
    /// User email.
    #[serde(default)]
    pub email: String,
}

/// `POST /createGame`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Side length of the board.
    pub board_size: usize,
    /// Token picked by each active player.
    pub player_token_array: Vec<TokenChoice>,
    /// Registered players, in registration order.
    #[serde(default)]
    pub players_list: Vec<PlayerSummary>,
}

/// A game and its full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    /// Game id.
    pub game_id: GameId,
    /// Full state of the game.
    pub current_board_state: GameState,
}

/// `POST /rollDice` and `POST /passTurn`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Game id.
    pub game_id: GameId,
    /// Player acting.
    pub current_player_id: PlayerId,
}

/// Reply to `POST /rollDice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollDiceResponse {
    /// State after the roll.
    pub current_board_state: GameState,
    /// Score of the throw.
    pub total_diced_value: u8,
}

/// Reply to `POST /passTurn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStateResponse {
    /// State after the action.
    pub current_board_state: GameState,
}

/// `POST /validateMove`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMoveRequest {
    /// Game id.
    pub game_id: GameId,
    /// Player moving.
    pub current_player_id: PlayerId,
    /// Throw total the client holds.
    pub total_diced_value: u8,
    /// Remaining value the client holds.
    pub remaining_dice_value: u8,
    /// Piece being moved.
    pub moved_token_data: TokenRef,
    /// Cell the piece leaves, `null` when entering.
    #[serde(default)]
    pub source_cell_pos: Option<Position>,
    /// Cell the piece should land on.
    pub target_cell_pos: Position,
}

impl From<ValidateMoveRequest> for MoveRequest {
    fn from(req: ValidateMoveRequest) -> Self {
        MoveRequest {
            player_id: req.current_player_id,
            total_diced_value: req.total_diced_value,
            remaining_dice_value: req.remaining_dice_value,
            moved_token: req.moved_token_data,
            source: req.source_cell_pos,
            target: req.target_cell_pos,
        }
    }
}

/// Reply to `POST /validateMove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMoveResponse {
    /// Whether the move was applied.
    pub is_valid: bool,
    /// State after the move, or the unchanged state if rejected.
    pub current_board_state: GameState,
    /// Dice value left.
    pub remaining_dice_value: u8,
    /// The piece at its new cell, or as sent if rejected.
    pub moved_token_data: TokenRef,
    /// Pieces captured by the move.
    pub removed_tokens: Vec<RemovedToken>,
    /// Winner, if any.
    pub winner_id: Option<PlayerId>,
    /// Why the move was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidateMoveResponse {
    /// Reply for an applied move.
    pub fn accepted(outcome: MoveOutcome) -> Self {
        let remaining_dice_value = outcome.remaining_dice_value();
        let (state, moved_token, removed_tokens, winner_id) = outcome.dissolve();
        Self {
            is_valid: true,
            current_board_state: state,
            remaining_dice_value,
            moved_token_data: moved_token,
            removed_tokens,
            winner_id,
            reason: None,
        }
    }

    /// Reply for a rejected move.
    pub fn rejected(state: GameState, moved_token: TokenRef, reason: String) -> Self {
        Self {
            is_valid: false,
            remaining_dice_value: *state.remaining_dice_value(),
            winner_id: *state.winner_id(),
            current_board_state: state,
            moved_token_data: moved_token,
            removed_tokens: Vec::new(),
            reason: Some(reason),
        }
    }
}

/// Entry of `GET /tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    /// Token id.
    pub id: i32,
    /// Image shown for the token.
    pub image_file_path: String,
}

impl From<GameToken> for TokenView {
    fn from(token: GameToken) -> Self {
        let (id, image_file_path) = (*token.id(), token.image_file_path().clone());
        Self { id, image_file_path }
    }
}

/// Entry of `GET /all-users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    /// User id.
    pub id: i32,
    /// User email.
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: *user.id(),
            email: user.email().clone(),
        }
    }
}

/// `POST /users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Email to register.
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_move_request_accepts_null_source() {
        let body = json!({
            "gameId": 3,
            "currentPlayerId": 1,
            "totalDicedValue": 4,
            "remainingDiceValue": 4,
            "movedTokenData": { "tokenBelongsTo": 1, "tokenId": 2, "currentPos": null },
            "sourceCellPos": null,
            "targetCellPos": { "row": 0, "col": 2 },
        });
        let req: ValidateMoveRequest = serde_json::from_value(body).expect("valid body");
        let req = MoveRequest::from(req);
        assert_eq!(req.source, None);
        assert_eq!(req.target, Position::new(0, 2));
        assert_eq!(req.moved_token.token_belongs_to, PlayerId(1));
    }

    #[test]
    fn test_create_game_players_list_optional() {
        let body = json!({
            "boardSize": 5,
            "playerTokenArray": [{ "playerId": 1, "tokenId": 1 }],
        });
        let req: CreateGameRequest = serde_json::from_value(body).expect("valid body");
        assert!(req.players_list.is_empty());
        assert_eq!(req.player_token_array.len(), 1);
    }
}
