//! Tests for entry, movement, capture, stacking and winning.

use chowka::{
    BoardSize, GameState, MoveRequest, PlayerId, Position, RuleError, Stick, StickThrow, TokenChoice,
    TokenId, TokenRef, TurnPhase, apply_move,
};
use serde_json::json;

use Stick::{Inner as I, Outer as O};

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);
const ALICE_TOKEN: TokenId = TokenId(10);
const BOB_TOKEN: TokenId = TokenId(20);

fn throw(total: u8) -> StickThrow {
    let sticks = match total {
        4 => [I, I, I, I],
        3 => [O, I, I, I],
        2 => [O, O, I, I],
        1 => [O, O, O, I],
        8 => [O, O, O, O],
        other => panic!("no throw scores {other}"),
    };
    StickThrow::from_sticks(sticks)
}

fn new_game(players: &[(PlayerId, TokenId)]) -> GameState {
    let roster: Vec<TokenChoice> = players
        .iter()
        .map(|(player_id, token_id)| TokenChoice {
            player_id: *player_id,
            token_id: *token_id,
        })
        .collect();
    GameState::new(BoardSize::new(5).expect("valid size"), &roster).expect("valid roster")
}

/// Places pieces directly, the way a stored game would be loaded.
fn with_pieces(game: GameState, pieces: &[(Position, PlayerId, TokenId, u8)]) -> GameState {
    let mut value = serde_json::to_value(&game).expect("serialize");
    value["tokenPositions"] = pieces
        .iter()
        .map(|(pos, player, token, count)| {
            json!({
                "pos": pos,
                "tokens": [{ "playerId": player, "tokenId": token, "count": count }],
            })
        })
        .collect();
    serde_json::from_value(value).expect("deserialize")
}

fn request(
    game: &GameState,
    player: PlayerId,
    token: TokenId,
    source: Option<Position>,
    target: Position,
) -> MoveRequest {
    MoveRequest {
        player_id: player,
        total_diced_value: (*game.last_dice_set()).map_or(0, |t| t.total_value()),
        remaining_dice_value: *game.remaining_dice_value(),
        moved_token: TokenRef {
            token_belongs_to: player,
            token_id: token,
            current_pos: source,
        },
        source,
        target,
    }
}

#[test]
fn test_enter_on_four_consumes_whole_throw() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");

    let entry = Position::new(0, 2);
    let outcome = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, entry)).expect("legal entry");

    assert_eq!(outcome.remaining_dice_value(), 0);
    assert_eq!(outcome.moved_token().current_pos, Some(entry));
    assert_eq!(outcome.state().occupancy().count_at(entry, ALICE), 1);
    assert_eq!(outcome.state().off_board_count(ALICE), 3);
    assert!(outcome.removed_tokens().is_empty());
    assert_eq!(*outcome.winner_id(), None);
}

#[test]
fn test_enter_requires_one_or_four() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, Position::new(0, 2)));
    assert_eq!(result.unwrap_err(), RuleError::EntryNeedsOneOrFour(2));
}

#[test]
fn test_enter_must_target_own_entry() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    game.record_roll(ALICE, throw(1)).expect("alice rolls");
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, Position::new(2, 0)));
    assert_eq!(
        result.unwrap_err(),
        RuleError::EntryMustTargetEntryPoint(Position::new(0, 2))
    );
}

#[test]
fn test_capture_on_plain_cell() {
    let game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    let alice_cell = Position::new(4, 1);
    let bob_entry = Position::new(2, 0);
    let mut game = with_pieces(
        game,
        &[(alice_cell, ALICE, ALICE_TOKEN, 1), (bob_entry, BOB, BOB_TOKEN, 1)],
    );
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    game.pass_turn(ALICE).expect("alice passes");
    game.record_roll(BOB, throw(3)).expect("bob rolls");

    let outcome = apply_move(&game, &request(&game, BOB, BOB_TOKEN, Some(bob_entry), alice_cell))
        .expect("legal capture");

    let removed = outcome.removed_tokens();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].token_belongs_to, ALICE);
    assert_eq!(removed[0].old_pos, alice_cell);
    let after = outcome.state();
    assert_eq!(after.occupancy().count_at(alice_cell, BOB), 1);
    assert_eq!(after.occupancy().count_at(alice_cell, ALICE), 0);
    assert_eq!(after.off_board_count(ALICE), 4);
    assert!(after.occupancy().occupants(bob_entry).is_empty());
    assert_eq!(outcome.remaining_dice_value(), 0);
}

#[test]
fn test_fourth_token_home_wins() {
    let game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    let final_cell = Position::new(2, 2);
    let last_step = Position::new(1, 2);
    let mut game = with_pieces(
        game,
        &[(final_cell, ALICE, ALICE_TOKEN, 3), (last_step, ALICE, ALICE_TOKEN, 1)],
    );
    game.record_roll(ALICE, throw(1)).expect("alice rolls");

    let outcome = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(last_step), final_cell))
        .expect("legal move home");

    assert_eq!(*outcome.winner_id(), Some(ALICE));
    let mut finished = outcome.state().clone();
    assert_eq!(finished.phase(), TurnPhase::Finished { winner: ALICE });
    assert_eq!(finished.home_count(ALICE), 4);
    assert_eq!(finished.record_roll(BOB, throw(4)), Err(RuleError::GameOver));
    let again = request(&finished, ALICE, ALICE_TOKEN, None, Position::new(0, 2));
    assert_eq!(apply_move(&finished, &again).unwrap_err(), RuleError::GameOver);
}

#[test]
fn test_three_home_is_not_a_win() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let final_cell = Position::new(2, 2);
    let last_step = Position::new(1, 2);
    let mut game = with_pieces(
        game,
        &[(final_cell, ALICE, ALICE_TOKEN, 2), (last_step, ALICE, ALICE_TOKEN, 1)],
    );
    game.record_roll(ALICE, throw(1)).expect("alice rolls");
    let outcome = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(last_step), final_cell))
        .expect("legal move home");
    assert_eq!(*outcome.winner_id(), None);
    assert_eq!(outcome.state().home_count(ALICE), 3);
}

#[test]
fn test_rejects_target_beyond_dice_value() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(entry, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");

    // (0, 2) -> (0, 1) -> (0, 0) -> (1, 0): three steps on a throw of two.
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(entry), Position::new(1, 0)));
    assert_eq!(
        result.unwrap_err(),
        RuleError::ExceedsDiceValue {
            needed: 3,
            remaining: 2
        }
    );
}

#[test]
fn test_rejects_target_off_the_board() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(entry, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    let before = game.clone();

    let outside = Position::new(5, 5);
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(entry), outside));
    assert_eq!(result.unwrap_err(), RuleError::OutsideBoard(outside));
    assert_eq!(game, before);
}

#[test]
fn test_rejects_backward_move() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let cell = Position::new(1, 0);
    let mut game = with_pieces(game, &[(cell, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(cell), Position::new(0, 0)));
    assert!(matches!(result, Err(RuleError::NotForward { .. })));
}

#[test]
fn test_partial_moves_spend_value_in_steps() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(entry, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(8)).expect("alice rolls");

    // (0, 2) -> (0, 1) -> (0, 0) -> (1, 0) -> (2, 0)
    let first = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(entry), Position::new(2, 0)))
        .expect("four steps");
    assert_eq!(first.remaining_dice_value(), 4);

    let state = first.state().clone();
    let second = apply_move(
        &state,
        &request(&state, ALICE, ALICE_TOKEN, Some(Position::new(2, 0)), Position::new(4, 0)),
    )
    .expect("two more steps");
    assert_eq!(second.remaining_dice_value(), 2);
    assert_eq!(second.state().phase(), TurnPhase::AwaitingMove { player: ALICE, remaining: 2 });
}

#[test]
fn test_same_player_stacks_on_safe_cell() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(entry, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(1)).expect("alice rolls");
    let outcome = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, entry)).expect("second entry");
    let stacks = outcome.state().occupancy().occupants(entry);
    assert_eq!(stacks.len(), 1);
    assert_eq!(stacks[0].count, 2);
}

#[test]
fn test_safe_cell_held_by_opponent_blocks() {
    let game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    let alice_entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(alice_entry, BOB, BOB_TOKEN, 1)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, alice_entry));
    assert_eq!(result.unwrap_err(), RuleError::CellBlocked(alice_entry));
}

#[test]
fn test_only_the_roller_moves() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");
    let result = apply_move(&game, &request(&game, BOB, BOB_TOKEN, None, Position::new(2, 0)));
    assert_eq!(
        result.unwrap_err(),
        RuleError::WrongPlayer {
            expected: ALICE,
            actual: BOB
        }
    );
}

#[test]
fn test_rejects_foreign_token() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");
    let mut req = request(&game, ALICE, ALICE_TOKEN, None, Position::new(0, 2));
    req.moved_token.token_belongs_to = BOB;
    assert!(matches!(apply_move(&game, &req), Err(RuleError::NotTokenOwner { .. })));

    let req = request(&game, ALICE, BOB_TOKEN, None, Position::new(0, 2));
    assert!(matches!(apply_move(&game, &req), Err(RuleError::UnknownToken { .. })));
}

#[test]
fn test_rejects_stale_dice_values() {
    let mut game = new_game(&[(ALICE, ALICE_TOKEN)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");
    let mut req = request(&game, ALICE, ALICE_TOKEN, None, Position::new(0, 2));
    req.remaining_dice_value = 8;
    assert!(matches!(apply_move(&game, &req), Err(RuleError::StaleDiceValue { .. })));
}

#[test]
fn test_no_move_before_rolling() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, Position::new(0, 2)));
    assert_eq!(result.unwrap_err(), RuleError::NoDiceValue);
}

#[test]
fn test_final_cell_is_shared_home() {
    let game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    let final_cell = Position::new(2, 2);
    let last_step = Position::new(1, 2);
    let mut game = with_pieces(
        game,
        &[(final_cell, BOB, BOB_TOKEN, 1), (last_step, ALICE, ALICE_TOKEN, 1)],
    );
    game.record_roll(ALICE, throw(1)).expect("alice rolls");

    let outcome = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(last_step), final_cell))
        .expect("home is never blocked");

    assert!(outcome.removed_tokens().is_empty());
    let after = outcome.state();
    assert_eq!(after.occupancy().count_at(final_cell, BOB), 1);
    assert_eq!(after.occupancy().count_at(final_cell, ALICE), 1);
    assert_eq!(after.home_count(BOB), 1);
    assert_eq!(after.off_board_count(BOB), 3);
}

#[test]
fn test_captures_whole_stack() {
    let game = new_game(&[(ALICE, ALICE_TOKEN), (BOB, BOB_TOKEN)]);
    let alice_cell = Position::new(4, 1);
    let bob_entry = Position::new(2, 0);
    let mut game = with_pieces(
        game,
        &[(alice_cell, ALICE, ALICE_TOKEN, 2), (bob_entry, BOB, BOB_TOKEN, 1)],
    );
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    game.pass_turn(ALICE).expect("alice passes");
    game.record_roll(BOB, throw(3)).expect("bob rolls");
    assert_eq!(game.off_board_count(ALICE), 2);

    let outcome = apply_move(&game, &request(&game, BOB, BOB_TOKEN, Some(bob_entry), alice_cell))
        .expect("legal capture");

    let removed = outcome.removed_tokens();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].token_belongs_to, ALICE);
    assert_eq!(removed[0].count, 2);
    assert_eq!(outcome.state().off_board_count(ALICE), 4);
    assert_eq!(outcome.state().occupancy().count_at(alice_cell, ALICE), 0);
}

#[test]
fn test_rejects_entry_with_all_pieces_out() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let mut game = with_pieces(game, &[(Position::new(1, 0), ALICE, ALICE_TOKEN, 4)]);
    game.record_roll(ALICE, throw(4)).expect("alice rolls");
    let before = game.clone();

    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, None, Position::new(0, 2)));
    assert_eq!(result.unwrap_err(), RuleError::NoTokenOffBoard(ALICE));
    assert_eq!(game, before);
}

#[test]
fn test_rejects_position_disagreeing_with_source() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let entry = Position::new(0, 2);
    let mut game = with_pieces(game, &[(entry, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    let before = game.clone();

    let mut req = request(&game, ALICE, ALICE_TOKEN, Some(entry), Position::new(0, 0));
    req.moved_token.current_pos = Some(Position::new(0, 1));
    assert_eq!(apply_move(&game, &req).unwrap_err(), RuleError::SourceMismatch);
    assert_eq!(game, before);
}

#[test]
fn test_rejects_empty_source_cell() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let mut game = with_pieces(game, &[(Position::new(0, 2), ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(2)).expect("alice rolls");
    let before = game.clone();

    let empty = Position::new(1, 0);
    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(empty), Position::new(3, 0)));
    assert_eq!(
        result.unwrap_err(),
        RuleError::NoTokenAtSource {
            player: ALICE,
            source_cell: empty
        }
    );
    assert_eq!(game, before);
}

#[test]
fn test_home_pieces_stay_home() {
    let game = new_game(&[(ALICE, ALICE_TOKEN)]);
    let final_cell = Position::new(2, 2);
    let mut game = with_pieces(game, &[(final_cell, ALICE, ALICE_TOKEN, 1)]);
    game.record_roll(ALICE, throw(1)).expect("alice rolls");
    let before = game.clone();

    let result = apply_move(&game, &request(&game, ALICE, ALICE_TOKEN, Some(final_cell), final_cell));
    assert_eq!(result.unwrap_err(), RuleError::AlreadyHome(final_cell));
    assert_eq!(game, before);
}
