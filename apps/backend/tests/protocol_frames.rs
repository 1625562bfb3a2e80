//! Wire-shape tests: frames must keep their exact JSON layout, since the
//! client is built against these field names.

mod common;

use baloot_backend::domain::game::Game;
use baloot_backend::domain::view::client_state;
use baloot_backend::errors::ErrorCode;
use baloot_backend::ws::protocol::{ClientMsg, ServerMsg, WireError};
use serde_json::json;

#[test]
fn create_room_result_shape() {
    let msg = ServerMsg::CreateRoomResult {
        success: true,
        room_id: Some("r-1".to_string()),
        error: None,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "create_room_result");
    assert_eq!(value["success"], true);
    assert_eq!(value["roomId"], "r-1");
    assert!(value.get("error").is_none());
}

#[test]
fn action_result_carries_stable_error_codes() {
    let msg = ServerMsg::ActionResult {
        success: false,
        error: Some(WireError {
            code: ErrorCode::NotYourTurn,
            message: "another seat holds the turn".to_string(),
        }),
        intervention: None,
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["error"]["code"], "NOT_YOUR_TURN");
}

#[test]
fn game_update_wraps_rotated_state() {
    let game = Game::new("room-9");
    let msg = ServerMsg::GameUpdate {
        game_state: client_state(&game, 0),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "game_update");
    assert_eq!(value["gameState"]["roomId"], "room-9");
    assert_eq!(value["gameState"]["phase"], "waiting");
}

#[test]
fn bot_speak_shape() {
    let msg = ServerMsg::BotSpeak {
        player_index: 2,
        text: "حكم!".to_string(),
        emotion: "confident".to_string(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "bot_speak");
    assert_eq!(value["playerIndex"], 2);
    assert_eq!(value["emotion"], "confident");
}

#[test]
fn client_frames_accept_documented_payloads() {
    let frames = [
        json!({"type": "create_room"}),
        json!({"type": "join_room", "roomId": "r", "playerName": "aziz"}),
        json!({"type": "join_room", "roomId": "r", "playerName": "b", "botDifficulty": "khalid"}),
        json!({"type": "add_bot", "roomId": "r"}),
        json!({"type": "game_action", "roomId": "r", "action": "PLAY", "payload": {"cardIndex": 1}}),
        json!({"type": "game_action", "roomId": "r", "action": "BID", "payload": {"action": "ASHKAL"}}),
        json!({"type": "debug_action", "roomId": "r", "action": "clear_trick"}),
    ];
    for frame in frames {
        let parsed: Result<ClientMsg, _> = serde_json::from_value(frame.clone());
        assert!(parsed.is_ok(), "frame must parse: {frame}");
    }
}

#[test]
fn unknown_frame_type_is_rejected() {
    let parsed: Result<ClientMsg, _> =
        serde_json::from_value(json!({"type": "teleport", "roomId": "r"}));
    assert!(parsed.is_err());
}
