//! Wire protocol: message-framed JSON over the socket.
//!
//! Client frames are internally tagged by `type`; responses carry
//! `success` plus a stable error code on failure. Game actions arrive as
//! an action name plus a loose payload object that is schema-validated
//! here before anything touches the domain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::bidding::BidAction;
use crate::domain::cards::Suit;
use crate::domain::game::GameAction;
use crate::domain::player::{BotDifficulty, GameSettings, Seat};
use crate::domain::qayd::{QaydCardRef, QaydRole, ViolationKind};
use crate::domain::view::ClientGameState;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::services::professor::ProfessorAdvice;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    CreateRoom {},
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "botDifficulty")]
        #[serde(default)]
        bot_difficulty: Option<BotDifficulty>,
        #[serde(default)]
        token: Option<String>,
    },
    AddBot {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    GameAction {
        #[serde(rename = "roomId")]
        room_id: String,
        action: String,
        #[serde(default)]
        payload: Value,
    },
    DebugAction {
        #[serde(rename = "roomId")]
        room_id: String,
        action: String,
        #[serde(default)]
        payload: Value,
    },
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    CreateRoomResult {
        success: bool,
        #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<WireError>,
    },
    JoinRoomResult {
        success: bool,
        #[serde(rename = "playerIndex", skip_serializing_if = "Option::is_none")]
        player_index: Option<u8>,
        #[serde(rename = "gameState", skip_serializing_if = "Option::is_none")]
        game_state: Option<ClientGameState>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<WireError>,
    },
    ActionResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<WireError>,
        #[serde(skip_serializing_if = "Option::is_none")]
        intervention: Option<ProfessorAdvice>,
    },
    GameUpdate {
        #[serde(rename = "gameState")]
        game_state: ClientGameState,
    },
    GameStart {
        #[serde(rename = "gameState")]
        game_state: ClientGameState,
    },
    BotSpeak {
        #[serde(rename = "playerIndex")]
        player_index: u8,
        text: String,
        emotion: String,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&AppError> for WireError {
    fn from(err: &AppError) -> Self {
        WireError {
            code: err.code(),
            message: err.public_message(),
        }
    }
}

fn suit_field(payload: &Value, key: &str) -> Result<Option<Suit>, AppError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Suit::from_symbol(s)
            .map(Some)
            .ok_or_else(|| AppError::invalid_payload(format!("{key} must be one of ♠♥♦♣"))),
        Some(_) => Err(AppError::invalid_payload(format!("{key} must be a string"))),
    }
}

fn usize_field(payload: &Value, key: &str) -> Result<usize, AppError> {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| AppError::invalid_payload(format!("{key} must be a non-negative integer")))
}

/// Validate a `game_action` frame into a typed action. Returns the action
/// plus the `skip_professor` escape hatch for PLAY.
pub fn parse_game_action(action: &str, payload: &Value) -> Result<(GameAction, bool), AppError> {
    let action = match action {
        "PLAY" => {
            let card_index = usize_field(payload, "cardIndex")?;
            let skip = payload
                .get("skip_professor")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            return Ok((GameAction::Play { card_index }, skip));
        }
        "BID" => {
            let bid_action = match payload.get("action").and_then(Value::as_str) {
                Some("PASS") => BidAction::Pass,
                Some("SUN") => BidAction::Sun,
                Some("HOKUM") => BidAction::Hokum,
                Some("ASHKAL") => BidAction::Ashkal,
                Some("KAWESH") => BidAction::Kawesh,
                Some(other) => {
                    return Err(AppError::invalid_payload(format!(
                        "unknown bid action {other}"
                    )))
                }
                None => return Err(AppError::invalid_payload("bid action missing")),
            };
            GameAction::Bid {
                action: bid_action,
                suit: suit_field(payload, "suit")?,
            }
        }
        "DOUBLE" => GameAction::Double,
        "AKKA" => {
            let suit = suit_field(payload, "suit")?
                .ok_or_else(|| AppError::invalid_payload("akka requires a suit"))?;
            GameAction::Akka { suit }
        }
        "SAWA_CLAIM" => GameAction::SawaClaim,
        "SAWA_RESPONSE" => {
            let accept = payload
                .get("accept")
                .and_then(Value::as_bool)
                .ok_or_else(|| AppError::invalid_payload("accept must be a boolean"))?;
            GameAction::SawaResponse { accept }
        }
        "DECLARE_PROJECT" => GameAction::DeclareProject {
            project_ref: usize_field(payload, "projectRef")?,
        },
        "NEXT_ROUND" => GameAction::NextRound,
        "QAYD_START" => GameAction::QaydStart,
        "QAYD_SELECT_VIOLATION" => {
            let kind: ViolationKind = payload
                .get("type")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| AppError::invalid_payload("unknown violation type"))?
                .ok_or_else(|| AppError::invalid_payload("violation type missing"))?;
            GameAction::QaydSelectViolation { kind }
        }
        "QAYD_SELECT_CARD" => {
            let role: QaydRole = payload
                .get("role")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| AppError::invalid_payload("role must be crime or proof"))?
                .ok_or_else(|| AppError::invalid_payload("role missing"))?;
            let trick_index = usize_field(payload, "trickIndex")?;
            let card = payload
                .get("cardRef")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| AppError::invalid_payload("cardRef must be a card"))?
                .ok_or_else(|| AppError::invalid_payload("cardRef missing"))?;
            let played_by = payload
                .get("playedBy")
                .and_then(Value::as_u64)
                .filter(|v| *v < 4)
                .ok_or_else(|| AppError::invalid_payload("playedBy must be a seat 0..3"))?
                as Seat;
            GameAction::QaydSelectCard {
                role,
                card_ref: QaydCardRef {
                    trick_index,
                    card,
                    played_by,
                },
            }
        }
        "QAYD_CONFIRM" => GameAction::QaydConfirm,
        "QAYD_CANCEL" => GameAction::QaydCancel,
        "UPDATE_SETTINGS" => {
            let settings: GameSettings = serde_json::from_value(payload.clone())
                .map_err(|err| AppError::invalid_payload(format!("bad settings: {err}")))?;
            if !GameSettings::turn_duration_valid(settings.turn_duration) {
                return Err(AppError::invalid_payload(
                    "turnDuration must be within 1..=120",
                ));
            }
            GameAction::UpdateSettings { settings }
        }
        other => {
            return Err(AppError::invalid_payload(format!(
                "unknown action {other}"
            )))
        }
    };
    Ok((action, false))
}
