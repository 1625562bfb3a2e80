//! Error codes surfaced in socket responses.
//!
//! Add new codes here; never pass ad-hoc strings as error codes. Each
//! variant maps 1:1 to the stable SCREAMING_SNAKE_CASE string that appears
//! on the wire.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Session & rooms
    RoomNotFound,

    // Gameplay rejections
    InvalidBid,
    IllegalMove,
    WrongPhase,
    NotYourTurn,

    // Ingress validation
    InvalidPayload,
    RateLimited,

    // Professor intercept (not an error in the usual sense: the action was
    // withheld, and the client may retry with skip_professor)
    ProfessorIntervention,

    // Infrastructure
    BackendUnavailable,
    AuthRequired,
    Internal,
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::InvalidBid => "INVALID_BID",
            ErrorCode::IllegalMove => "ILLEGAL_MOVE",
            ErrorCode::WrongPhase => "WRONG_PHASE",
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::InvalidPayload => "INVALID_PAYLOAD",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ProfessorIntervention => "PROFESSOR_INTERVENTION",
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_to_wire_strings() {
        let json = serde_json::to_string(&ErrorCode::ProfessorIntervention).unwrap();
        assert_eq!(json, "\"PROFESSOR_INTERVENTION\"");
        let back: ErrorCode = serde_json::from_str("\"RATE_LIMITED\"").unwrap();
        assert_eq!(back, ErrorCode::RateLimited);
    }

    #[test]
    fn as_str_matches_serde() {
        for code in [
            ErrorCode::RoomNotFound,
            ErrorCode::InvalidBid,
            ErrorCode::IllegalMove,
            ErrorCode::WrongPhase,
            ErrorCode::NotYourTurn,
            ErrorCode::InvalidPayload,
            ErrorCode::RateLimited,
            ErrorCode::ProfessorIntervention,
            ErrorCode::BackendUnavailable,
            ErrorCode::AuthRequired,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
