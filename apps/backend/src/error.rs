//! Error handling for the Baloot backend.
//!
//! `AppError` is the transport-facing error: every variant carries a stable
//! [`ErrorCode`] plus a human-readable string, and never leaks internal
//! stack traces to clients. Rules violations arrive here via
//! `From<DomainError>`; Redis failures via `From<StoreError>`.

use actix_web::error::ResponseError;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::DomainError;
use crate::errors::ErrorCode;
use crate::services::professor::ProfessorAdvice;
use crate::store::room_manager::StoreError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("room not found: {detail}")]
    RoomNotFound { detail: String },
    #[error("{detail}")]
    Rule { code: ErrorCode, detail: String },
    #[error("invalid payload: {detail}")]
    InvalidPayload { detail: String },
    #[error("rate limited")]
    RateLimited,
    #[error("play withheld by professor")]
    ProfessorIntervention { advice: ProfessorAdvice },
    #[error("backend unavailable: {detail}")]
    BackendUnavailable { detail: String },
    #[error("authentication required")]
    AuthRequired,
    #[error("configuration error: {detail}")]
    Config { detail: String },
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::RoomNotFound { .. } => ErrorCode::RoomNotFound,
            AppError::Rule { code, .. } => *code,
            AppError::InvalidPayload { .. } => ErrorCode::InvalidPayload,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::ProfessorIntervention { .. } => ErrorCode::ProfessorIntervention,
            AppError::BackendUnavailable { .. } => ErrorCode::BackendUnavailable,
            AppError::AuthRequired => ErrorCode::AuthRequired,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Client-safe message. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::RoomNotFound { detail } => detail.clone(),
            AppError::Rule { detail, .. } => detail.clone(),
            AppError::InvalidPayload { detail } => detail.clone(),
            AppError::RateLimited => "Too many actions, slow down".to_string(),
            AppError::ProfessorIntervention { advice } => advice.reasoning.clone(),
            AppError::BackendUnavailable { .. } => "Backend temporarily unavailable".to_string(),
            AppError::AuthRequired => "Authentication required".to_string(),
            AppError::Config { .. } | AppError::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RoomNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Rule { .. } | AppError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProfessorIntervention { .. } => StatusCode::CONFLICT,
            AppError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::Config { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn room_not_found(room_id: &str) -> Self {
        AppError::RoomNotFound {
            detail: format!("Room {room_id} does not exist"),
        }
    }

    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        AppError::InvalidPayload {
            detail: detail.into(),
        }
    }

    pub fn backend_unavailable(detail: impl Into<String>) -> Self {
        AppError::BackendUnavailable {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        AppError::Config {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        AppError::Internal {
            detail: detail.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let (code, detail) = match &err {
            DomainError::Validation(d) => (ErrorCode::InvalidPayload, d.clone()),
            DomainError::InvalidBid(d) => (ErrorCode::InvalidBid, d.clone()),
            DomainError::IllegalMove(d) => (ErrorCode::IllegalMove, d.clone()),
            DomainError::WrongPhase(d) => (ErrorCode::WrongPhase, d.clone()),
            DomainError::NotYourTurn(d) => (ErrorCode::NotYourTurn, d.clone()),
        };
        AppError::Rule { code, detail }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { room_id } => AppError::room_not_found(&room_id),
            StoreError::Decode { detail, .. } => AppError::Internal {
                detail: format!("stored game is corrupt: {detail}"),
            },
            StoreError::Connectivity { detail } => AppError::BackendUnavailable { detail },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let body = ErrorBody {
            code: self.code().as_str().to_string(),
            message: self.public_message(),
        };
        HttpResponse::build(self.status())
            .insert_header((CONTENT_TYPE, "application/json"))
            .json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_stable_codes() {
        let cases = [
            (DomainError::invalid_bid("x"), ErrorCode::InvalidBid),
            (DomainError::illegal_move("x"), ErrorCode::IllegalMove),
            (DomainError::wrong_phase("x"), ErrorCode::WrongPhase),
            (DomainError::not_your_turn("x"), ErrorCode::NotYourTurn),
            (DomainError::validation("x"), ErrorCode::InvalidPayload),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).code(), expected);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = AppError::internal("redis pipeline exploded at byte 42");
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn store_errors_split_into_retry_and_give_up() {
        let not_found = AppError::from(StoreError::NotFound {
            room_id: "r1".into(),
        });
        assert_eq!(not_found.code(), ErrorCode::RoomNotFound);

        let conn = AppError::from(StoreError::Connectivity {
            detail: "refused".into(),
        });
        assert_eq!(conn.code(), ErrorCode::BackendUnavailable);
    }
}
