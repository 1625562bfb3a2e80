//! Domain-level error type used across the rules engines.
//!
//! This error type is transport- and Redis-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Central domain error type. Rules violations are error values, never
/// panics; each variant maps to one stable wire code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input (bad suit string, bad card index).
    Validation(String),
    /// Bid rejected by the auction state machine.
    InvalidBid(String),
    /// Card play or claim rejected by the rules.
    IllegalMove(String),
    /// Action does not belong to the current phase.
    WrongPhase(String),
    /// Acting seat does not hold the turn and the action is not an
    /// allowed off-turn action.
    NotYourTurn(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(d) => write!(f, "validation error: {d}"),
            DomainError::InvalidBid(d) => write!(f, "invalid bid: {d}"),
            DomainError::IllegalMove(d) => write!(f, "illegal move: {d}"),
            DomainError::WrongPhase(d) => write!(f, "wrong phase: {d}"),
            DomainError::NotYourTurn(d) => write!(f, "not your turn: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
    pub fn invalid_bid(detail: impl Into<String>) -> Self {
        Self::InvalidBid(detail.into())
    }
    pub fn illegal_move(detail: impl Into<String>) -> Self {
        Self::IllegalMove(detail.into())
    }
    pub fn wrong_phase(detail: impl Into<String>) -> Self {
        Self::WrongPhase(detail.into())
    }
    pub fn not_your_turn(detail: impl Into<String>) -> Self {
        Self::NotYourTurn(detail.into())
    }
}
