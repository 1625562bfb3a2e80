//! The settled contract of a round and its doubling ladder.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{GameMode, Suit};
use crate::domain::player::Seat;
use crate::errors::domain::DomainError;

/// Doubling escalation: ×2 (Dobl), ×3 (Khamsin), ×4 (Raba'a), then Gahwa,
/// the final cap that decides the whole match for the winner.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoublingLevel {
    Single,
    Double,
    Khamsin,
    Rabaa,
    Gahwa,
}

impl Default for DoublingLevel {
    fn default() -> Self {
        DoublingLevel::Single
    }
}

impl DoublingLevel {
    pub fn multiplier(self) -> u32 {
        match self {
            DoublingLevel::Single => 1,
            DoublingLevel::Double => 2,
            DoublingLevel::Khamsin => 3,
            DoublingLevel::Rabaa => 4,
            // Gahwa is resolved by the scoring pipeline (winner takes the
            // match); the multiplier is only used for non-terminal levels.
            DoublingLevel::Gahwa => 4,
        }
    }

    pub fn next(self) -> Option<DoublingLevel> {
        match self {
            DoublingLevel::Single => Some(DoublingLevel::Double),
            DoublingLevel::Double => Some(DoublingLevel::Khamsin),
            DoublingLevel::Khamsin => Some(DoublingLevel::Rabaa),
            DoublingLevel::Rabaa => Some(DoublingLevel::Gahwa),
            DoublingLevel::Gahwa => None,
        }
    }

    pub fn is_doubled(self) -> bool {
        self != DoublingLevel::Single
    }
}

/// The contract adopted for the round. `mode`/`bidder` are `None` only
/// before the auction settles; during Playing both are guaranteed set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub mode: Option<GameMode>,
    pub trump: Option<Suit>,
    pub bidder: Option<Seat>,
    /// Ashkal: the bidder's partner took the floor card.
    #[serde(default)]
    pub is_ashkal: bool,
    #[serde(default)]
    pub doubling: DoublingLevel,
}

impl Bid {
    pub fn settled(&self) -> bool {
        self.mode.is_some() && self.bidder.is_some()
    }

    /// Escalate the doubling level. The level is monotone within a round;
    /// skipping levels or de-escalating is rejected.
    pub fn escalate_doubling(&mut self) -> Result<DoublingLevel, DomainError> {
        match self.doubling.next() {
            Some(next) => {
                self.doubling = next;
                Ok(next)
            }
            None => Err(DomainError::validation("doubling already at gahwa")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_ladder_is_monotone() {
        let mut bid = Bid::default();
        let mut seen = vec![bid.doubling];
        while let Ok(level) = bid.escalate_doubling() {
            assert!(level > *seen.last().unwrap());
            seen.push(level);
        }
        assert_eq!(
            seen,
            vec![
                DoublingLevel::Single,
                DoublingLevel::Double,
                DoublingLevel::Khamsin,
                DoublingLevel::Rabaa,
                DoublingLevel::Gahwa,
            ]
        );
    }

    #[test]
    fn gahwa_cannot_escalate() {
        let mut bid = Bid {
            doubling: DoublingLevel::Gahwa,
            ..Bid::default()
        };
        assert!(bid.escalate_doubling().is_err());
        assert_eq!(bid.doubling, DoublingLevel::Gahwa);
    }
}
