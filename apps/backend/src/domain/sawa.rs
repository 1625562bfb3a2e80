//! Sawa: the claim that the remaining tricks are mathematically decided.
//!
//! A claim opens a response window; every other seat must accept or
//! reject. Unanimous accept ends the round with the remaining abnat going
//! to the claimer's team. Any reject lets the round continue, and a
//! provably false claim awards the opponents a penalty.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode, Rank, Suit};
use crate::domain::player::Seat;
use crate::errors::domain::DomainError;

/// Response window in seconds. The engine constant is authoritative.
pub const SAWA_RESPONSE_WINDOW_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SawaClaim {
    pub claimer: Seat,
    /// Accept/reject per seat; the claimer's own slot is pre-accepted.
    pub responses: [Option<bool>; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SawaState {
    pub pending: Option<SawaClaim>,
    /// A lapsed or resolved claim cannot be re-raised by the same seat.
    pub spent: [bool; 4],
}

/// Outcome of a response arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SawaOutcome {
    /// Still waiting on other seats.
    Pending,
    /// All seats accepted: end the round now.
    Accepted,
    /// Someone rejected: claim lapses, round continues.
    Rejected,
}

impl SawaState {
    pub fn open(&mut self, claimer: Seat) -> Result<(), DomainError> {
        if self.pending.is_some() {
            return Err(DomainError::illegal_move("a sawa claim is already open"));
        }
        if self.spent[claimer as usize] {
            return Err(DomainError::illegal_move("sawa already claimed this round"));
        }
        let mut responses = [None; 4];
        responses[claimer as usize] = Some(true);
        self.pending = Some(SawaClaim { claimer, responses });
        self.spent[claimer as usize] = true;
        Ok(())
    }

    pub fn respond(&mut self, seat: Seat, accept: bool) -> Result<SawaOutcome, DomainError> {
        let claim = self
            .pending
            .as_mut()
            .ok_or_else(|| DomainError::wrong_phase("no sawa claim is open"))?;
        if seat == claim.claimer {
            return Err(DomainError::illegal_move("claimer cannot respond"));
        }
        if claim.responses[seat as usize].is_some() {
            return Err(DomainError::illegal_move("already responded"));
        }
        claim.responses[seat as usize] = Some(accept);

        if !accept {
            self.pending = None;
            return Ok(SawaOutcome::Rejected);
        }
        if claim.responses.iter().all(|r| *r == Some(true)) {
            self.pending = None;
            return Ok(SawaOutcome::Accepted);
        }
        Ok(SawaOutcome::Pending)
    }

    /// Abort a pending claim without effect (round ended, disconnect,
    /// reset, or the response window expired).
    pub fn abort(&mut self) {
        self.pending = None;
    }
}

/// Conservative soundness check used to grade a rejected claim: the claim
/// is provably false unless the claimer holds the strictly highest
/// remaining card of every suit left in their hand (and, in Hokum, no
/// outstanding trump can cut them).
pub fn claim_is_sound(
    hand: &[Card],
    played: &[Card],
    mode: GameMode,
    trump: Option<Suit>,
) -> bool {
    let outstanding = |card: Card| !played.contains(&card) && !hand.contains(&card);

    for card in hand {
        let stronger_out = Rank::ALL
            .iter()
            .map(|r| Card::new(*r, card.suit))
            .filter(|c| c.order_in(mode, trump) > card.order_in(mode, trump))
            .any(outstanding);
        if stronger_out {
            return false;
        }
    }
    if mode == GameMode::Hokum {
        if let Some(t) = trump {
            if !hand.iter().any(|c| c.suit == t) {
                let trump_out = Rank::ALL.iter().map(|r| Card::new(*r, t)).any(outstanding);
                if trump_out {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanimous_accept_ends_round() {
        let mut state = SawaState::default();
        state.open(1).unwrap();
        assert_eq!(state.respond(0, true).unwrap(), SawaOutcome::Pending);
        assert_eq!(state.respond(2, true).unwrap(), SawaOutcome::Pending);
        assert_eq!(state.respond(3, true).unwrap(), SawaOutcome::Accepted);
        assert!(state.pending.is_none());
    }

    #[test]
    fn single_reject_lapses_claim() {
        let mut state = SawaState::default();
        state.open(1).unwrap();
        assert_eq!(state.respond(0, false).unwrap(), SawaOutcome::Rejected);
        assert!(state.pending.is_none());
        // And the claimer cannot immediately re-raise.
        assert!(state.open(1).is_err());
    }

    #[test]
    fn claimer_cannot_respond_to_own_claim() {
        let mut state = SawaState::default();
        state.open(2).unwrap();
        assert!(state.respond(2, true).is_err());
    }

    #[test]
    fn no_second_claim_while_open() {
        let mut state = SawaState::default();
        state.open(0).unwrap();
        assert!(state.open(1).is_err());
    }

    #[test]
    fn abort_clears_pending_without_effect() {
        let mut state = SawaState::default();
        state.open(0).unwrap();
        state.abort();
        assert!(state.pending.is_none());
    }

    #[test]
    fn sound_claim_requires_masters_only() {
        let hand = vec![Card::new(Rank::Ace, Suit::Hearts)];
        assert!(claim_is_sound(&hand, &[], GameMode::Sun, None));

        let hand = vec![Card::new(Rank::King, Suit::Hearts)];
        assert!(!claim_is_sound(&hand, &[], GameMode::Sun, None));

        // Once ace and ten are gone the king is master.
        let played = vec![
            Card::new(Rank::Ace, Suit::Hearts),
            Card::new(Rank::Ten, Suit::Hearts),
        ];
        assert!(claim_is_sound(&hand, &played, GameMode::Sun, None));
    }

    #[test]
    fn outstanding_trump_breaks_soundness_in_hokum() {
        let hand = vec![Card::new(Rank::Ace, Suit::Hearts)];
        assert!(!claim_is_sound(
            &hand,
            &[],
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }
}
