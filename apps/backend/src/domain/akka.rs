//! Akka: the Hokum-mode claim of holding the highest remaining card of a
//! suit. Verified against the played-card history and the claimer's hand;
//! atomic per round, one claim per seat.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode, Rank, Suit};
use crate::domain::player::Seat;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkkaClaim {
    pub suit: Suit,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AkkaState {
    pub claims: [Option<AkkaClaim>; 4],
}

impl AkkaState {
    pub fn has_claimed(&self, seat: Seat) -> bool {
        self.claims[seat as usize].is_some()
    }

    /// Record a claim for `seat`. The verification itself is pure; the
    /// caller awards or penalizes GP based on the returned validity.
    pub fn claim(
        &mut self,
        seat: Seat,
        suit: Suit,
        hand: &[Card],
        played: &[Card],
        mode: GameMode,
        trump: Option<Suit>,
    ) -> Result<bool, DomainError> {
        if mode != GameMode::Hokum {
            return Err(DomainError::wrong_phase("akka is a hokum claim"));
        }
        if self.has_claimed(seat) {
            return Err(DomainError::illegal_move("akka already claimed this round"));
        }
        let valid = verify_akka(hand, played, suit, mode, trump);
        self.claims[seat as usize] = Some(AkkaClaim { suit, valid });
        Ok(valid)
    }
}

/// True when the claimer's best card of `suit` can no longer be beaten:
/// every stronger card of the suit has already hit the table.
pub fn verify_akka(
    hand: &[Card],
    played: &[Card],
    suit: Suit,
    mode: GameMode,
    trump: Option<Suit>,
) -> bool {
    let Some(best) = hand
        .iter()
        .filter(|c| c.suit == suit)
        .max_by_key(|c| c.order_in(mode, trump))
    else {
        return false;
    };
    Rank::ALL
        .iter()
        .map(|r| Card::new(*r, suit))
        .filter(|c| c.order_in(mode, trump) > best.order_in(mode, trump))
        .all(|c| played.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn ace_high_is_valid_without_history() {
        let hand = vec![c(Rank::Ace, Suit::Hearts)];
        assert!(verify_akka(
            &hand,
            &[],
            Suit::Hearts,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }

    #[test]
    fn king_needs_ace_and_ten_gone() {
        let hand = vec![c(Rank::King, Suit::Hearts)];
        assert!(!verify_akka(
            &hand,
            &[],
            Suit::Hearts,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
        let played = vec![c(Rank::Ace, Suit::Hearts), c(Rank::Ten, Suit::Hearts)];
        assert!(verify_akka(
            &hand,
            &played,
            Suit::Hearts,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }

    #[test]
    fn trump_suit_uses_trump_ordering() {
        // Nine of trumps is beaten only by the jack.
        let hand = vec![c(Rank::Nine, Suit::Spades)];
        assert!(!verify_akka(
            &hand,
            &[],
            Suit::Spades,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
        let played = vec![c(Rank::Jack, Suit::Spades)];
        assert!(verify_akka(
            &hand,
            &played,
            Suit::Spades,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }

    #[test]
    fn claim_is_once_per_seat() {
        let mut state = AkkaState::default();
        let hand = vec![c(Rank::Ace, Suit::Hearts)];
        assert_eq!(
            state
                .claim(0, Suit::Hearts, &hand, &[], GameMode::Hokum, Some(Suit::Spades))
                .unwrap(),
            true
        );
        assert!(state
            .claim(0, Suit::Hearts, &hand, &[], GameMode::Hokum, Some(Suit::Spades))
            .is_err());
    }

    #[test]
    fn claim_rejected_in_sun() {
        let mut state = AkkaState::default();
        let hand = vec![c(Rank::Ace, Suit::Hearts)];
        assert!(state
            .claim(0, Suit::Hearts, &hand, &[], GameMode::Sun, None)
            .is_err());
    }

    #[test]
    fn claim_without_suit_is_invalid() {
        let hand = vec![c(Rank::Ace, Suit::Clubs)];
        assert!(!verify_akka(
            &hand,
            &[],
            Suit::Hearts,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }
}
