//! The two-round auction: Pass / Sun / Hokum / Ashkal / Kawesh.
//!
//! Round 1 offers Hokum only at the floor-card suit; round 2 opens the
//! other suits. Four passes in round 1 advance to round 2; four passes in
//! round 2 are a Gash redeal with the dealer rotated (unless strict mode
//! forces the dealer, as last speaker, to bid).

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode, Rank, Suit};
use crate::domain::player::{next_seat, Seat, SEATS};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidAction {
    Pass,
    Sun,
    Hokum,
    Ashkal,
    Kawesh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiddingState {
    /// Auction round, 1 or 2.
    pub round: u8,
    pub speaker: Seat,
    pub passes: u8,
    pub settled: bool,
    #[serde(default)]
    pub last_action: Option<(Seat, BidAction)>,
}

impl BiddingState {
    pub fn new(dealer: Seat) -> Self {
        BiddingState {
            round: 1,
            speaker: next_seat(dealer),
            passes: 0,
            settled: false,
            last_action: None,
        }
    }
}

/// What the coordinator must do after a bid is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidOutcome {
    /// Auction continues with the next speaker.
    Continue { next_speaker: Seat },
    /// Someone bought: distribute the rest of the deck and start play.
    Settled {
        bidder: Seat,
        mode: GameMode,
        trump: Option<Suit>,
        is_ashkal: bool,
    },
    /// Four passes in round 2: redeal, dealer rotated.
    Gash,
    /// Worthless-hand redeal, same dealer.
    Kawesh,
}

/// A hand with no ace, no ten and no king qualifies for Kawesh.
pub fn hand_is_worthless(hand: &[Card]) -> bool {
    !hand
        .iter()
        .any(|c| matches!(c.rank, Rank::Ace | Rank::Ten | Rank::King))
}

/// Apply one utterance of the auction.
///
/// `floor_suit` fixes the round-1 Hokum trump; in round 2 any other suit
/// may be named. The dealer speaks last; with `strict_mode` a fourth pass
/// in round 2 is rejected instead of producing a Gash.
pub fn apply_bid(
    state: &mut BiddingState,
    seat: Seat,
    action: BidAction,
    chosen_suit: Option<Suit>,
    floor_suit: Suit,
    dealer: Seat,
    hand: &[Card],
    strict_mode: bool,
) -> Result<BidOutcome, DomainError> {
    if state.settled {
        return Err(DomainError::wrong_phase("auction already settled"));
    }
    if state.speaker != seat {
        return Err(DomainError::not_your_turn("not your turn to bid"));
    }

    let outcome = match action {
        BidAction::Pass => {
            if strict_mode && state.round == 2 && seat == dealer {
                return Err(DomainError::invalid_bid(
                    "dealer must bid when all others passed",
                ));
            }
            state.passes += 1;
            if state.passes as usize == SEATS {
                if state.round == 1 {
                    state.round = 2;
                    state.passes = 0;
                    state.speaker = next_seat(dealer);
                    BidOutcome::Continue {
                        next_speaker: state.speaker,
                    }
                } else {
                    BidOutcome::Gash
                }
            } else {
                state.speaker = next_seat(seat);
                BidOutcome::Continue {
                    next_speaker: state.speaker,
                }
            }
        }
        BidAction::Sun => {
            state.settled = true;
            BidOutcome::Settled {
                bidder: seat,
                mode: GameMode::Sun,
                trump: None,
                is_ashkal: false,
            }
        }
        BidAction::Ashkal => {
            if state.round != 1 {
                return Err(DomainError::invalid_bid("ashkal is a round-1 bid"));
            }
            state.settled = true;
            BidOutcome::Settled {
                bidder: seat,
                mode: GameMode::Sun,
                trump: None,
                is_ashkal: true,
            }
        }
        BidAction::Hokum => {
            let trump = match state.round {
                1 => {
                    if chosen_suit.is_some() && chosen_suit != Some(floor_suit) {
                        return Err(DomainError::invalid_bid(
                            "round-1 hokum is fixed to the floor suit",
                        ));
                    }
                    floor_suit
                }
                _ => {
                    let suit = chosen_suit
                        .ok_or_else(|| DomainError::invalid_bid("round-2 hokum needs a suit"))?;
                    if suit == floor_suit {
                        return Err(DomainError::invalid_bid(
                            "floor suit was already offered in round 1",
                        ));
                    }
                    suit
                }
            };
            state.settled = true;
            BidOutcome::Settled {
                bidder: seat,
                mode: GameMode::Hokum,
                trump: Some(trump),
                is_ashkal: false,
            }
        }
        BidAction::Kawesh => {
            if state.round != 1 {
                return Err(DomainError::invalid_bid("kawesh is a round-1 claim"));
            }
            if !hand_is_worthless(hand) {
                return Err(DomainError::invalid_bid(
                    "kawesh requires a worthless hand",
                ));
            }
            BidOutcome::Kawesh
        }
    };

    if let BidOutcome::Settled { bidder, .. } = &outcome {
        state.last_action = Some((*bidder, action));
    } else {
        state.last_action = Some((seat, action));
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn junk_hand() -> Vec<Card> {
        vec![
            card(Rank::Seven, Suit::Hearts),
            card(Rank::Eight, Suit::Hearts),
            card(Rank::Nine, Suit::Clubs),
            card(Rank::Queen, Suit::Diamonds),
            card(Rank::Jack, Suit::Spades),
        ]
    }

    fn decent_hand() -> Vec<Card> {
        vec![
            card(Rank::Ace, Suit::Hearts),
            card(Rank::Ten, Suit::Clubs),
            card(Rank::Seven, Suit::Spades),
            card(Rank::Eight, Suit::Spades),
            card(Rank::Nine, Suit::Diamonds),
        ]
    }

    #[test]
    fn first_speaker_is_left_of_dealer() {
        let state = BiddingState::new(3);
        assert_eq!(state.speaker, 0);
    }

    #[test]
    fn four_passes_advance_to_round_two() {
        let mut state = BiddingState::new(0);
        let hand = decent_hand();
        for seat in [1u8, 2, 3, 0] {
            let outcome = apply_bid(
                &mut state,
                seat,
                BidAction::Pass,
                None,
                Suit::Hearts,
                0,
                &hand,
                false,
            )
            .unwrap();
            assert!(matches!(outcome, BidOutcome::Continue { .. }));
        }
        assert_eq!(state.round, 2);
        assert_eq!(state.speaker, 1);
    }

    #[test]
    fn eight_passes_are_gash() {
        let mut state = BiddingState::new(0);
        let hand = decent_hand();
        for seat in [1u8, 2, 3, 0, 1, 2, 3] {
            apply_bid(
                &mut state,
                seat,
                BidAction::Pass,
                None,
                Suit::Hearts,
                0,
                &hand,
                false,
            )
            .unwrap();
        }
        let outcome = apply_bid(
            &mut state,
            0,
            BidAction::Pass,
            None,
            Suit::Hearts,
            0,
            &hand,
            false,
        )
        .unwrap();
        assert_eq!(outcome, BidOutcome::Gash);
    }

    #[test]
    fn strict_mode_forces_dealer_bid_in_round_two() {
        let mut state = BiddingState::new(0);
        let hand = decent_hand();
        for seat in [1u8, 2, 3, 0, 1, 2, 3] {
            apply_bid(
                &mut state,
                seat,
                BidAction::Pass,
                None,
                Suit::Hearts,
                0,
                &hand,
                true,
            )
            .unwrap();
        }
        let err = apply_bid(
            &mut state,
            0,
            BidAction::Pass,
            None,
            Suit::Hearts,
            0,
            &hand,
            true,
        );
        assert!(err.is_err());
        // The dealer can still buy.
        let outcome = apply_bid(
            &mut state,
            0,
            BidAction::Sun,
            None,
            Suit::Hearts,
            0,
            &hand,
            true,
        )
        .unwrap();
        assert!(matches!(outcome, BidOutcome::Settled { .. }));
    }

    #[test]
    fn round_one_hokum_is_floor_suit() {
        let mut state = BiddingState::new(0);
        let hand = decent_hand();
        let err = apply_bid(
            &mut state,
            1,
            BidAction::Hokum,
            Some(Suit::Clubs),
            Suit::Hearts,
            0,
            &hand,
            false,
        );
        assert!(err.is_err());
        let outcome = apply_bid(
            &mut state,
            1,
            BidAction::Hokum,
            None,
            Suit::Hearts,
            0,
            &hand,
            false,
        )
        .unwrap();
        assert_eq!(
            outcome,
            BidOutcome::Settled {
                bidder: 1,
                mode: GameMode::Hokum,
                trump: Some(Suit::Hearts),
                is_ashkal: false,
            }
        );
    }

    #[test]
    fn round_two_hokum_excludes_floor_suit() {
        let mut state = BiddingState::new(0);
        state.round = 2;
        let hand = decent_hand();
        let err = apply_bid(
            &mut state,
            1,
            BidAction::Hokum,
            Some(Suit::Hearts),
            Suit::Hearts,
            0,
            &hand,
            false,
        );
        assert!(err.is_err());
        let outcome = apply_bid(
            &mut state,
            1,
            BidAction::Hokum,
            Some(Suit::Clubs),
            Suit::Hearts,
            0,
            &hand,
            false,
        )
        .unwrap();
        assert!(matches!(
            outcome,
            BidOutcome::Settled {
                trump: Some(Suit::Clubs),
                ..
            }
        ));
    }

    #[test]
    fn kawesh_needs_a_worthless_hand() {
        let mut state = BiddingState::new(0);
        let err = apply_bid(
            &mut state,
            1,
            BidAction::Kawesh,
            None,
            Suit::Hearts,
            0,
            &decent_hand(),
            false,
        );
        assert!(err.is_err());

        let outcome = apply_bid(
            &mut state,
            1,
            BidAction::Kawesh,
            None,
            Suit::Hearts,
            0,
            &junk_hand(),
            false,
        )
        .unwrap();
        assert_eq!(outcome, BidOutcome::Kawesh);
    }

    #[test]
    fn ashkal_only_in_round_one() {
        let mut state = BiddingState::new(0);
        state.round = 2;
        let err = apply_bid(
            &mut state,
            1,
            BidAction::Ashkal,
            None,
            Suit::Hearts,
            0,
            &decent_hand(),
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn out_of_turn_bid_rejected_without_mutation() {
        let mut state = BiddingState::new(0);
        let before = state.clone();
        let err = apply_bid(
            &mut state,
            2,
            BidAction::Sun,
            None,
            Suit::Hearts,
            0,
            &decent_hand(),
            false,
        );
        assert!(err.is_err());
        assert_eq!(state, before);
    }
}
