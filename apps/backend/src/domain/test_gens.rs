//! Proptest generators for domain types.
//!
//! Card generators guarantee uniqueness where the game would, so generated
//! hands never violate the 32-card deck.

use proptest::prelude::*;

use crate::domain::cards::{full_deck, Card, GameMode, Rank, Suit};

pub fn suit() -> impl Strategy<Value = Suit> {
    prop_oneof![
        Just(Suit::Clubs),
        Just(Suit::Diamonds),
        Just(Suit::Hearts),
        Just(Suit::Spades),
    ]
}

pub fn rank() -> impl Strategy<Value = Rank> {
    proptest::sample::select(Rank::ALL.to_vec())
}

pub fn card() -> impl Strategy<Value = Card> {
    (rank(), suit()).prop_map(|(rank, suit)| Card { rank, suit })
}

pub fn mode() -> impl Strategy<Value = GameMode> {
    prop_oneof![Just(GameMode::Sun), Just(GameMode::Hokum)]
}

/// Up to `max` unique cards drawn from the deck.
pub fn unique_cards_up_to(max: usize) -> impl Strategy<Value = Vec<Card>> {
    proptest::sample::subsequence(full_deck(), 0..=max)
}

/// A non-empty hand of up to 8 unique cards.
pub fn hand() -> impl Strategy<Value = Vec<Card>> {
    proptest::sample::subsequence(full_deck(), 1..=8)
}

/// A hand guaranteed void in `suit`.
pub fn hand_without_suit(suit: Suit) -> impl Strategy<Value = Vec<Card>> {
    let pool: Vec<Card> = full_deck().into_iter().filter(|c| c.suit != suit).collect();
    proptest::sample::subsequence(pool, 1..=8)
}

/// Split of the team abnat pool for one mode (cards only, bonus included).
pub fn abnat_split(mode: GameMode) -> impl Strategy<Value = [u16; 2]> {
    let pool: u16 = match mode {
        GameMode::Sun => 130,
        GameMode::Hokum => 162,
    };
    (0..=pool).prop_map(move |us| [us, pool - us])
}
