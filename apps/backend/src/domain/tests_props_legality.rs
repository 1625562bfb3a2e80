//! Property-based tests for follow-suit legality.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::domain::cards::{Card, GameMode};
use crate::domain::rules::{legal_plays, TablePlay};
use crate::domain::{test_gens, test_prelude};

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Legal plays are always a non-empty, duplicate-free subset of the hand.
    #[test]
    fn prop_legal_plays_subset(
        hand in test_gens::hand(),
        mode in test_gens::mode(),
        lead in proptest::option::of(test_gens::card()),
        trump_suit in test_gens::suit(),
    ) {
        let trick: Vec<TablePlay> = lead
            .into_iter()
            .filter(|c| !hand.contains(c))
            .map(|card| TablePlay { card, played_by: 0 })
            .collect();
        let trump = (mode == GameMode::Hokum).then_some(trump_suit);

        let legal = legal_plays(&hand, &trick, 1, mode, trump, false);

        prop_assert!(!legal.is_empty(), "a player with cards always has a legal play");
        let set: HashSet<Card> = legal.iter().copied().collect();
        prop_assert_eq!(set.len(), legal.len(), "no duplicates");
        for card in &legal {
            prop_assert!(hand.contains(card), "legal play {:?} must come from the hand", card);
        }
    }

    /// With lead-suit cards in hand, every legal play follows suit.
    #[test]
    fn prop_follow_suit_when_holding(
        mode in test_gens::mode(),
        lead_card in test_gens::card(),
        extra in test_gens::unique_cards_up_to(7),
        held in test_gens::card(),
        trump_suit in test_gens::suit(),
    ) {
        let lead_suit = lead_card.suit;
        // Force at least one card of the lead suit into the hand.
        let mut hand = vec![Card { rank: held.rank, suit: lead_suit }];
        for c in extra {
            if !hand.contains(&c) && c != lead_card {
                hand.push(c);
            }
        }
        prop_assume!(!hand.contains(&lead_card));
        let trick = vec![TablePlay { card: lead_card, played_by: 0 }];
        let trump = (mode == GameMode::Hokum).then_some(trump_suit);

        let legal = legal_plays(&hand, &trick, 1, mode, trump, false);
        for card in &legal {
            prop_assert_eq!(card.suit, lead_suit);
        }
    }

    /// A hand void in the lead suit in Sun may play anything.
    #[test]
    fn prop_void_in_sun_is_free(
        (lead, hand) in test_gens::suit().prop_flat_map(|s| {
            (test_gens::rank().prop_map(move |rank| Card { rank, suit: s }),
             test_gens::hand_without_suit(s))
        }),
    ) {
        let trick = vec![TablePlay { card: lead, played_by: 0 }];
        let legal = legal_plays(&hand, &trick, 1, GameMode::Sun, None, false);
        prop_assert_eq!(legal.len(), hand.len());
    }
}
