//! Pure play-legality and trick-resolution rules.
//!
//! Everything here is a total function over immutable inputs: bad input
//! yields `false` or an empty set, never a panic.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{card_beats, hand_has_suit, Card, GameMode, Suit};
use crate::domain::player::{partner, Seat};

/// One card on the table, tagged with the seat that played it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlay {
    pub card: Card,
    #[serde(rename = "playedBy")]
    pub played_by: Seat,
}

pub const TRICKS_PER_ROUND: usize = 8;
pub const LAST_TRICK_BONUS: u16 = 10;

/// A finished trick as recorded in the round history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTrick {
    pub plays: Vec<TablePlay>,
    pub winner: Seat,
}

/// Seat currently winning the (possibly incomplete) trick.
pub fn current_winner(trick: &[TablePlay], mode: GameMode, trump: Option<Suit>) -> Option<Seat> {
    let first = trick.first()?;
    let lead = first.card.suit;
    let mut best = first;
    for play in &trick[1..] {
        if card_beats(play.card, best.card, lead, mode, trump) {
            best = play;
        }
    }
    Some(best.played_by)
}

/// Winner of a completed trick: highest trump present, else highest card
/// of the led suit.
pub fn trick_winner(trick: &[TablePlay], mode: GameMode, trump: Option<Suit>) -> Option<Seat> {
    if trick.len() != 4 {
        return None;
    }
    current_winner(trick, mode, trump)
}

/// Abnat carried by a trick's cards.
pub fn trick_points(trick: &[TablePlay], mode: GameMode, trump: Option<Suit>) -> u16 {
    trick.iter().map(|p| p.card.points(mode, trump)).sum()
}

/// Table-driven card value, exposed for scoring and the professor heuristic.
pub fn card_points(card: Card, mode: GameMode, trump: Option<Suit>) -> u16 {
    card.points(mode, trump)
}

fn highest_of_suit_on_table(
    trick: &[TablePlay],
    suit: Suit,
    mode: GameMode,
    trump: Option<Suit>,
) -> Option<Card> {
    trick
        .iter()
        .map(|p| p.card)
        .filter(|c| c.suit == suit)
        .max_by_key(|c| c.order_in(mode, trump))
}

fn partner_is_winning(trick: &[TablePlay], who: Seat, mode: GameMode, trump: Option<Suit>) -> bool {
    current_winner(trick, mode, trump) == Some(partner(who))
}

/// Whether `card` may legally be played from `hand` onto `trick`.
///
/// Follow the led suit when possible. In Sun, a follower able to beat the
/// highest led-suit card on the table must do so. In Hokum, a void player
/// must trump while the partner is not winning, and trumping over an
/// existing trump requires over-trumping when able; a locked round (doubled
/// Hokum) waives the over-trump obligation.
#[allow(clippy::too_many_arguments)]
pub fn is_legal_play(
    card: Card,
    hand: &[Card],
    trick: &[TablePlay],
    who: Seat,
    mode: GameMode,
    trump: Option<Suit>,
    is_locked: bool,
) -> bool {
    if !hand.contains(&card) {
        return false;
    }
    let Some(first) = trick.first() else {
        // Leading: any card.
        return true;
    };
    let lead = first.card.suit;

    if hand_has_suit(hand, lead) {
        if card.suit != lead {
            return false;
        }
        match mode {
            GameMode::Sun => {
                // Must head the trick within the led suit when able.
                let best = highest_of_suit_on_table(trick, lead, mode, trump);
                if let Some(best) = best {
                    let can_beat = hand
                        .iter()
                        .any(|c| c.suit == lead && c.sun_order() > best.sun_order());
                    if can_beat {
                        return card.sun_order() > best.sun_order();
                    }
                }
                true
            }
            GameMode::Hokum => {
                // Over-trump obligation only applies within the trump suit.
                if Some(lead) == trump && !is_locked {
                    if let Some(best) = highest_of_suit_on_table(trick, lead, mode, trump) {
                        let can_beat = hand
                            .iter()
                            .any(|c| c.suit == lead && c.trump_order() > best.trump_order());
                        if can_beat {
                            return card.trump_order() > best.trump_order();
                        }
                    }
                }
                true
            }
        }
    } else {
        match mode {
            GameMode::Sun => true,
            GameMode::Hokum => {
                let Some(t) = trump else { return true };
                if !hand_has_suit(hand, t) {
                    return true;
                }
                if partner_is_winning(trick, who, mode, trump) {
                    // Free discard while the partner holds the trick.
                    return true;
                }
                if card.suit != t {
                    return false;
                }
                if is_locked {
                    return true;
                }
                // Must over-trump an existing trump when able.
                if let Some(best) = highest_of_suit_on_table(trick, t, mode, trump) {
                    let can_beat = hand
                        .iter()
                        .any(|c| c.suit == t && c.trump_order() > best.trump_order());
                    if can_beat {
                        return card.trump_order() > best.trump_order();
                    }
                }
                true
            }
        }
    }
}

/// All cards in `hand` legal to play onto `trick`.
pub fn legal_plays(
    hand: &[Card],
    trick: &[TablePlay],
    who: Seat,
    mode: GameMode,
    trump: Option<Suit>,
    is_locked: bool,
) -> Vec<Card> {
    hand.iter()
        .copied()
        .filter(|c| is_legal_play(*c, hand, trick, who, mode, trump, is_locked))
        .collect()
}
