//! Core card types for the 32-card Baloot deck: Card, Rank, Suit, GameMode.
//!
//! Two rank orderings exist. The Sun order (7<8<9<J<Q<K<10<A) applies in Sun
//! mode and to non-trump suits in Hokum. The trump order (7<8<Q<K<10<A<9<J)
//! applies only to the trump suit in Hokum.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(rename = "♣")]
    Clubs,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♠")]
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Hearts => "♥",
            Suit::Spades => "♠",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Suit> {
        match s {
            "♣" => Some(Suit::Clubs),
            "♦" => Some(Suit::Diamonds),
            "♥" => Some(Suit::Hearts),
            "♠" => Some(Suit::Spades),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Position in the natural 7..A sequence, used for project runs and
    /// display sorting. Not a strength ordering.
    pub fn sequence_index(self) -> u8 {
        match self {
            Rank::Seven => 0,
            Rank::Eight => 1,
            Rank::Nine => 2,
            Rank::Ten => 3,
            Rank::Jack => 4,
            Rank::Queen => 5,
            Rank::King => 6,
            Rank::Ace => 7,
        }
    }
}

/// The adopted contract mode for a round.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Sun,
    Hokum,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    /// Strength in the Sun ordering: 7<8<9<J<Q<K<10<A.
    pub fn sun_order(self) -> u8 {
        match self.rank {
            Rank::Seven => 0,
            Rank::Eight => 1,
            Rank::Nine => 2,
            Rank::Jack => 3,
            Rank::Queen => 4,
            Rank::King => 5,
            Rank::Ten => 6,
            Rank::Ace => 7,
        }
    }

    /// Strength in the Hokum trump-suit ordering: 7<8<Q<K<10<A<9<J.
    pub fn trump_order(self) -> u8 {
        match self.rank {
            Rank::Seven => 0,
            Rank::Eight => 1,
            Rank::Queen => 2,
            Rank::King => 3,
            Rank::Ten => 4,
            Rank::Ace => 5,
            Rank::Nine => 6,
            Rank::Jack => 7,
        }
    }

    /// Strength within this card's suit for the given mode/trump.
    pub fn order_in(self, mode: GameMode, trump: Option<Suit>) -> u8 {
        if mode == GameMode::Hokum && Some(self.suit) == trump {
            self.trump_order()
        } else {
            self.sun_order()
        }
    }

    /// Abnat value of this card in the given mode.
    ///
    /// Sun suits carry 30 abnat each (120 for the deck); in Hokum the trump
    /// suit carries 62 and the rest 30 each (152). The +10 last-trick bonus
    /// is added by the trick logic, not here.
    pub fn points(self, mode: GameMode, trump: Option<Suit>) -> u16 {
        if mode == GameMode::Hokum && Some(self.suit) == trump {
            match self.rank {
                Rank::Jack => 20,
                Rank::Nine => 14,
                Rank::Ace => 11,
                Rank::Ten => 10,
                Rank::King => 4,
                Rank::Queen => 3,
                Rank::Eight | Rank::Seven => 0,
            }
        } else {
            match self.rank {
                Rank::Ace => 11,
                Rank::Ten => 10,
                Rank::King => 4,
                Rank::Queen => 3,
                Rank::Jack => 2,
                Rank::Nine | Rank::Eight | Rank::Seven => 0,
            }
        }
    }

    pub fn label(self) -> String {
        let rank = match self.rank {
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        };
        format!("{}{}", rank, self.suit.symbol())
    }
}

// Ord/Eq on Card is only for stable sorting: suit order then sequence order.
// Trick resolution must go through rules::trick_winner, which knows lead/trump.
impl Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.suit.cmp(&other.suit) {
            std::cmp::Ordering::Equal => {
                self.rank.sequence_index().cmp(&other.rank.sequence_index())
            }
            ord => ord,
        }
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub const DECK_SIZE: usize = 32;

static CANONICAL_DECK: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
});

/// The canonical 32-card deck, suit-major in sequence order.
pub fn full_deck() -> Vec<Card> {
    CANONICAL_DECK.clone()
}

pub fn hand_has_suit(hand: &[Card], suit: Suit) -> bool {
    hand.iter().any(|c| c.suit == suit)
}

/// Whether `a` beats `b` given the led suit and the round mode.
///
/// In Hokum a trump card beats every non-trump; off-suit non-trump cards
/// never win. In Sun only lead-suit cards compete.
pub fn card_beats(a: Card, b: Card, lead: Suit, mode: GameMode, trump: Option<Suit>) -> bool {
    if mode == GameMode::Hokum {
        if let Some(t) = trump {
            let a_trump = a.suit == t;
            let b_trump = b.suit == t;
            if a_trump && !b_trump {
                return true;
            }
            if b_trump && !a_trump {
                return false;
            }
            if a_trump && b_trump {
                return a.trump_order() > b.trump_order();
            }
        }
    }
    let a_follows = a.suit == lead;
    let b_follows = b.suit == lead;
    if a_follows && !b_follows {
        return true;
    }
    if b_follows && !a_follows {
        return false;
    }
    if a_follows && b_follows {
        return a.sun_order() > b.sun_order();
    }
    false
}

/// Sort a hand for display: suit-major, strongest first within each suit
/// using the adopted mode's ordering.
pub fn sort_hand(hand: &mut [Card], mode: GameMode, trump: Option<Suit>) {
    hand.sort_by(|a, b| match a.suit.cmp(&b.suit) {
        std::cmp::Ordering::Equal => b.order_in(mode, trump).cmp(&a.order_in(mode, trump)),
        ord => ord,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_has_32_unique_cards() {
        let deck = full_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let unique: std::collections::HashSet<Card> = deck.iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
    }

    #[test]
    fn sun_pool_is_120_before_last_trick_bonus() {
        let total: u16 = full_deck()
            .iter()
            .map(|c| c.points(GameMode::Sun, None))
            .sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn hokum_pool_is_152_before_last_trick_bonus() {
        let total: u16 = full_deck()
            .iter()
            .map(|c| c.points(GameMode::Hokum, Some(Suit::Spades)))
            .sum();
        assert_eq!(total, 152);
    }

    #[test]
    fn trump_jack_beats_everything_in_suit() {
        let jack = Card::new(Rank::Jack, Suit::Hearts);
        for rank in Rank::ALL {
            if rank == Rank::Jack {
                continue;
            }
            let other = Card::new(rank, Suit::Hearts);
            assert!(card_beats(
                jack,
                other,
                Suit::Hearts,
                GameMode::Hokum,
                Some(Suit::Hearts)
            ));
        }
    }

    #[test]
    fn nine_outranks_ace_only_as_trump() {
        let nine = Card::new(Rank::Nine, Suit::Clubs);
        let ace = Card::new(Rank::Ace, Suit::Clubs);
        assert!(card_beats(
            nine,
            ace,
            Suit::Clubs,
            GameMode::Hokum,
            Some(Suit::Clubs)
        ));
        assert!(!card_beats(nine, ace, Suit::Clubs, GameMode::Sun, None));
        assert!(!card_beats(
            nine,
            ace,
            Suit::Clubs,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }

    #[test]
    fn ten_sits_between_king_and_ace_in_sun() {
        let ten = Card::new(Rank::Ten, Suit::Diamonds);
        let king = Card::new(Rank::King, Suit::Diamonds);
        let ace = Card::new(Rank::Ace, Suit::Diamonds);
        assert!(card_beats(ten, king, Suit::Diamonds, GameMode::Sun, None));
        assert!(card_beats(ace, ten, Suit::Diamonds, GameMode::Sun, None));
    }

    #[test]
    fn small_trump_beats_offsuit_ace() {
        let seven_trump = Card::new(Rank::Seven, Suit::Spades);
        let ace_lead = Card::new(Rank::Ace, Suit::Hearts);
        assert!(card_beats(
            seven_trump,
            ace_lead,
            Suit::Hearts,
            GameMode::Hokum,
            Some(Suit::Spades)
        ));
    }

    #[test]
    fn offsuit_never_wins_in_sun() {
        let ace_off = Card::new(Rank::Ace, Suit::Spades);
        let seven_lead = Card::new(Rank::Seven, Suit::Hearts);
        assert!(!card_beats(
            ace_off,
            seven_lead,
            Suit::Hearts,
            GameMode::Sun,
            None
        ));
    }

    #[test]
    fn suit_symbols_round_trip() {
        for suit in Suit::ALL {
            assert_eq!(Suit::from_symbol(suit.symbol()), Some(suit));
        }
        assert_eq!(Suit::from_symbol("x"), None);
    }
}
