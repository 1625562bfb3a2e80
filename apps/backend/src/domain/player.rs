//! Seats, teams and per-seat player records.

use serde::{Deserialize, Serialize};

use crate::domain::cards::Card;

/// Absolute seat index 0..=3, clockwise [Bottom, Right, Top, Left].
pub type Seat = u8;

pub const SEATS: usize = 4;

/// Team index: seats {0,2} are team 0 ("us"), {1,3} team 1 ("them").
pub type TeamId = usize;

pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % SEATS as u8
}

pub fn partner(seat: Seat) -> Seat {
    (seat + 2) % SEATS as u8
}

pub fn team_of(seat: Seat) -> TeamId {
    (seat % 2) as usize
}

pub fn opposing_team(team: TeamId) -> TeamId {
    1 - team
}

/// Position label in the clockwise cycle, relative to the table layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Bottom,
    Right,
    Top,
    Left,
}

impl Position {
    pub fn of(seat: Seat) -> Position {
        match seat % 4 {
            0 => Position::Bottom,
            1 => Position::Right,
            2 => Position::Top,
            _ => Position::Left,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
    Khalid,
}

impl Default for BotDifficulty {
    fn default() -> Self {
        BotDifficulty::Medium
    }
}

/// One seat at the table. Hand ownership is exclusive: cards leave a hand
/// only through a rules-validated play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub is_bot: bool,
    #[serde(default)]
    pub bot_difficulty: Option<BotDifficulty>,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub is_active_turn: bool,
    #[serde(default)]
    pub is_dealer: bool,
    #[serde(default)]
    pub last_action: Option<String>,
    /// Connection identity bound at join time; rejoin must present the same.
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub connected: bool,
}

impl Player {
    pub fn human(name: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            is_bot: false,
            bot_difficulty: None,
            hand: Vec::new(),
            is_active_turn: false,
            is_dealer: false,
            last_action: None,
            identity: None,
            connected: true,
        }
    }

    pub fn bot(name: impl Into<String>, difficulty: BotDifficulty) -> Self {
        Player {
            name: name.into(),
            is_bot: true,
            bot_difficulty: Some(difficulty),
            hand: Vec::new(),
            is_active_turn: false,
            is_dealer: false,
            last_action: None,
            identity: None,
            connected: true,
        }
    }

    pub fn remove_card(&mut self, card: Card) -> bool {
        if let Some(pos) = self.hand.iter().position(|c| *c == card) {
            self.hand.remove(pos);
            true
        } else {
            false
        }
    }
}

/// Typed room settings. The wire layer validates ranges before these are
/// ever mutated (turn_duration 1..=120 seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub turn_duration: u16,
    pub strict_mode: bool,
    pub bot_difficulty: BotDifficulty,
    pub sound_enabled: bool,
    pub show_hints: bool,
    pub is_debug: bool,
    pub professor_enabled: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            turn_duration: 30,
            strict_mode: false,
            bot_difficulty: BotDifficulty::Medium,
            sound_enabled: true,
            show_hints: true,
            is_debug: false,
            professor_enabled: false,
        }
    }
}

impl GameSettings {
    pub const MIN_TURN_DURATION: u16 = 1;
    pub const MAX_TURN_DURATION: u16 = 120;

    pub fn turn_duration_valid(secs: u16) -> bool {
        (Self::MIN_TURN_DURATION..=Self::MAX_TURN_DURATION).contains(&secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partners_sit_opposite() {
        assert_eq!(partner(0), 2);
        assert_eq!(partner(1), 3);
        assert_eq!(partner(2), 0);
        assert_eq!(partner(3), 1);
    }

    #[test]
    fn teams_split_even_odd() {
        assert_eq!(team_of(0), team_of(2));
        assert_eq!(team_of(1), team_of(3));
        assert_ne!(team_of(0), team_of(1));
    }

    #[test]
    fn remove_card_is_exclusive() {
        let mut p = Player::human("a");
        let card = Card::new(crate::domain::cards::Rank::Ace, crate::domain::cards::Suit::Spades);
        p.hand.push(card);
        assert!(p.remove_card(card));
        assert!(!p.remove_card(card));
        assert!(p.hand.is_empty());
    }
}
