//! Bot players.
//!
//! Strategy internals are a black box behind [`BotStrategy::decide`]; the
//! scheduler only cares that a decision comes back (or fails, in which
//! case the fallback plays the first legal card so the game can never be
//! corrupted by a bot).

use std::fmt;

use crate::domain::bidding::BidAction;
use crate::domain::game::{Game, GameAction};
use crate::domain::player::{BotDifficulty, Seat};

pub mod heuristic;

pub use heuristic::HeuristicBot;

/// Errors surfaced by bot decision-making. These never propagate into the
/// game state; the scheduler logs and falls back.
#[derive(Debug)]
pub enum BotError {
    /// The strategy produced no usable action.
    NoDecision(String),
    Internal(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::NoDecision(msg) => write!(f, "bot made no decision: {msg}"),
            BotError::Internal(msg) => write!(f, "bot internal error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

/// Everything a strategy may look at: the full game through the eyes of
/// one seat. Strategies must not inspect other seats' hands.
pub struct BotContext<'a> {
    pub game: &'a Game,
    pub seat: Seat,
}

/// A dialogue line pushed to clients alongside a bot action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotLine {
    pub text: String,
    pub emotion: String,
}

pub trait BotStrategy: Send + Sync {
    /// Choose the turn action for `ctx.seat`.
    fn decide(&self, ctx: &BotContext<'_>) -> Result<GameAction, BotError>;

    /// Answer an open sawa claim.
    fn respond_sawa(&self, ctx: &BotContext<'_>) -> bool;

    /// Optional table talk for a just-taken action.
    fn line_for(&self, _ctx: &BotContext<'_>, _action: &GameAction) -> Option<BotLine> {
        None
    }
}

/// Build the strategy for a difficulty tag.
pub fn create_bot(difficulty: BotDifficulty) -> Box<dyn BotStrategy> {
    Box::new(HeuristicBot::new(difficulty))
}

/// Last-resort action when a strategy fails: first legal card during
/// play, pass during the auction. `None` when the seat has nothing to do.
pub fn fallback_action(game: &Game, seat: Seat) -> Option<GameAction> {
    use crate::domain::game::Phase;
    match game.phase {
        Phase::Bidding => Some(GameAction::Bid {
            action: BidAction::Pass,
            suit: None,
        }),
        Phase::Playing => {
            let legal = game.legal_plays_for(seat);
            let first = legal.first()?;
            let hand = game.player(seat)?.hand.clone();
            let index = hand.iter().position(|c| c == first)?;
            Some(GameAction::Play { card_index: index })
        }
        Phase::RoundOver => Some(GameAction::NextRound),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_state_helpers::{buy_sun, full_table};

    #[test]
    fn fallback_passes_in_bidding() {
        let (game, _) = full_table(211);
        let action = fallback_action(&game, game.current_turn.unwrap()).unwrap();
        assert!(matches!(
            action,
            GameAction::Bid {
                action: BidAction::Pass,
                ..
            }
        ));
    }

    #[test]
    fn fallback_plays_a_legal_card() {
        let (mut game, mut r) = full_table(223);
        buy_sun(&mut game, &mut r);
        let seat = game.current_turn.unwrap();
        let action = fallback_action(&game, seat).unwrap();
        let GameAction::Play { card_index } = action else {
            panic!("expected a play");
        };
        let card = game.player(seat).unwrap().hand[card_index];
        assert!(game.legal_plays_for(seat).contains(&card));
    }
}
