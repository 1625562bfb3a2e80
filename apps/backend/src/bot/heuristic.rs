//! Baseline heuristic strategy, parameterized by difficulty.
//!
//! Easy plays the first legal card; higher difficulties bid on hand
//! strength and try to win tricks cheaply. Khalid is Hard with table talk.

use crate::bot::{BotContext, BotError, BotLine, BotStrategy};
use crate::domain::akka::verify_akka;
use crate::domain::bidding::BidAction;
use crate::domain::cards::{Card, GameMode, Rank, Suit};
use crate::domain::game::{GameAction, Phase};
use crate::domain::player::BotDifficulty;
use crate::domain::rules::current_winner;

pub struct HeuristicBot {
    difficulty: BotDifficulty,
}

impl HeuristicBot {
    pub fn new(difficulty: BotDifficulty) -> Self {
        HeuristicBot { difficulty }
    }

    fn hand(&self, ctx: &BotContext<'_>) -> Vec<Card> {
        ctx.game
            .player(ctx.seat)
            .map(|p| p.hand.clone())
            .unwrap_or_default()
    }

    fn choose_bid(&self, ctx: &BotContext<'_>) -> GameAction {
        let game = ctx.game;
        let hand = self.hand(ctx);
        let bidding = &game.round.bidding;
        let floor_suit = game.round.floor_card.map(|c| c.suit);

        let aces = hand.iter().filter(|c| c.rank == Rank::Ace).count();
        let tens = hand.iter().filter(|c| c.rank == Rank::Ten).count();
        let forced = game.settings.strict_mode && bidding.round == 2 && ctx.seat == game.dealer;

        let suit_strength = |suit: Suit| -> u32 {
            hand.iter()
                .filter(|c| c.suit == suit)
                .map(|c| 1 + u32::from(matches!(c.rank, Rank::Jack | Rank::Nine | Rank::Ace)))
                .sum()
        };

        if bidding.round == 1 {
            if let Some(floor) = floor_suit {
                let threshold = match self.difficulty {
                    BotDifficulty::Easy => 6,
                    BotDifficulty::Medium => 5,
                    BotDifficulty::Hard | BotDifficulty::Khalid => 4,
                };
                if suit_strength(floor) >= threshold {
                    return GameAction::Bid {
                        action: BidAction::Hokum,
                        suit: None,
                    };
                }
            }
            if aces + tens >= 3 {
                return GameAction::Bid {
                    action: BidAction::Sun,
                    suit: None,
                };
            }
            return GameAction::Bid {
                action: BidAction::Pass,
                suit: None,
            };
        }

        // Round 2: any suit but the floor's.
        let best_other = Suit::ALL
            .iter()
            .copied()
            .filter(|s| Some(*s) != floor_suit)
            .max_by_key(|s| suit_strength(*s));
        if let Some(suit) = best_other {
            let threshold = if forced { 0 } else { 5 };
            if suit_strength(suit) >= threshold {
                return GameAction::Bid {
                    action: BidAction::Hokum,
                    suit: Some(suit),
                };
            }
        }
        if aces >= 2 || forced {
            return GameAction::Bid {
                action: BidAction::Sun,
                suit: None,
            };
        }
        GameAction::Bid {
            action: BidAction::Pass,
            suit: None,
        }
    }

    fn choose_play(&self, ctx: &BotContext<'_>) -> Result<GameAction, BotError> {
        let game = ctx.game;

        // Table any pending declarations before the first trick closes.
        if game.round.tricks.is_empty()
            && !game.round.projects.available[ctx.seat as usize].is_empty()
        {
            return Ok(GameAction::DeclareProject { project_ref: 0 });
        }

        let legal = game.legal_plays_for(ctx.seat);
        if legal.is_empty() {
            return Err(BotError::NoDecision("no legal plays".into()));
        }
        let hand = self.hand(ctx);
        let mode = game.mode().unwrap_or(GameMode::Sun);
        let trump = game.trump();

        let first = legal[0];
        let pick = match self.difficulty {
            BotDifficulty::Easy => first,
            _ => {
                let lowest = |cards: &[Card]| -> Card {
                    cards
                        .iter()
                        .copied()
                        .min_by_key(|c| c.order_in(mode, trump))
                        .unwrap_or(first)
                };
                let table = &game.round.table;
                if table.is_empty() {
                    lowest(&legal)
                } else {
                    let winners: Vec<Card> = legal
                        .iter()
                        .copied()
                        .filter(|c| {
                            let mut extended = table.to_vec();
                            extended.push(crate::domain::rules::TablePlay {
                                card: *c,
                                played_by: ctx.seat,
                            });
                            current_winner(&extended, mode, trump) == Some(ctx.seat)
                        })
                        .collect();
                    if winners.is_empty() {
                        lowest(&legal)
                    } else {
                        lowest(&winners)
                    }
                }
            }
        };

        let index = hand
            .iter()
            .position(|c| *c == pick)
            .ok_or_else(|| BotError::Internal("chosen card left the hand".into()))?;
        Ok(GameAction::Play { card_index: index })
    }
}

impl BotStrategy for HeuristicBot {
    fn decide(&self, ctx: &BotContext<'_>) -> Result<GameAction, BotError> {
        match ctx.game.phase {
            Phase::Bidding => Ok(self.choose_bid(ctx)),
            Phase::Playing => self.choose_play(ctx),
            Phase::RoundOver => Ok(GameAction::NextRound),
            Phase::QaydActive => Ok(GameAction::QaydCancel),
            _ => Err(BotError::NoDecision(format!(
                "nothing to do in {:?}",
                ctx.game.phase
            ))),
        }
    }

    fn respond_sawa(&self, ctx: &BotContext<'_>) -> bool {
        if self.difficulty == BotDifficulty::Easy {
            return true;
        }
        // Holding a master card anywhere is reason enough to reject.
        let hand = self.hand(ctx);
        let mode = ctx.game.mode().unwrap_or(GameMode::Sun);
        let trump = ctx.game.trump();
        let played = ctx.game.round.played_cards();
        !Suit::ALL
            .iter()
            .any(|suit| verify_akka(&hand, &played, *suit, mode, trump))
    }

    fn line_for(&self, _ctx: &BotContext<'_>, action: &GameAction) -> Option<BotLine> {
        if self.difficulty != BotDifficulty::Khalid {
            return None;
        }
        let (text, emotion) = match action {
            GameAction::Bid {
                action: BidAction::Hokum,
                ..
            } => ("حكم!", "confident"),
            GameAction::Bid {
                action: BidAction::Sun,
                ..
            } => ("صن، ورونا اللعب", "confident"),
            GameAction::Double => ("دبل!", "taunting"),
            GameAction::SawaClaim => ("سوا والباقي لنا", "smug"),
            _ => return None,
        };
        Some(BotLine {
            text: text.to_string(),
            emotion: emotion.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_state_helpers::{buy_sun, full_table};

    #[test]
    fn bot_always_produces_a_dispatchable_bid() {
        let (mut game, mut r) = full_table(301);
        for _ in 0..4 {
            let seat = game.current_turn.unwrap();
            let bot = HeuristicBot::new(BotDifficulty::Medium);
            let action = bot
                .decide(&BotContext {
                    game: &game,
                    seat,
                })
                .unwrap();
            game.dispatch(seat, action, &mut r).unwrap();
            if game.phase != Phase::Bidding {
                break;
            }
        }
    }

    #[test]
    fn bot_plays_legal_cards_to_round_end() {
        let (mut game, mut r) = full_table(307);
        buy_sun(&mut game, &mut r);
        let bot = HeuristicBot::new(BotDifficulty::Hard);
        let mut guard = 0;
        while game.phase == Phase::Playing {
            if game.round.trick_transitioning {
                game.clear_trick_transition();
            }
            let seat = game.current_turn.unwrap();
            let action = bot
                .decide(&BotContext {
                    game: &game,
                    seat,
                })
                .unwrap();
            game.dispatch(seat, action, &mut r).unwrap();
            assert!(game.cards_conserved());
            guard += 1;
            assert!(guard < 80, "bot round must terminate");
        }
    }

    #[test]
    fn easy_bot_accepts_sawa() {
        let (mut game, mut r) = full_table(311);
        buy_sun(&mut game, &mut r);
        let claimer = game.current_turn.unwrap();
        game.dispatch(claimer, GameAction::SawaClaim, &mut r)
            .unwrap();
        let responder = (claimer + 1) % 4;
        let bot = HeuristicBot::new(BotDifficulty::Easy);
        assert!(bot.respond_sawa(&BotContext {
            game: &game,
            seat: responder,
        }));
    }

    #[test]
    fn khalid_talks_on_big_bids() {
        let (game, _) = full_table(313);
        let bot = HeuristicBot::new(BotDifficulty::Khalid);
        let line = bot.line_for(
            &BotContext { game: &game, seat: 0 },
            &GameAction::Double,
        );
        assert!(line.is_some());
    }
}
