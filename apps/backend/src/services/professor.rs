//! Professor intercept: a pre-finalize review of human card plays.
//!
//! When enabled for a room, a proposed play is compared against the best
//! alternative by a cheap estimate. A big enough delta withholds the
//! mutation and returns the suggestion; the client insists by retrying
//! with `skip_professor`.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode};
use crate::domain::game::Game;
use crate::domain::player::Seat;
use crate::domain::rules::{current_winner, trick_points, TablePlay};

/// Minimum estimated-value gap before the professor interrupts.
pub const INTERVENTION_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorAdvice {
    pub suggested_index: usize,
    pub suggested_card: String,
    pub reasoning: String,
}

/// Estimated value of playing `card` onto the current trick: winning
/// keeps the pot plus the card, losing donates the card's points.
fn estimate(game: &Game, seat: Seat, card: Card, mode: GameMode) -> i32 {
    let trump = game.trump();
    let mut extended: Vec<TablePlay> = game.round.table.clone();
    extended.push(TablePlay {
        card,
        played_by: seat,
    });
    let pot = trick_points(&extended, mode, trump) as i32;
    if current_winner(&extended, mode, trump) == Some(seat) {
        pot
    } else {
        -(card.points(mode, trump) as i32)
    }
}

/// Review a proposed play. `None` means the play stands.
pub fn review_play(game: &Game, seat: Seat, card_index: usize) -> Option<ProfessorAdvice> {
    let mode = game.mode()?;
    let hand = &game.player(seat)?.hand;
    let proposed = *hand.get(card_index)?;
    let legal = game.legal_plays_for(seat);
    if !legal.contains(&proposed) {
        // Illegal plays are the rules module's business, not ours.
        return None;
    }

    let proposed_value = estimate(game, seat, proposed, mode);
    let (best, best_value) = legal
        .iter()
        .map(|c| (*c, estimate(game, seat, *c, mode)))
        .max_by_key(|(_, v)| *v)?;

    if best == proposed || best_value - proposed_value <= INTERVENTION_THRESHOLD {
        return None;
    }
    let suggested_index = hand.iter().position(|c| *c == best)?;
    Some(ProfessorAdvice {
        suggested_index,
        suggested_card: best.label(),
        reasoning: format!(
            "{} throws away points here; {} is worth about {} more",
            proposed.label(),
            best.label(),
            best_value - proposed_value
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::{Rank, Suit};
    use crate::domain::game::GameAction;
    use crate::domain::test_state_helpers::{buy_sun, full_table};

    #[test]
    fn professor_stays_quiet_on_best_play() {
        let (mut game, mut r) = full_table(401);
        buy_sun(&mut game, &mut r);
        let seat = game.current_turn.unwrap();
        let legal = game.legal_plays_for(seat);
        let mode = game.mode().unwrap();
        let best = legal
            .iter()
            .copied()
            .max_by_key(|c| estimate(&game, seat, *c, mode))
            .unwrap();
        let index = game
            .player(seat)
            .unwrap()
            .hand
            .iter()
            .position(|c| *c == best)
            .unwrap();
        assert!(review_play(&game, seat, index).is_none());
    }

    #[test]
    fn professor_flags_donating_an_ace() {
        let (mut game, mut r) = full_table(409);
        buy_sun(&mut game, &mut r);

        // Construct a follower holding the ace and a seven of the lead
        // suit behind an unbeatable ten... in Sun the ace heads, so use a
        // void discard instead: seat is void in the lead suit.
        let leader = game.current_turn.unwrap();
        let lead_suit = Suit::Hearts;
        let follower = (leader + 1) % 4;
        {
            let seats = &mut game.seats;
            seats[leader as usize].as_mut().unwrap().hand =
                vec![Card::new(Rank::Ten, lead_suit)];
            seats[follower as usize].as_mut().unwrap().hand = vec![
                Card::new(Rank::Ace, Suit::Spades),
                Card::new(Rank::Seven, Suit::Clubs),
            ];
        }
        game.dispatch(leader, GameAction::Play { card_index: 0 }, &mut r)
            .unwrap();

        // Discarding the off-suit ace donates 11 abnat; the seven is free.
        let advice = review_play(&game, follower, 0);
        assert!(advice.is_some());
        let advice = advice.unwrap();
        assert_eq!(advice.suggested_index, 1);

        // The seven itself is fine.
        assert!(review_play(&game, follower, 1).is_none());
    }
}
