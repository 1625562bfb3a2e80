//! Test-only helpers for driving a Game through its phases.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::bidding::BidAction;
use crate::domain::cards::Suit;
use crate::domain::game::{Game, GameAction, GameEvent, Phase};
use crate::domain::player::Seat;

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A room with four seated humans; dealing has happened and the auction is
/// open.
pub fn full_table(seed: u64) -> (Game, ChaCha8Rng) {
    let mut r = rng(seed);
    let mut game = Game::new("room-under-test");
    for name in ["aziz", "badr", "celine", "duha"] {
        game.join(name, Some(name), None, &mut r).unwrap();
    }
    assert_eq!(game.phase, Phase::Bidding);
    (game, r)
}

/// First speaker buys Sun, taking the table straight to Playing.
pub fn buy_sun(game: &mut Game, r: &mut ChaCha8Rng) -> Vec<GameEvent> {
    let speaker = game.current_turn.expect("auction must have a speaker");
    game.dispatch(
        speaker,
        GameAction::Bid {
            action: BidAction::Sun,
            suit: None,
        },
        r,
    )
    .expect("sun buy must settle")
}

/// First speaker buys Hokum at the floor suit.
pub fn buy_hokum(game: &mut Game, r: &mut ChaCha8Rng) -> (Seat, Suit) {
    let speaker = game.current_turn.expect("auction must have a speaker");
    let floor_suit = game.round.floor_card.expect("floor card present").suit;
    game.dispatch(
        speaker,
        GameAction::Bid {
            action: BidAction::Hokum,
            suit: None,
        },
        r,
    )
    .expect("hokum buy must settle");
    (speaker, floor_suit)
}

/// Play the first legal card at the current turn, clearing the trick
/// transition window the way the scheduler would.
pub fn step_play(game: &mut Game, r: &mut ChaCha8Rng) -> Vec<GameEvent> {
    if game.round.trick_transitioning {
        game.clear_trick_transition();
    }
    let seat = game.current_turn.expect("someone must hold the turn");
    let legal = game.legal_plays_for(seat);
    let card = *legal.first().expect("a player with cards has a legal play");
    let hand = game.player(seat).unwrap().hand.clone();
    let index = hand.iter().position(|c| *c == card).unwrap();
    game.dispatch(seat, GameAction::Play { card_index: index }, r)
        .expect("first legal card must be accepted")
}

/// Drive the current round to completion, asserting the conservation and
/// turn invariants after every play.
pub fn play_out_round(game: &mut Game, r: &mut ChaCha8Rng) {
    let mut guard = 0;
    while game.phase == Phase::Playing {
        step_play(game, r);
        assert!(game.cards_conserved(), "card multiset broken mid-round");
        assert!(game.turn_flags_consistent(), "turn flags diverged");
        guard += 1;
        assert!(guard <= 40, "round did not terminate");
    }
}
