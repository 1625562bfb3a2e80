//! Rotated client-state views: every recipient sits at Bottom and never
//! sees another seat's cards.

mod common;

use baloot_backend::domain::bidding::BidAction;
use baloot_backend::domain::game::{Game, GameAction, Phase};
use baloot_backend::domain::view::{client_state, rotate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn seated_game(seed: u64) -> (Game, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = Game::new("view-room");
    for name in ["aziz", "badr", "celine", "duha"] {
        game.join(name, Some(name), None, &mut rng).unwrap();
    }
    (game, rng)
}

#[test]
fn viewer_is_always_at_bottom() {
    let (game, _) = seated_game(501);
    for viewer in 0..4u8 {
        let state = client_state(&game, viewer);
        let me = &state.players[0];
        assert_eq!(me.name, game.player(viewer).unwrap().name);
        assert!(me.hand.is_some(), "own hand must be visible");
    }
}

#[test]
fn other_hands_never_leak() {
    let (game, _) = seated_game(503);
    for viewer in 0..4u8 {
        let state = client_state(&game, viewer);
        for other in &state.players[1..] {
            assert!(other.hand.is_none(), "only counts for other seats");
            assert_eq!(other.card_count, 5);
        }
    }
}

#[test]
fn turn_and_dealer_rotate_consistently() {
    let (game, _) = seated_game(509);
    let abs_turn = game.current_turn.unwrap();
    for viewer in 0..4u8 {
        let state = client_state(&game, viewer);
        assert_eq!(state.current_turn_index, Some(rotate(abs_turn, viewer)));
        assert_eq!(state.dealer_index, rotate(game.dealer, viewer));
        // The rotated active seat must carry the active flag.
        let idx = state.current_turn_index.unwrap() as usize;
        assert!(state.players[idx].is_active_turn);
    }
}

#[test]
fn table_plays_rotate_with_the_players() {
    let (mut game, mut rng) = seated_game(521);
    let speaker = game.current_turn.unwrap();
    game.dispatch(
        speaker,
        GameAction::Bid {
            action: BidAction::Sun,
            suit: None,
        },
        &mut rng,
    )
    .unwrap();
    assert_eq!(game.phase, Phase::Playing);

    let leader = game.current_turn.unwrap();
    game.dispatch(leader, GameAction::Play { card_index: 0 }, &mut rng)
        .unwrap();

    for viewer in 0..4u8 {
        let state = client_state(&game, viewer);
        assert_eq!(state.table_cards.len(), 1);
        assert_eq!(state.table_cards[0].played_by, rotate(leader, viewer));
    }
}

#[test]
fn match_score_is_viewer_relative() {
    let (mut game, _) = seated_game(523);
    game.match_score = [42, 17];
    let even = client_state(&game, 0);
    assert_eq!((even.match_score.us, even.match_score.them), (42, 17));
    let odd = client_state(&game, 1);
    assert_eq!((odd.match_score.us, odd.match_score.them), (17, 42));
}

#[test]
fn bidder_reference_rotates() {
    let (mut game, mut rng) = seated_game(541);
    let speaker = game.current_turn.unwrap();
    game.dispatch(
        speaker,
        GameAction::Bid {
            action: BidAction::Sun,
            suit: None,
        },
        &mut rng,
    )
    .unwrap();
    for viewer in 0..4u8 {
        let state = client_state(&game, viewer);
        assert_eq!(state.bid.bidder, Some(rotate(speaker, viewer)));
    }
}
