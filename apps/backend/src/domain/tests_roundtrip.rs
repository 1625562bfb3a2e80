//! Serialization round-trip: `decode(encode(G))` must equal G on all
//! observable state, in every phase and with every sub-engine mid-flight.

use crate::domain::game::{Game, GameAction, Phase};
use crate::domain::qayd::QaydStage;
use crate::domain::test_state_helpers::{buy_hokum, buy_sun, full_table, play_out_round, step_play};

fn assert_round_trips(game: &Game) {
    let encoded = serde_json::to_string(game).expect("game must serialize");
    let decoded: Game = serde_json::from_str(&encoded).expect("game must deserialize");
    assert_eq!(&decoded, game);
    // And a second pass produces byte-identical JSON.
    let re_encoded = serde_json::to_string(&decoded).unwrap();
    assert_eq!(encoded, re_encoded);
}

#[test]
fn waiting_room_round_trips() {
    let game = Game::new("empty-room");
    assert_round_trips(&game);
}

#[test]
fn mid_bidding_round_trips() {
    let (game, _) = full_table(101);
    assert_eq!(game.phase, Phase::Bidding);
    assert_round_trips(&game);
}

#[test]
fn mid_trick_round_trips() {
    let (mut game, mut r) = full_table(103);
    buy_sun(&mut game, &mut r);
    step_play(&mut game, &mut r);
    step_play(&mut game, &mut r);
    assert_eq!(game.round.table.len(), 2);
    assert_round_trips(&game);
}

#[test]
fn hokum_with_projects_and_baloot_round_trips() {
    let (mut game, mut r) = full_table(107);
    buy_hokum(&mut game, &mut r);
    // A few tricks in, sub-engine state is live.
    for _ in 0..6 {
        step_play(&mut game, &mut r);
    }
    assert_round_trips(&game);
}

#[test]
fn sawa_pending_round_trips() {
    let (mut game, mut r) = full_table(109);
    buy_sun(&mut game, &mut r);
    let claimer = game.current_turn.unwrap();
    game.dispatch(claimer, GameAction::SawaClaim, &mut r)
        .unwrap();
    assert!(game.round.sawa.pending.is_some());
    assert_round_trips(&game);
}

#[test]
fn qayd_active_round_trips() {
    let (mut game, mut r) = full_table(113);
    buy_sun(&mut game, &mut r);
    // Complete one trick so there is history to challenge.
    for _ in 0..4 {
        step_play(&mut game, &mut r);
    }
    game.clear_trick_transition();
    let turn = game.current_turn.unwrap();
    let reporter = (turn + 1) % 4;
    game.dispatch(reporter, GameAction::QaydStart, &mut r)
        .unwrap();
    assert_eq!(game.phase, Phase::QaydActive);
    assert_eq!(game.round.qayd.stage, QaydStage::ReporterChoosing);
    assert_round_trips(&game);
}

#[test]
fn round_over_round_trips() {
    let (mut game, mut r) = full_table(127);
    buy_sun(&mut game, &mut r);
    play_out_round(&mut game, &mut r);
    assert_round_trips(&game);
}

#[test]
fn decoded_game_preserves_invariants() {
    let (mut game, mut r) = full_table(131);
    buy_hokum(&mut game, &mut r);
    for _ in 0..5 {
        step_play(&mut game, &mut r);
    }
    let decoded: Game =
        serde_json::from_str(&serde_json::to_string(&game).unwrap()).unwrap();
    assert!(decoded.cards_conserved());
    assert!(decoded.turn_flags_consistent());
    assert_eq!(decoded.epoch, game.epoch);
    assert_eq!(decoded.current_turn, game.current_turn);
}
