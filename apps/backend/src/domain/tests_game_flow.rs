//! Coordinator tests: full rounds driven through `Game::dispatch`.

use crate::domain::bidding::BidAction;
use crate::domain::game::{GameAction, GameEvent, Phase};
use crate::domain::player::next_seat;
use crate::domain::test_state_helpers::{
    buy_hokum, buy_sun, full_table, play_out_round, step_play,
};

#[test]
fn fourth_join_deals_and_opens_the_auction() {
    let (game, _) = full_table(7);
    assert_eq!(game.phase, Phase::Bidding);
    assert_eq!(game.current_turn, Some(next_seat(game.dealer)));
    assert!(game.round.floor_card.is_some());
    assert_eq!(game.round.deck.len(), 11);
    for seat in 0..4u8 {
        assert_eq!(game.player(seat).unwrap().hand.len(), 5);
    }
    assert!(game.cards_conserved());
    assert!(game.turn_flags_consistent());
}

#[test]
fn sun_buy_distributes_to_eight_cards_each() {
    let (mut game, mut r) = full_table(11);
    buy_sun(&mut game, &mut r);
    assert_eq!(game.phase, Phase::Playing);
    assert!(game.round.bid.settled());
    assert!(game.round.floor_card.is_none());
    assert!(game.round.deck.is_empty());
    for seat in 0..4u8 {
        assert_eq!(game.player(seat).unwrap().hand.len(), 8);
    }
    assert!(game.cards_conserved());
}

#[test]
fn playing_phase_always_has_a_settled_contract() {
    let (mut game, mut r) = full_table(13);
    buy_sun(&mut game, &mut r);
    while game.phase == Phase::Playing {
        assert!(game.round.bid.mode.is_some());
        assert!(game.round.bid.bidder.is_some());
        step_play(&mut game, &mut r);
    }
}

#[test]
fn full_round_reaches_round_over_or_game_over() {
    let (mut game, mut r) = full_table(17);
    buy_sun(&mut game, &mut r);
    play_out_round(&mut game, &mut r);
    assert!(matches!(game.phase, Phase::RoundOver | Phase::GameOver));
    assert_eq!(game.round.tricks.len(), 8);
    assert_eq!(game.round_history.len(), 1);
    let result = &game.round_history[0];
    assert_eq!(
        game.match_score[0] + game.match_score[1],
        result.game_points[0] + result.game_points[1]
    );
}

#[test]
fn round_end_bumps_epoch_and_drops_turn() {
    let (mut game, mut r) = full_table(19);
    let before = game.epoch;
    buy_sun(&mut game, &mut r);
    play_out_round(&mut game, &mut r);
    assert!(game.epoch > before);
    assert_eq!(game.current_turn, None);
    assert!(game.turn_flags_consistent());
}

#[test]
fn gash_redeals_with_rotated_dealer() {
    let (mut game, mut r) = full_table(23);
    let dealer_before = game.dealer;
    let mut redealt = false;
    for _ in 0..8 {
        let speaker = game.current_turn.unwrap();
        let events = game
            .dispatch(
                speaker,
                GameAction::Bid {
                    action: BidAction::Pass,
                    suit: None,
                },
                &mut r,
            )
            .unwrap();
        if events.iter().any(|e| matches!(e, GameEvent::Redeal)) {
            redealt = true;
            break;
        }
    }
    assert!(redealt, "eight passes must force a redeal");
    assert_eq!(game.dealer, next_seat(dealer_before));
    assert_eq!(game.phase, Phase::Bidding);
    assert!(game.cards_conserved());
}

#[test]
fn hokum_double_locks_the_round() {
    let (mut game, mut r) = full_table(29);
    let (bidder, trump) = buy_hokum(&mut game, &mut r);
    assert_eq!(game.trump(), Some(trump));

    // A defender doubles before the first card.
    let defender = next_seat(bidder);
    game.dispatch(defender, GameAction::Double, &mut r).unwrap();
    assert!(game.round.is_locked);
    assert!(game.round.bid.doubling.is_doubled());

    // The same team cannot escalate twice in a row.
    let partner_of_defender = next_seat(next_seat(defender));
    assert!(game
        .dispatch(partner_of_defender, GameAction::Double, &mut r)
        .is_err());
}

#[test]
fn doubling_window_closes_at_first_card() {
    let (mut game, mut r) = full_table(31);
    let (bidder, _) = buy_hokum(&mut game, &mut r);
    step_play(&mut game, &mut r);
    let defender = next_seat(bidder);
    assert!(game.dispatch(defender, GameAction::Double, &mut r).is_err());
}

#[test]
fn next_round_rotates_dealer_and_redeals() {
    let (mut game, mut r) = full_table(37);
    let dealer_before = game.dealer;
    buy_sun(&mut game, &mut r);
    play_out_round(&mut game, &mut r);
    if game.phase == Phase::RoundOver {
        game.dispatch(0, GameAction::NextRound, &mut r).unwrap();
        assert_eq!(game.phase, Phase::Bidding);
        assert_eq!(game.dealer, next_seat(dealer_before));
        assert!(game.cards_conserved());
    }
}

#[test]
fn wrong_phase_actions_are_rejected_without_mutation() {
    let (mut game, mut r) = full_table(41);
    let snapshot = game.clone();
    let speaker = game.current_turn.unwrap();
    let err = game.dispatch(speaker, GameAction::Play { card_index: 0 }, &mut r);
    assert!(err.is_err());
    assert_eq!(game, snapshot);
}

#[test]
fn off_turn_play_is_rejected() {
    let (mut game, mut r) = full_table(43);
    buy_sun(&mut game, &mut r);
    let turn = game.current_turn.unwrap();
    let off_turn = next_seat(turn);
    let err = game.dispatch(off_turn, GameAction::Play { card_index: 0 }, &mut r);
    assert!(err.is_err());
}

#[test]
fn trick_transition_blocks_play_until_cleared() {
    let (mut game, mut r) = full_table(47);
    buy_sun(&mut game, &mut r);
    for _ in 0..4 {
        step_play(&mut game, &mut r);
    }
    assert!(game.round.trick_transitioning);
    let winner = game.current_turn.unwrap();
    let err = game.dispatch(winner, GameAction::Play { card_index: 0 }, &mut r);
    assert!(err.is_err());
    game.clear_trick_transition();
    let legal = game.legal_plays_for(winner);
    assert!(!legal.is_empty());
}

#[test]
fn match_ends_when_a_team_crosses_152() {
    let (mut game, mut r) = full_table(53);
    game.match_score = [150, 150];
    buy_sun(&mut game, &mut r);
    play_out_round(&mut game, &mut r);
    let [us, them] = game.match_score;
    if us.max(them) >= 152 && us != them {
        assert_eq!(game.phase, Phase::GameOver);
    } else {
        // Dead-even totals keep the match alive.
        assert_eq!(game.phase, Phase::RoundOver);
    }
}

#[test]
fn update_settings_validates_turn_duration() {
    let (mut game, mut r) = full_table(59);
    let mut settings = game.settings.clone();
    settings.turn_duration = 0;
    assert!(game
        .dispatch(0, GameAction::UpdateSettings { settings }, &mut r)
        .is_err());

    let mut settings = game.settings.clone();
    settings.turn_duration = 45;
    game.dispatch(0, GameAction::UpdateSettings { settings }, &mut r)
        .unwrap();
    assert_eq!(game.settings.turn_duration, 45);
}

#[test]
fn rejoin_with_same_identity_rebinds_seat() {
    let (mut game, mut r) = full_table(61);
    let (seat, events) = game.join("aziz", Some("aziz"), None, &mut r).unwrap();
    assert_eq!(seat, 0);
    assert!(events.is_empty());
    assert_eq!(game.seated_count(), 4);
}

#[test]
fn fifth_join_with_new_identity_is_rejected() {
    let (mut game, mut r) = full_table(67);
    assert!(game.join("ehsan", Some("ehsan"), None, &mut r).is_err());
}
