//! End-to-end scoring scenarios with literal inputs and expected outputs.

mod common;

use baloot_backend::domain::bid::DoublingLevel;
use baloot_backend::domain::cards::GameMode;
use baloot_backend::domain::scoring::{calculate_round, RoundInputs};

fn inputs(mode: GameMode, bidder: usize, cards: [u16; 2]) -> RoundInputs {
    RoundInputs {
        mode,
        doubling: DoublingLevel::Single,
        last_doubler: None,
        bidder_team: bidder,
        card_abnat: cards,
        project_abnat: [0, 0],
        baloot_declared: [false, false],
    }
}

#[test]
fn scenario_1_sun_round_normal() {
    // Us=67, Them=63 raw: 14/12, total 26, no khasara with Us bidding.
    let result = calculate_round(&inputs(GameMode::Sun, 0, [67, 63]));
    assert_eq!(result.game_points, [14, 12]);
    assert_eq!(result.game_points[0] + result.game_points[1], 26);
    assert!(!result.khasara);
}

#[test]
fn scenario_2_hokum_exact_boundary() {
    // 81/81 raw gives 8+8=16; the pair needs no adjustment.
    let result = calculate_round(&inputs(GameMode::Hokum, 0, [81, 81]));
    assert_eq!(result.game_points, [8, 8]);
}

#[test]
fn scenario_3_hokum_kaboot() {
    let result = calculate_round(&inputs(GameMode::Hokum, 0, [162, 0]));
    assert_eq!(result.game_points, [25, 0]);
    assert_eq!(result.kaboot, Some(0));
}

#[test]
fn scenario_4_khasara_on_tied_conversion() {
    // Sun, Us bids with 60 raw against 70: both convert to 13, the raw
    // comparison sends everything to Them.
    let result = calculate_round(&inputs(GameMode::Sun, 0, [60, 70]));
    assert!(result.khasara);
    assert_eq!(result.game_points, [0, 26]);
}

#[test]
fn scenario_5_doubled_hokum_with_baloot() {
    // Us bids, Them doubled; Us=100 raw incl. declared K+Q of trump,
    // Them=62. Base 10/6, doubling takes 16×2=32, baloot adds 2 after.
    let mut i = inputs(GameMode::Hokum, 0, [100, 62]);
    i.doubling = DoublingLevel::Double;
    i.last_doubler = Some(1);
    i.baloot_declared = [true, false];
    let result = calculate_round(&i);
    assert_eq!(result.game_points, [34, 0]);
}

#[test]
fn benchmark_style_sweep_sun_totals() {
    // The conversion must hold across the whole sun pool, not just the
    // handpicked scenarios.
    for us in 1..130u16 {
        let result = calculate_round(&inputs(GameMode::Sun, 0, [us, 130 - us]));
        if !result.khasara {
            assert_eq!(
                result.game_points[0] + result.game_points[1],
                26,
                "sun split {us}/{}",
                130 - us
            );
        }
    }
}

#[test]
fn benchmark_style_sweep_hokum_totals() {
    for us in 1..162u16 {
        let result = calculate_round(&inputs(GameMode::Hokum, 0, [us, 162 - us]));
        if !result.khasara {
            assert_eq!(
                result.game_points[0] + result.game_points[1],
                16,
                "hokum split {us}/{}",
                162 - us
            );
        }
    }
}
