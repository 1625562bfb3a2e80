//! Property-based tests for the scoring pipeline.

use proptest::prelude::*;

use crate::domain::bid::DoublingLevel;
use crate::domain::cards::GameMode;
use crate::domain::scoring::{
    calculate_round, RoundInputs, BALOOT_BONUS_GP, KABOOT_HOKUM_GP, KABOOT_SUN_GP,
};
use crate::domain::{test_gens, test_prelude};

fn inputs(mode: GameMode, cards: [u16; 2]) -> RoundInputs {
    RoundInputs {
        mode,
        doubling: DoublingLevel::Single,
        last_doubler: None,
        bidder_team: 0,
        card_abnat: cards,
        project_abnat: [0, 0],
        baloot_declared: [false, false],
    }
}

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Sun pool conversion always totals 26 GP when both teams took cards.
    #[test]
    fn prop_sun_pool_is_26(split in test_gens::abnat_split(GameMode::Sun)) {
        prop_assume!(split[0] > 0 && split[1] > 0);
        let result = calculate_round(&inputs(GameMode::Sun, split));
        prop_assert_eq!(result.game_points[0] + result.game_points[1], 26);
    }

    /// Hokum pool conversion always totals 16 GP when both teams took cards.
    #[test]
    fn prop_hokum_pool_is_16(split in test_gens::abnat_split(GameMode::Hokum)) {
        prop_assume!(split[0] > 0 && split[1] > 0);
        let result = calculate_round(&inputs(GameMode::Hokum, split));
        prop_assert_eq!(result.game_points[0] + result.game_points[1], 16);
    }

    /// A swept opponent means the fixed kaboot award replaces conversion.
    #[test]
    fn prop_kaboot_overrides(mode in test_gens::mode(), sweeper in 0usize..2) {
        let pool = match mode { GameMode::Sun => 130, GameMode::Hokum => 162 };
        let mut cards = [0u16; 2];
        cards[sweeper] = pool;
        let result = calculate_round(&inputs(mode, cards));
        let expected = match mode {
            GameMode::Sun => KABOOT_SUN_GP,
            GameMode::Hokum => KABOOT_HOKUM_GP,
        };
        prop_assert_eq!(result.game_points[sweeper], expected);
        prop_assert_eq!(result.game_points[1 - sweeper], 0);
        prop_assert_eq!(result.kaboot, Some(sweeper));
    }

    /// Khasara: a bidder converting below the opponents ends with zero.
    #[test]
    fn prop_khasara_strips_bidder(
        mode in test_gens::mode(),
        split in (1u16..60).prop_map(|us| us),
    ) {
        let pool: u16 = match mode { GameMode::Sun => 130, GameMode::Hokum => 162 };
        let cards = [split, pool - split];
        prop_assume!(cards[1] > 0);
        let result = calculate_round(&inputs(mode, cards));
        if result.khasara {
            prop_assert_eq!(result.game_points[0], 0);
        }
        // An undoubled round never leaves the bidder strictly behind: either
        // the split stood or khasara moved everything to the opponents.
        if result.game_points[0] < result.game_points[1] {
            prop_assert!(result.khasara);
        }
    }

    /// Baloot contributes exactly +2 under every doubling level.
    #[test]
    fn prop_baloot_immune_to_doubling(
        level in proptest::sample::select(vec![
            DoublingLevel::Single,
            DoublingLevel::Double,
            DoublingLevel::Khamsin,
            DoublingLevel::Rabaa,
        ]),
        split in test_gens::abnat_split(GameMode::Hokum),
    ) {
        prop_assume!(split[0] > 0 && split[1] > 0);
        let mut with = inputs(GameMode::Hokum, split);
        with.doubling = level;
        with.last_doubler = level.is_doubled().then_some(1);
        with.baloot_declared = [true, false];
        let mut without = with.clone();
        without.baloot_declared = [false, false];

        let a = calculate_round(&with);
        let b = calculate_round(&without);
        prop_assert_eq!(
            a.game_points[0],
            b.game_points[0] + BALOOT_BONUS_GP,
            "baloot must add exactly {} GP regardless of doubling", BALOOT_BONUS_GP
        );
    }

    /// Doubled rounds always produce a shut-out: one team gets everything.
    #[test]
    fn prop_doubled_rounds_are_winner_take_all(
        split in test_gens::abnat_split(GameMode::Hokum),
        doubler in 0usize..2,
    ) {
        prop_assume!(split[0] > 0 && split[1] > 0);
        let mut i = inputs(GameMode::Hokum, split);
        i.doubling = DoublingLevel::Double;
        i.last_doubler = Some(doubler);
        let result = calculate_round(&i);
        prop_assert!(result.game_points[0] == 0 || result.game_points[1] == 0);
    }
}
