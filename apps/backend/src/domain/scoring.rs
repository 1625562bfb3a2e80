//! Round-end scoring: Abnat → Game-Point conversion with the
//! Kaboot / Khasara / doubling / Baloot pipeline, applied strictly in order.
//!
//! The engine is a pure function of its inputs; nothing here touches the
//! Game aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::bid::DoublingLevel;
use crate::domain::cards::GameMode;
use crate::domain::player::{opposing_team, TeamId};

/// Match target in game points.
pub const MATCH_TARGET: u16 = 152;

pub const KABOOT_SUN_GP: u16 = 44;
pub const KABOOT_HOKUM_GP: u16 = 25;
pub const BALOOT_BONUS_GP: u16 = 2;

/// Consolidated penalty table. Scattered constants in the engines were the
/// source of drift; every award/penalty below is authoritative.
pub mod penalties {
    /// GP awarded to the claiming team for a verified Akka.
    pub const VALID_AKKA_GP: u16 = 2;
    /// GP awarded to the opponents when an Akka claim is disproven.
    pub const INVALID_AKKA_GP: u16 = 5;
    /// GP awarded to the opponents when a Sawa claim is provably false.
    pub const FALSE_SAWA_GP: u16 = 2;
    /// GP awarded to the opponents when a Qayd reporter's accusation is
    /// judged innocent.
    pub const QAYD_INNOCENT_GP: u16 = 5;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundInputs {
    pub mode: GameMode,
    pub doubling: DoublingLevel,
    /// Team that last escalated the doubling ladder; loses GP ties.
    pub last_doubler: Option<TeamId>,
    pub bidder_team: TeamId,
    /// Card abnat per team, last-trick bonus already included.
    pub card_abnat: [u16; 2],
    /// Post-resolution project abnat per team.
    pub project_abnat: [u16; 2],
    /// Completed Baloot (K then Q of trump) per team.
    pub baloot_declared: [bool; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub game_points: [u16; 2],
    pub raw_abnat: [u16; 2],
    pub kaboot: Option<TeamId>,
    pub khasara: bool,
    pub mode: GameMode,
    pub doubling: DoublingLevel,
    pub bidder_team: TeamId,
}

/// Sun conversion: floor to even. `gp = q + 1` exactly when the quotient is
/// odd and a remainder exists, so the 130-abnat pool always yields 26.
fn sun_gp(abnat: u16) -> u16 {
    let q = abnat / 5;
    let r = abnat % 5;
    if q % 2 == 1 && r > 0 {
        q + 1
    } else {
        q
    }
}

/// Hokum pair conversion: per-team `q + (r > 5)`, then nudge the team with
/// the larger `raw mod 10` (tie: larger raw) until the pair sums to 16.
fn hokum_gp_pair(abnat: [u16; 2]) -> [u16; 2] {
    let mut gp = [0u16; 2];
    for team in 0..2 {
        let q = abnat[team] / 10;
        let r = abnat[team] % 10;
        gp[team] = q + u16::from(r > 5);
    }
    let sum: i32 = i32::from(gp[0]) + i32::from(gp[1]);
    let diff = 16 - sum;
    if diff != 0 {
        let adjust_team = match (abnat[0] % 10).cmp(&(abnat[1] % 10)) {
            std::cmp::Ordering::Greater => 0,
            std::cmp::Ordering::Less => 1,
            std::cmp::Ordering::Equal => {
                if abnat[0] >= abnat[1] {
                    0
                } else {
                    1
                }
            }
        };
        let adjusted = i32::from(gp[adjust_team]) + diff;
        gp[adjust_team] = adjusted.max(0) as u16;
    }
    gp
}

pub fn calculate_round(inputs: &RoundInputs) -> RoundResult {
    let bidder = inputs.bidder_team;
    let opp = opposing_team(bidder);

    let raw = [
        inputs.card_abnat[0] + inputs.project_abnat[0],
        inputs.card_abnat[1] + inputs.project_abnat[1],
    ];

    let mut khasara = false;
    let mut kaboot = None;

    // Kaboot takes precedence over everything: a swept round never reaches
    // the conversion or khasara branches.
    let mut gp = if inputs.card_abnat[opp] == 0 && inputs.card_abnat[bidder] > 0 {
        kaboot = Some(bidder);
        let mut gp = [0u16; 2];
        gp[bidder] = match inputs.mode {
            GameMode::Sun => KABOOT_SUN_GP,
            GameMode::Hokum => KABOOT_HOKUM_GP,
        };
        gp
    } else if inputs.card_abnat[bidder] == 0 && inputs.card_abnat[opp] > 0 {
        kaboot = Some(opp);
        let mut gp = [0u16; 2];
        gp[opp] = match inputs.mode {
            GameMode::Sun => KABOOT_SUN_GP,
            GameMode::Hokum => KABOOT_HOKUM_GP,
        };
        gp
    } else {
        let mut gp = match inputs.mode {
            GameMode::Sun => [sun_gp(raw[0]), sun_gp(raw[1])],
            GameMode::Hokum => hokum_gp_pair(raw),
        };

        // Khasara: the bidder must out-score the opponents or lose
        // everything to them.
        let bidder_loses = if gp[bidder] < gp[opp] {
            true
        } else if gp[bidder] == gp[opp] {
            if inputs.doubling.is_doubled() {
                // The doubler always loses the tie.
                inputs.last_doubler == Some(bidder)
            } else {
                raw[bidder] < raw[opp]
            }
        } else {
            false
        };
        if bidder_loses {
            khasara = true;
            gp[opp] += gp[bidder];
            gp[bidder] = 0;
        } else if inputs.doubling.is_doubled() && gp[opp] == gp[bidder] {
            // Doubled tie where the opponents doubled: they lose it.
            khasara = false;
            gp[bidder] += gp[opp];
            gp[opp] = 0;
        }
        gp
    };

    // Doubling: winner takes the whole pool times the level.
    if inputs.doubling.is_doubled() {
        let winner = if gp[0] >= gp[1] { 0 } else { 1 };
        let pool = gp[0] + gp[1];
        gp = [0, 0];
        gp[winner] = match inputs.doubling {
            DoublingLevel::Gahwa => MATCH_TARGET,
            level => pool * level.multiplier() as u16,
        };
    }

    // Baloot is immune to doubling: flat +2, added last.
    for team in 0..2 {
        if inputs.baloot_declared[team] {
            gp[team] += BALOOT_BONUS_GP;
        }
    }

    RoundResult {
        game_points: gp,
        raw_abnat: raw,
        kaboot,
        khasara,
        mode: inputs.mode,
        doubling: inputs.doubling,
        bidder_team: inputs.bidder_team,
    }
}
