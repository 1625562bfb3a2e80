//! Per-seat rotated client state.
//!
//! Client payloads transform absolute seat indices so the recipient always
//! sits at Bottom (index 0): every position reference is rotated by
//! `(server − viewer + 4) mod 4`. Other seats' hands collapse to counts.

use serde::{Deserialize, Serialize};

use crate::domain::baloot_call::BalootPhase;
use crate::domain::bid::DoublingLevel;
use crate::domain::cards::{Card, GameMode, Suit};
use crate::domain::game::{Game, Phase};
use crate::domain::player::{team_of, GameSettings, Position, Seat, SEATS};
use crate::domain::projects::Project;
use crate::domain::qayd::{QaydStage, QaydVerdict, ViolationKind};

pub fn rotate(server_idx: Seat, viewer: Seat) -> u8 {
    (server_idx + SEATS as u8 - viewer) % SEATS as u8
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPlayer {
    pub name: String,
    pub is_bot: bool,
    pub position: Position,
    pub card_count: usize,
    /// Present only for the viewer's own seat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    pub is_active_turn: bool,
    pub is_dealer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
    pub connected: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBid {
    pub mode: Option<GameMode>,
    pub trump_suit: Option<Suit>,
    /// Rotated seat of the bidder.
    pub bidder: Option<u8>,
    pub is_ashkal: bool,
    pub doubling_level: DoublingLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTablePlay {
    pub card: Card,
    pub played_by: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTrick {
    pub cards: Vec<ClientTablePlay>,
    pub winner: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScore {
    pub us: u16,
    pub them: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAkka {
    pub claimer: u8,
    pub suit: Suit,
    pub valid: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSawa {
    pub claimer: u8,
    /// Responses keyed by rotated seat.
    pub responses: Vec<Option<bool>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQayd {
    pub stage: QaydStage,
    pub reporter: Option<u8>,
    pub violation: Option<ViolationKind>,
    pub verdict: Option<QaydVerdict>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBaloot {
    pub owner: u8,
    pub phase: BalootPhase,
}

/// Full game state as seen from one seat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientGameState {
    pub room_id: String,
    pub phase: Phase,
    pub players: Vec<ClientPlayer>,
    pub current_turn_index: Option<u8>,
    pub dealer_index: u8,
    pub bid: ClientBid,
    pub table_cards: Vec<ClientTablePlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trick: Option<ClientTrick>,
    pub tricks_played: usize,
    pub trick_transitioning: bool,
    /// Match totals, viewer's team first.
    pub match_score: ClientScore,
    /// Current-round abnat, viewer's team first.
    pub round_abnat: ClientScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_card: Option<Card>,
    /// Projects still declarable by the viewer.
    pub my_projects: Vec<Project>,
    /// Declarations keyed by rotated seat, populated once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarations: Option<Vec<Vec<Project>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub akka_state: Option<ClientAkka>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sawa_state: Option<ClientSawa>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qayd_state: Option<ClientQayd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baloot_state: Option<ClientBaloot>,
    pub is_locked: bool,
    pub settings: GameSettings,
}

/// Build the rotated state for `viewer`.
pub fn client_state(game: &Game, viewer: Seat) -> ClientGameState {
    let rot = |s: Seat| rotate(s, viewer);
    let my_team = team_of(viewer);
    let their_team = 1 - my_team;

    let mut players = Vec::with_capacity(SEATS);
    for offset in 0..SEATS as u8 {
        let server_idx = (viewer + offset) % SEATS as u8;
        let player = game.player(server_idx);
        players.push(match player {
            Some(p) => ClientPlayer {
                name: p.name.clone(),
                is_bot: p.is_bot,
                position: Position::of(offset),
                card_count: p.hand.len(),
                hand: (offset == 0).then(|| p.hand.clone()),
                is_active_turn: p.is_active_turn,
                is_dealer: p.is_dealer,
                last_action: p.last_action.clone(),
                connected: p.connected,
            },
            None => ClientPlayer {
                name: String::new(),
                is_bot: false,
                position: Position::of(offset),
                card_count: 0,
                hand: None,
                is_active_turn: false,
                is_dealer: false,
                last_action: None,
                connected: false,
            },
        });
    }

    let table_cards = game
        .round
        .table
        .iter()
        .map(|p| ClientTablePlay {
            card: p.card,
            played_by: rot(p.played_by),
        })
        .collect();

    let last_trick = game.round.tricks.last().map(|t| ClientTrick {
        cards: t
            .plays
            .iter()
            .map(|p| ClientTablePlay {
                card: p.card,
                played_by: rot(p.played_by),
            })
            .collect(),
        winner: rot(t.winner),
    });

    let declarations = game.round.projects.resolved.as_ref().map(|resolved| {
        (0..SEATS as u8)
            .map(|offset| resolved[((viewer + offset) % SEATS as u8) as usize].clone())
            .collect()
    });

    let akka_state = game
        .round
        .akka
        .claims
        .iter()
        .enumerate()
        .rev()
        .find_map(|(seat, claim)| {
            claim.map(|c| ClientAkka {
                claimer: rot(seat as Seat),
                suit: c.suit,
                valid: c.valid,
            })
        });

    let sawa_state = game.round.sawa.pending.as_ref().map(|claim| ClientSawa {
        claimer: rot(claim.claimer),
        responses: (0..SEATS as u8)
            .map(|offset| claim.responses[((viewer + offset) % SEATS as u8) as usize])
            .collect(),
    });

    let qayd_state = (game.round.qayd.stage != QaydStage::Idle).then(|| ClientQayd {
        stage: game.round.qayd.stage,
        reporter: game.round.qayd.reporter.map(rot),
        violation: game.round.qayd.violation,
        verdict: game.round.qayd.verdict,
    });

    let baloot_state = game.round.baloot.progress.map(|p| ClientBaloot {
        owner: rot(p.owner),
        phase: p.phase,
    });

    ClientGameState {
        room_id: game.room_id.clone(),
        phase: game.phase,
        players,
        current_turn_index: game.current_turn.map(rot),
        dealer_index: rot(game.dealer),
        bid: ClientBid {
            mode: game.round.bid.mode,
            trump_suit: game.round.bid.trump,
            bidder: game.round.bid.bidder.map(rot),
            is_ashkal: game.round.bid.is_ashkal,
            doubling_level: game.round.bid.doubling,
        },
        table_cards,
        last_trick,
        tricks_played: game.round.tricks.len(),
        trick_transitioning: game.round.trick_transitioning,
        match_score: ClientScore {
            us: game.match_score[my_team],
            them: game.match_score[their_team],
        },
        round_abnat: ClientScore {
            us: game.round.card_abnat[my_team],
            them: game.round.card_abnat[their_team],
        },
        floor_card: game.round.floor_card,
        my_projects: game.round.projects.available[viewer as usize].clone(),
        declarations,
        akka_state,
        sawa_state,
        qayd_state,
        baloot_state,
        is_locked: game.round.is_locked,
        settings: game.settings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_puts_viewer_at_bottom() {
        for viewer in 0..4u8 {
            assert_eq!(rotate(viewer, viewer), 0);
        }
        assert_eq!(rotate(2, 1), 1);
        assert_eq!(rotate(0, 3), 1);
        assert_eq!(rotate(3, 1), 2);
    }

    #[test]
    fn rotation_is_a_bijection_per_viewer() {
        for viewer in 0..4u8 {
            let mut seen: Vec<u8> = (0..4).map(|s| rotate(s, viewer)).collect();
            seen.sort();
            assert_eq!(seen, vec![0, 1, 2, 3]);
        }
    }
}
