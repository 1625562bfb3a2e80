//! The Game aggregate and per-room coordinator.
//!
//! All mutation enters through [`Game::dispatch`], which inspects the
//! current phase, delegates to the sub-engines, and returns the effects the
//! service layer must perform (broadcasts, timers, bot scheduling). Sub-
//! engines are plain state structs keyed into the round; every mutation
//! takes the game as the explicit parameter, so serialization is plain
//! serde.

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::akka::AkkaState;
use crate::domain::baloot_call::{BalootPhase, BalootState};
use crate::domain::bid::{Bid, DoublingLevel};
use crate::domain::bidding::{apply_bid, BidAction, BidOutcome, BiddingState};
use crate::domain::cards::{full_deck, sort_hand, Card, GameMode, Suit};
use crate::domain::player::{
    next_seat, opposing_team, partner, team_of, BotDifficulty, GameSettings, Player, Seat, TeamId,
    SEATS,
};
use crate::domain::projects::{resolve_project_conflicts, ProjectState};
use crate::domain::qayd::{QaydCardRef, QaydRole, QaydState, QaydVerdict, ViolationKind};
use crate::domain::rules::{
    self, CompletedTrick, TablePlay, LAST_TRICK_BONUS, TRICKS_PER_ROUND,
};
use crate::domain::sawa::{claim_is_sound, SawaOutcome, SawaState};
use crate::domain::scoring::{
    calculate_round, penalties, RoundInputs, RoundResult, MATCH_TARGET,
};
use crate::errors::domain::DomainError;

pub const ROUND_RESTART_DELAY_MS: u64 = 1500;
pub const TRICK_TRANSITION_DELAY_MS: u64 = 1000;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Bidding,
    Playing,
    RoundOver,
    GameOver,
    QaydActive,
}

/// Current round state, re-created at every round start. Sub-engine state
/// lives here and is persisted through Game serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Undealt remainder of the deck (11 cards during the auction).
    pub deck: Vec<Card>,
    /// Face-up 21st card; consumed at distribution.
    pub floor_card: Option<Card>,
    pub bidding: BiddingState,
    pub bid: Bid,
    pub tricks: Vec<CompletedTrick>,
    pub table: Vec<TablePlay>,
    #[serde(default)]
    pub trick_transitioning: bool,
    pub card_abnat: [u16; 2],
    /// Akka/Sawa/Qayd awards applied after the scoring pipeline.
    #[serde(default)]
    pub bonus_gp: [u16; 2],
    pub projects: ProjectState,
    pub akka: AkkaState,
    pub sawa: SawaState,
    pub baloot: BalootState,
    pub qayd: QaydState,
    #[serde(default)]
    pub qayd_guilty_team: Option<TeamId>,
    /// Doubled Hokum: no further bid escalation, over-trump waived.
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub last_doubler: Option<TeamId>,
}

impl RoundState {
    fn empty(dealer: Seat) -> Self {
        RoundState {
            deck: Vec::new(),
            floor_card: None,
            bidding: BiddingState::new(dealer),
            bid: Bid::default(),
            tricks: Vec::new(),
            table: Vec::new(),
            trick_transitioning: false,
            card_abnat: [0, 0],
            bonus_gp: [0, 0],
            projects: ProjectState::default(),
            akka: AkkaState::default(),
            sawa: SawaState::default(),
            baloot: BalootState::default(),
            qayd: QaydState::default(),
            qayd_guilty_team: None,
            is_locked: false,
            last_doubler: None,
        }
    }

    /// Every card that has hit the table this round, in play order.
    pub fn played_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .tricks
            .iter()
            .flat_map(|t| t.plays.iter().map(|p| p.card))
            .collect();
        cards.extend(self.table.iter().map(|p| p.card));
        cards
    }
}

/// Domain-level action, already schema-validated by the wire layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Play {
        card_index: usize,
    },
    Bid {
        action: BidAction,
        suit: Option<Suit>,
    },
    Double,
    Akka {
        suit: Suit,
    },
    SawaClaim,
    SawaResponse {
        accept: bool,
    },
    DeclareProject {
        project_ref: usize,
    },
    NextRound,
    QaydStart,
    QaydSelectViolation {
        kind: ViolationKind,
    },
    QaydSelectCard {
        role: QaydRole,
        card_ref: QaydCardRef,
    },
    QaydConfirm,
    QaydCancel,
    UpdateSettings {
        settings: GameSettings,
    },
}

impl GameAction {
    /// Actions a seat may take while not holding the turn.
    pub fn allowed_off_turn(&self) -> bool {
        matches!(
            self,
            GameAction::Double
                | GameAction::SawaResponse { .. }
                | GameAction::NextRound
                | GameAction::QaydStart
                | GameAction::QaydSelectViolation { .. }
                | GameAction::QaydSelectCard { .. }
                | GameAction::QaydConfirm
                | GameAction::QaydCancel
                | GameAction::UpdateSettings { .. }
        )
    }
}

/// Effects for the service layer. The domain never talks to sockets,
/// timers or Redis directly.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The turn moved to a seat (edge-triggered).
    TurnChanged { seat: Seat },
    PhaseChanged { phase: Phase },
    /// First entry into Playing for a round.
    RoundStarted,
    TrickCompleted { winner: Seat },
    ProjectsRevealed,
    BalootAnnounced { seat: Seat, phase: BalootPhase },
    AkkaResolved { seat: Seat, valid: bool },
    SawaWindowOpened { claimer: Seat },
    SawaResolved { accepted: bool },
    QaydOpened { reporter: Seat },
    QaydClosed { verdict: Option<QaydVerdict> },
    RoundFinished { result: RoundResult },
    MatchFinished { winner: TeamId },
    /// Redeal after Gash or Kawesh.
    Redeal,
    /// Ask the scheduler to restart the round after the standard delay.
    ScheduleRestart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub room_id: String,
    pub seats: [Option<Player>; 4],
    pub phase: Phase,
    pub current_turn: Option<Seat>,
    pub dealer: Seat,
    pub settings: GameSettings,
    pub match_score: [u16; 2],
    pub round: RoundState,
    pub round_history: Vec<RoundResult>,
    /// Incremented whenever a round ends or a redeal happens; scheduled
    /// callbacks verify it before mutating.
    pub epoch: u64,
    /// Incremented on every turn handoff; turn timers verify it so a
    /// stale countdown can never act for a later visit of the same seat.
    #[serde(default)]
    pub turn_seq: u64,
}

impl Game {
    pub fn new(room_id: impl Into<String>) -> Self {
        Game {
            room_id: room_id.into(),
            seats: Default::default(),
            phase: Phase::Waiting,
            current_turn: None,
            dealer: 0,
            settings: GameSettings::default(),
            match_score: [0, 0],
            round: RoundState::empty(0),
            round_history: Vec::new(),
            epoch: 0,
            turn_seq: 0,
        }
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.seats.get(seat as usize).and_then(|p| p.as_ref())
    }

    pub fn seated_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_bot(&self, seat: Seat) -> bool {
        self.player(seat).map(|p| p.is_bot).unwrap_or(false)
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.round.bid.mode
    }

    pub fn trump(&self) -> Option<Suit> {
        self.round.bid.trump
    }

    /// Seat a player. Fills the lowest free seat; on the fourth join the
    /// match starts and the first auction is dealt.
    pub fn join(
        &mut self,
        name: &str,
        identity: Option<&str>,
        bot: Option<BotDifficulty>,
        rng: &mut dyn RngCore,
    ) -> Result<(Seat, Vec<GameEvent>), DomainError> {
        // Reconnect: an existing seat with the same identity rebinds.
        if let Some(id) = identity {
            for (i, slot) in self.seats.iter_mut().enumerate() {
                if let Some(p) = slot {
                    if p.identity.as_deref() == Some(id) {
                        p.connected = true;
                        p.name = name.to_string();
                        return Ok((i as Seat, Vec::new()));
                    }
                }
            }
        }
        let Some(free) = self.seats.iter().position(|s| s.is_none()) else {
            return Err(DomainError::validation("room is full"));
        };
        let player = match bot {
            Some(difficulty) => Player::bot(name, difficulty),
            None => {
                let mut p = Player::human(name);
                p.identity = identity.map(str::to_string);
                p
            }
        };
        self.seats[free] = Some(player);

        let mut events = Vec::new();
        if self.seated_count() == SEATS && self.phase == Phase::Waiting {
            events.extend(self.start_round(rng));
        }
        Ok((free as Seat, events))
    }

    /// Deal a fresh auction: 5 cards per seat, the 21st face-up as floor,
    /// 11 held back for distribution.
    fn start_round(&mut self, rng: &mut dyn RngCore) -> Vec<GameEvent> {
        let mut deck = full_deck();
        deck.shuffle(rng);

        self.round = RoundState::empty(self.dealer);
        for slot in self.seats.iter_mut().flatten() {
            slot.hand.clear();
            slot.is_dealer = false;
            slot.last_action = None;
        }
        for seat in 0..SEATS {
            let hand: Vec<Card> = deck.drain(..5).collect();
            if let Some(p) = &mut self.seats[seat] {
                p.hand = hand;
                sort_hand(&mut p.hand, GameMode::Sun, None);
            }
        }
        self.round.floor_card = Some(deck.remove(0));
        self.round.deck = deck;
        if let Some(p) = &mut self.seats[self.dealer as usize] {
            p.is_dealer = true;
        }

        self.phase = Phase::Bidding;
        self.set_turn(Some(self.round.bidding.speaker));
        vec![
            GameEvent::PhaseChanged {
                phase: Phase::Bidding,
            },
            GameEvent::TurnChanged {
                seat: self.round.bidding.speaker,
            },
        ]
    }

    /// Single mutation entry point: phase gate, turn gate, dispatch.
    pub fn dispatch(
        &mut self,
        seat: Seat,
        action: GameAction,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<GameEvent>, DomainError> {
        if self.player(seat).is_none() {
            return Err(DomainError::validation("seat is empty"));
        }
        if self.current_turn != Some(seat) && !action.allowed_off_turn() {
            return Err(DomainError::not_your_turn("another seat holds the turn"));
        }

        let before_turn = self.current_turn;
        let mut events = match (&self.phase, action) {
            (Phase::Bidding, GameAction::Bid { action, suit }) => {
                self.handle_bid(seat, action, suit, rng)?
            }
            (Phase::Bidding, GameAction::Double) | (Phase::Playing, GameAction::Double) => {
                self.handle_double(seat)?
            }
            (Phase::Playing, GameAction::Play { card_index }) => {
                self.handle_play(seat, card_index)?
            }
            (Phase::Playing, GameAction::Akka { suit }) => self.handle_akka(seat, suit)?,
            (Phase::Playing, GameAction::SawaClaim) => self.handle_sawa_claim(seat)?,
            (Phase::Playing, GameAction::SawaResponse { accept }) => {
                self.handle_sawa_response(seat, accept)?
            }
            (Phase::Playing, GameAction::DeclareProject { project_ref }) => {
                self.handle_declare_project(seat, project_ref)?
            }
            (Phase::Playing, GameAction::QaydStart) => self.handle_qayd_start(seat)?,
            (Phase::QaydActive, GameAction::QaydSelectViolation { kind }) => {
                let mode = self.require_mode()?;
                self.round.qayd.select_violation(seat, kind, mode)?;
                Vec::new()
            }
            (Phase::QaydActive, GameAction::QaydSelectCard { role, card_ref }) => {
                self.round
                    .qayd
                    .select_card(seat, role, card_ref, &self.round.tricks)?;
                Vec::new()
            }
            (Phase::QaydActive, GameAction::QaydConfirm) => self.handle_qayd_confirm(seat)?,
            (Phase::QaydActive, GameAction::QaydCancel) => {
                self.round.qayd.cancel(seat)?;
                self.resume_from_qayd(None, None, None)
            }
            (Phase::RoundOver, GameAction::NextRound) => self.advance_round(rng)?,
            (_, GameAction::UpdateSettings { settings }) => {
                self.handle_update_settings(settings)?
            }
            (phase, _) => {
                return Err(DomainError::wrong_phase(format!(
                    "action not accepted in {phase:?}"
                )))
            }
        };

        // Edge-triggered turn notification for the scheduler.
        if let Some(after) = self.current_turn {
            if before_turn != Some(after) && !events.iter().any(|e| matches!(e, GameEvent::TurnChanged { .. })) {
                events.push(GameEvent::TurnChanged { seat: after });
            }
        }
        Ok(events)
    }

    fn require_mode(&self) -> Result<GameMode, DomainError> {
        self.round
            .bid
            .mode
            .ok_or_else(|| DomainError::wrong_phase("no contract settled"))
    }

    fn set_turn(&mut self, seat: Option<Seat>) {
        self.turn_seq += 1;
        self.current_turn = seat;
        for (i, slot) in self.seats.iter_mut().enumerate() {
            if let Some(p) = slot {
                p.is_active_turn = seat == Some(i as Seat);
            }
        }
    }

    // ---- Bidding -----------------------------------------------------

    fn handle_bid(
        &mut self,
        seat: Seat,
        action: BidAction,
        suit: Option<Suit>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<GameEvent>, DomainError> {
        let floor_suit = self
            .round
            .floor_card
            .map(|c| c.suit)
            .ok_or_else(|| DomainError::wrong_phase("no floor card on the table"))?;
        let hand: Vec<Card> = self
            .player(seat)
            .map(|p| p.hand.clone())
            .unwrap_or_default();
        let dealer = self.dealer;
        let strict = self.settings.strict_mode;

        let outcome = apply_bid(
            &mut self.round.bidding,
            seat,
            action,
            suit,
            floor_suit,
            dealer,
            &hand,
            strict,
        )?;
        if let Some(p) = &mut self.seats[seat as usize] {
            p.last_action = Some(format!("{action:?}"));
        }

        match outcome {
            BidOutcome::Continue { next_speaker } => {
                self.set_turn(Some(next_speaker));
                Ok(vec![GameEvent::TurnChanged { seat: next_speaker }])
            }
            BidOutcome::Settled {
                bidder,
                mode,
                trump,
                is_ashkal,
            } => Ok(self.settle_contract(bidder, mode, trump, is_ashkal)),
            BidOutcome::Gash => {
                self.dealer = next_seat(self.dealer);
                self.epoch += 1;
                let mut events = vec![GameEvent::Redeal];
                events.extend(self.start_round(rng));
                Ok(events)
            }
            BidOutcome::Kawesh => {
                self.epoch += 1;
                let mut events = vec![GameEvent::Redeal];
                events.extend(self.start_round(rng));
                Ok(events)
            }
        }
    }

    /// Distribute the floor card and the held-back 11 so every seat has 8,
    /// then enter Playing with first-after-dealer leading.
    fn settle_contract(
        &mut self,
        bidder: Seat,
        mode: GameMode,
        trump: Option<Suit>,
        is_ashkal: bool,
    ) -> Vec<GameEvent> {
        let receiver = if is_ashkal { partner(bidder) } else { bidder };
        if let Some(floor) = self.round.floor_card.take() {
            if let Some(p) = &mut self.seats[receiver as usize] {
                p.hand.push(floor);
            }
        }
        for seat in 0..SEATS as u8 {
            let take = if seat == receiver { 2 } else { 3 };
            let cards: Vec<Card> = self.round.deck.drain(..take).collect();
            if let Some(p) = &mut self.seats[seat as usize] {
                p.hand.extend(cards);
                sort_hand(&mut p.hand, mode, trump);
            }
        }

        self.round.bid = Bid {
            mode: Some(mode),
            trump,
            bidder: Some(bidder),
            is_ashkal,
            doubling: DoublingLevel::Single,
        };

        let hands = [
            self.seats[0].as_ref().map(|p| p.hand.as_slice()).unwrap_or(&[]),
            self.seats[1].as_ref().map(|p| p.hand.as_slice()).unwrap_or(&[]),
            self.seats[2].as_ref().map(|p| p.hand.as_slice()).unwrap_or(&[]),
            self.seats[3].as_ref().map(|p| p.hand.as_slice()).unwrap_or(&[]),
        ];
        self.round.projects = ProjectState::on_deal(hands, mode);
        if let (GameMode::Hokum, Some(t)) = (mode, trump) {
            self.round.baloot =
                BalootState::on_deal(hands, t, &self.round.projects.available);
        }

        self.phase = Phase::Playing;
        let leader = next_seat(self.dealer);
        self.set_turn(Some(leader));
        vec![
            GameEvent::PhaseChanged {
                phase: Phase::Playing,
            },
            GameEvent::RoundStarted,
            GameEvent::TurnChanged { seat: leader },
        ]
    }

    // ---- Doubling ----------------------------------------------------

    /// Escalate the doubling ladder. Only the team opposing the previous
    /// escalator (initially the defenders) may raise, and only before the
    /// first card of the round hits the table.
    fn handle_double(&mut self, seat: Seat) -> Result<Vec<GameEvent>, DomainError> {
        if !self.round.bid.settled() {
            return Err(DomainError::wrong_phase("no contract to double"));
        }
        if !self.round.tricks.is_empty() || !self.round.table.is_empty() {
            return Err(DomainError::wrong_phase("doubling closes at the first card"));
        }
        if self.round.is_locked {
            return Err(DomainError::illegal_move("round is locked"));
        }
        let team = team_of(seat);
        let expected = match self.round.last_doubler {
            None => opposing_team(team_of(self.round.bid.bidder.unwrap_or(0))),
            Some(last) => opposing_team(last),
        };
        if team != expected {
            return Err(DomainError::illegal_move("not your team's escalation"));
        }
        let level = self.round.bid.escalate_doubling()?;
        self.round.last_doubler = Some(team);
        if self.mode() == Some(GameMode::Hokum) {
            self.round.is_locked = true;
        }
        if let Some(p) = &mut self.seats[seat as usize] {
            p.last_action = Some(format!("{level:?}"));
        }
        Ok(Vec::new())
    }

    // ---- Trick play --------------------------------------------------

    fn handle_play(&mut self, seat: Seat, card_index: usize) -> Result<Vec<GameEvent>, DomainError> {
        if self.round.trick_transitioning {
            return Err(DomainError::wrong_phase("trick is being cleared"));
        }
        let mode = self.require_mode()?;
        let trump = self.trump();
        let is_locked = self.round.is_locked;

        let hand = self
            .player(seat)
            .map(|p| p.hand.clone())
            .unwrap_or_default();
        let card = *hand
            .get(card_index)
            .ok_or_else(|| DomainError::validation("card index out of range"))?;
        if !rules::is_legal_play(card, &hand, &self.round.table, seat, mode, trump, is_locked) {
            return Err(DomainError::illegal_move(format!(
                "{} is not a legal play",
                card.label()
            )));
        }

        let mut events = Vec::new();
        if let Some(p) = &mut self.seats[seat as usize] {
            p.remove_card(card);
            p.last_action = Some(card.label());
        }
        self.round.table.push(TablePlay {
            card,
            played_by: seat,
        });

        if let (GameMode::Hokum, Some(t)) = (mode, trump) {
            if let Some(phase) = self.round.baloot.on_card_played(seat, card, t) {
                events.push(GameEvent::BalootAnnounced { seat, phase });
            }
        }

        if self.round.table.len() == SEATS {
            events.extend(self.complete_trick(mode, trump)?);
        } else {
            self.set_turn(Some(next_seat(seat)));
        }
        Ok(events)
    }

    fn complete_trick(
        &mut self,
        mode: GameMode,
        trump: Option<Suit>,
    ) -> Result<Vec<GameEvent>, DomainError> {
        let winner = rules::trick_winner(&self.round.table, mode, trump)
            .ok_or_else(|| DomainError::validation("trick incomplete"))?;
        let points = rules::trick_points(&self.round.table, mode, trump);
        self.round.card_abnat[team_of(winner)] += points;

        let plays = std::mem::take(&mut self.round.table);
        self.round.tricks.push(CompletedTrick { plays, winner });
        self.round.trick_transitioning = true;
        self.set_turn(Some(winner));

        let mut events = vec![GameEvent::TrickCompleted { winner }];

        // Declarations are tabled during trick 1 and revealed when trick 2
        // completes.
        if self.round.tricks.len() == 2 && self.round.projects.resolved.is_none() {
            self.resolve_projects();
            events.push(GameEvent::ProjectsRevealed);
        }

        if self.round.tricks.len() == TRICKS_PER_ROUND {
            self.round.card_abnat[team_of(winner)] += LAST_TRICK_BONUS;
            events.extend(self.finish_round()?);
        }
        Ok(events)
    }

    fn resolve_projects(&mut self) {
        let first_speaker = next_seat(self.dealer);
        self.round.projects.resolved = Some(resolve_project_conflicts(
            &self.round.projects.declared,
            first_speaker,
        ));
    }

    /// Clear the trick-transition window. Called by the scheduled task; a
    /// stale epoch makes it a no-op upstream.
    pub fn clear_trick_transition(&mut self) {
        self.round.trick_transitioning = false;
    }

    // ---- Round end ---------------------------------------------------

    fn finish_round(&mut self) -> Result<Vec<GameEvent>, DomainError> {
        if self.round.projects.resolved.is_none() {
            self.resolve_projects();
        }
        let mode = self.require_mode()?;
        let bidder_team = team_of(self.round.bid.bidder.unwrap_or(0));

        let inputs = RoundInputs {
            mode,
            doubling: self.round.bid.doubling,
            last_doubler: self.round.last_doubler,
            bidder_team,
            card_abnat: self.round.card_abnat,
            project_abnat: self.round.projects.team_abnat(),
            baloot_declared: match self.round.baloot.completed_team() {
                Some(0) => [true, false],
                Some(_) => [false, true],
                None => [false, false],
            },
        };
        let mut result = calculate_round(&inputs);

        // A guilty Qayd verdict forfeits the round for the accused team.
        if let Some(accused) = self.round.qayd_guilty_team {
            let other = opposing_team(accused);
            result.game_points[other] += result.game_points[accused];
            result.game_points[accused] = 0;
        }
        for team in 0..2 {
            result.game_points[team] += self.round.bonus_gp[team];
        }

        self.match_score[0] += result.game_points[0];
        self.match_score[1] += result.game_points[1];
        self.round_history.push(result.clone());
        self.epoch += 1;
        self.round.sawa.abort();
        self.set_turn(None);

        let mut events = vec![GameEvent::RoundFinished { result }];
        if self.match_score.iter().any(|&s| s >= MATCH_TARGET)
            && self.match_score[0] != self.match_score[1]
        {
            self.phase = Phase::GameOver;
            let winner = if self.match_score[0] > self.match_score[1] {
                0
            } else {
                1
            };
            events.push(GameEvent::PhaseChanged {
                phase: Phase::GameOver,
            });
            events.push(GameEvent::MatchFinished { winner });
        } else {
            self.phase = Phase::RoundOver;
            events.push(GameEvent::PhaseChanged {
                phase: Phase::RoundOver,
            });
            events.push(GameEvent::ScheduleRestart);
        }
        Ok(events)
    }

    /// RoundOver → Bidding with the dealer rotated.
    pub fn advance_round(&mut self, rng: &mut dyn RngCore) -> Result<Vec<GameEvent>, DomainError> {
        if self.phase != Phase::RoundOver {
            return Err(DomainError::wrong_phase("round is not over"));
        }
        self.dealer = next_seat(self.dealer);
        Ok(self.start_round(rng))
    }

    // ---- Claims ------------------------------------------------------

    fn handle_akka(&mut self, seat: Seat, suit: Suit) -> Result<Vec<GameEvent>, DomainError> {
        let mode = self.require_mode()?;
        let trump = self.trump();
        let played = self.round.played_cards();
        let hand = self
            .player(seat)
            .map(|p| p.hand.clone())
            .unwrap_or_default();
        let valid = self
            .round
            .akka
            .claim(seat, suit, &hand, &played, mode, trump)?;
        if valid {
            self.round.bonus_gp[team_of(seat)] += penalties::VALID_AKKA_GP;
        } else {
            self.round.bonus_gp[opposing_team(team_of(seat))] += penalties::INVALID_AKKA_GP;
        }
        Ok(vec![GameEvent::AkkaResolved { seat, valid }])
    }

    fn handle_sawa_claim(&mut self, seat: Seat) -> Result<Vec<GameEvent>, DomainError> {
        self.require_mode()?;
        self.round.sawa.open(seat)?;
        Ok(vec![GameEvent::SawaWindowOpened { claimer: seat }])
    }

    fn handle_sawa_response(
        &mut self,
        seat: Seat,
        accept: bool,
    ) -> Result<Vec<GameEvent>, DomainError> {
        let claimer = self
            .round
            .sawa
            .pending
            .as_ref()
            .map(|c| c.claimer)
            .ok_or_else(|| DomainError::wrong_phase("no sawa claim is open"))?;
        let outcome = self.round.sawa.respond(seat, accept)?;
        match outcome {
            SawaOutcome::Pending => Ok(Vec::new()),
            SawaOutcome::Accepted => {
                let mut events = vec![GameEvent::SawaResolved { accepted: true }];
                events.extend(self.end_round_by_sawa(claimer)?);
                Ok(events)
            }
            SawaOutcome::Rejected => {
                let mode = self.require_mode()?;
                let trump = self.trump();
                let played = self.round.played_cards();
                let hand = self
                    .player(claimer)
                    .map(|p| p.hand.clone())
                    .unwrap_or_default();
                if !claim_is_sound(&hand, &played, mode, trump) {
                    self.round.bonus_gp[opposing_team(team_of(claimer))] +=
                        penalties::FALSE_SAWA_GP;
                }
                Ok(vec![GameEvent::SawaResolved { accepted: false }])
            }
        }
    }

    /// Unanimously accepted Sawa: all remaining abnat, the live trick and
    /// the last-trick bonus go to the claimer's team.
    fn end_round_by_sawa(&mut self, claimer: Seat) -> Result<Vec<GameEvent>, DomainError> {
        let mode = self.require_mode()?;
        let trump = self.trump();
        let team = team_of(claimer);

        let mut remaining: u16 = self
            .seats
            .iter()
            .flatten()
            .flat_map(|p| p.hand.iter())
            .map(|c| c.points(mode, trump))
            .sum();
        remaining += rules::trick_points(&self.round.table, mode, trump);
        self.round.card_abnat[team] += remaining + LAST_TRICK_BONUS;

        // Remaining cards fold into the history as conceded tricks so the
        // record stays complete.
        let mut conceded: Vec<TablePlay> = Vec::new();
        for (seat, slot) in self.seats.iter_mut().enumerate() {
            if let Some(p) = slot {
                conceded.extend(p.hand.drain(..).map(|card| TablePlay {
                    card,
                    played_by: seat as Seat,
                }));
            }
        }
        conceded.extend(std::mem::take(&mut self.round.table));
        if !conceded.is_empty() {
            self.round.tricks.push(CompletedTrick {
                plays: conceded,
                winner: claimer,
            });
        }
        self.finish_round()
    }

    fn handle_declare_project(
        &mut self,
        seat: Seat,
        project_ref: usize,
    ) -> Result<Vec<GameEvent>, DomainError> {
        if !self.round.tricks.is_empty() {
            return Err(DomainError::wrong_phase(
                "declarations close after the first trick",
            ));
        }
        let available = &mut self.round.projects.available[seat as usize];
        if project_ref >= available.len() {
            return Err(DomainError::validation("no such project"));
        }
        let project = available.remove(project_ref);
        if let Some(p) = &mut self.seats[seat as usize] {
            p.last_action = Some(format!("{:?}", project.kind));
        }
        self.round.projects.declared[seat as usize].push(project);
        Ok(Vec::new())
    }

    // ---- Qayd --------------------------------------------------------

    fn handle_qayd_start(&mut self, seat: Seat) -> Result<Vec<GameEvent>, DomainError> {
        self.require_mode()?;
        let resume = self.current_turn;
        self.round.qayd.start(seat, resume)?;
        self.phase = Phase::QaydActive;
        self.set_turn(None);
        Ok(vec![
            GameEvent::PhaseChanged {
                phase: Phase::QaydActive,
            },
            GameEvent::QaydOpened { reporter: seat },
        ])
    }

    fn handle_qayd_confirm(&mut self, seat: Seat) -> Result<Vec<GameEvent>, DomainError> {
        let mode = self.require_mode()?;
        let trump = self.trump();
        let is_locked = self.round.is_locked;
        // Capture the accusation before confirm: closing the engine wipes
        // its working fields.
        let reporter = self.round.qayd.reporter;
        let crime = self.round.qayd.crime;
        let suspect_hand: Vec<Card> = crime
            .map(|c| c.played_by)
            .and_then(|s| self.player(s))
            .map(|p| p.hand.clone())
            .unwrap_or_default();

        let tricks = self.round.tricks.clone();
        let table = self.round.table.clone();
        let verdict = self.round.qayd.confirm(
            seat,
            &tricks,
            &table,
            &suspect_hand,
            mode,
            trump,
            is_locked,
        )?;

        match verdict {
            None => Ok(Vec::new()),
            Some(v) => Ok(self.resume_from_qayd(Some(v), reporter, crime)),
        }
    }

    /// Close the sub-protocol: apply the verdict and restore play.
    fn resume_from_qayd(
        &mut self,
        verdict: Option<QaydVerdict>,
        reporter: Option<Seat>,
        crime: Option<QaydCardRef>,
    ) -> Vec<GameEvent> {
        let reporter_team = reporter.map(team_of);
        if let (Some(v), Some(crime)) = (verdict, crime) {
            match v {
                QaydVerdict::Guilty => {
                    self.round.qayd_guilty_team = Some(team_of(crime.played_by));
                }
                QaydVerdict::Innocent => {
                    if let Some(team) = reporter_team {
                        self.round.bonus_gp[opposing_team(team)] += penalties::QAYD_INNOCENT_GP;
                        // The reporter's team forfeits its declarations.
                        for seat in 0..SEATS {
                            if team_of(seat as Seat) == team {
                                self.round.projects.declared[seat].clear();
                                if let Some(resolved) = &mut self.round.projects.resolved {
                                    resolved[seat].clear();
                                }
                            }
                        }
                    }
                }
            }
        }
        let resume = self.round.qayd.resume_turn.take();
        self.phase = Phase::Playing;
        self.set_turn(resume);
        let mut events = vec![
            GameEvent::PhaseChanged {
                phase: Phase::Playing,
            },
            GameEvent::QaydClosed { verdict },
        ];
        if let Some(seat) = resume {
            events.push(GameEvent::TurnChanged { seat });
        }
        events
    }

    // ---- Settings ----------------------------------------------------

    fn handle_update_settings(
        &mut self,
        settings: GameSettings,
    ) -> Result<Vec<GameEvent>, DomainError> {
        if !GameSettings::turn_duration_valid(settings.turn_duration) {
            return Err(DomainError::validation(
                "turnDuration must be between 1 and 120 seconds",
            ));
        }
        self.settings = settings;
        Ok(Vec::new())
    }

    // ---- Invariants --------------------------------------------------

    /// The 32-card conservation check: hands ∪ table ∪ history ∪ floor ∪
    /// undealt deck must be exactly the canonical deck once dealing begins.
    pub fn cards_conserved(&self) -> bool {
        if self.phase == Phase::Waiting {
            return true;
        }
        let mut all: Vec<Card> = Vec::with_capacity(32);
        for p in self.seats.iter().flatten() {
            all.extend(p.hand.iter().copied());
        }
        all.extend(self.round.table.iter().map(|p| p.card));
        for t in &self.round.tricks {
            all.extend(t.plays.iter().map(|p| p.card));
        }
        all.extend(self.round.floor_card);
        all.extend(self.round.deck.iter().copied());
        all.sort();
        let mut deck = full_deck();
        deck.sort();
        all == deck
    }

    /// Exactly one active seat whenever a turn is set, zero otherwise.
    pub fn turn_flags_consistent(&self) -> bool {
        let active: Vec<Seat> = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Some(p) if p.is_active_turn => Some(i as Seat),
                _ => None,
            })
            .collect();
        match self.current_turn {
            Some(seat) => active == vec![seat],
            None => active.is_empty(),
        }
    }

    pub fn legal_plays_for(&self, seat: Seat) -> Vec<Card> {
        let Some(mode) = self.mode() else {
            return Vec::new();
        };
        let hand = self
            .player(seat)
            .map(|p| p.hand.as_slice())
            .unwrap_or(&[]);
        rules::legal_plays(
            hand,
            &self.round.table,
            seat,
            mode,
            self.trump(),
            self.round.is_locked,
        )
    }
}
