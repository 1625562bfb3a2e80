//! Qayd: the forensic challenge sub-protocol.
//!
//! A reporter pauses the game, names a violation, and points at a "crime"
//! card from the trick history plus a "proof" card from the suspect's later
//! plays. The engine re-derives the suspect's hand at the crime moment and
//! returns a verdict. Transitions are strictly forward; the engine always
//! terminates by verdict or cancellation.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode, Suit};
use crate::domain::player::{partner, team_of, Seat};
use crate::domain::rules::{CompletedTrick, TablePlay};
use crate::errors::domain::DomainError;

/// Reporter time allowance for the whole sub-protocol.
pub const QAYD_HUMAN_TIMEOUT_SECS: u64 = 60;
pub const QAYD_BOT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Did not follow suit while holding it (Sun or Hokum).
    Revoke,
    /// Trumped in a locked (closed-double) round while able to follow.
    TrumpInClosedDouble,
    /// Failed to over-trump although able.
    NoOvertrump,
    /// Void in the led suit, held trump, partner losing, did not trump.
    NoTrumpForHokum,
    /// Sun: followed suit but failed to head the trick although able.
    NoHigherCard,
}

impl ViolationKind {
    pub fn applies_to(self, mode: GameMode) -> bool {
        match self {
            ViolationKind::Revoke => true,
            ViolationKind::NoHigherCard => mode == GameMode::Sun,
            ViolationKind::TrumpInClosedDouble
            | ViolationKind::NoOvertrump
            | ViolationKind::NoTrumpForHokum => mode == GameMode::Hokum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaydRole {
    Crime,
    Proof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaydCardRef {
    #[serde(rename = "trickIndex")]
    pub trick_index: usize,
    pub card: Card,
    #[serde(rename = "playedBy")]
    pub played_by: Seat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaydVerdict {
    Guilty,
    Innocent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaydStage {
    Idle,
    ReporterChoosing,
    AwaitingVerdict,
    Revealed,
}

impl Default for QaydStage {
    fn default() -> Self {
        QaydStage::Idle
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaydState {
    pub stage: QaydStage,
    pub reporter: Option<Seat>,
    pub violation: Option<ViolationKind>,
    pub crime: Option<QaydCardRef>,
    pub proof: Option<QaydCardRef>,
    pub verdict: Option<QaydVerdict>,
    /// Turn to restore when the sub-protocol closes.
    pub resume_turn: Option<Seat>,
    /// One challenge per seat per round.
    pub used: [bool; 4],
}

impl QaydState {
    pub fn start(&mut self, reporter: Seat, resume_turn: Option<Seat>) -> Result<(), DomainError> {
        if self.stage != QaydStage::Idle {
            return Err(DomainError::wrong_phase("a qayd challenge is already open"));
        }
        if self.used[reporter as usize] {
            return Err(DomainError::illegal_move("qayd already used this round"));
        }
        self.used[reporter as usize] = true;
        self.stage = QaydStage::ReporterChoosing;
        self.reporter = Some(reporter);
        self.resume_turn = resume_turn;
        self.violation = None;
        self.crime = None;
        self.proof = None;
        self.verdict = None;
        Ok(())
    }

    pub fn select_violation(
        &mut self,
        seat: Seat,
        kind: ViolationKind,
        mode: GameMode,
    ) -> Result<(), DomainError> {
        self.require_reporter(seat, QaydStage::ReporterChoosing)?;
        if self.violation.is_some() {
            return Err(DomainError::illegal_move("violation already selected"));
        }
        if !kind.applies_to(mode) {
            return Err(DomainError::validation("violation not valid for this mode"));
        }
        self.violation = Some(kind);
        Ok(())
    }

    pub fn select_card(
        &mut self,
        seat: Seat,
        role: QaydRole,
        card_ref: QaydCardRef,
        tricks: &[CompletedTrick],
    ) -> Result<(), DomainError> {
        self.require_reporter(seat, QaydStage::ReporterChoosing)?;
        if self.violation.is_none() {
            return Err(DomainError::illegal_move("select a violation first"));
        }
        let reporter = self.reporter.unwrap_or(seat);

        let recorded = tricks
            .get(card_ref.trick_index)
            .map(|t| {
                t.plays.iter().any(|p| {
                    p.card == card_ref.card && p.played_by == card_ref.played_by
                })
            })
            .unwrap_or(false);
        if !recorded {
            return Err(DomainError::validation("card not found in trick history"));
        }

        match role {
            QaydRole::Crime => {
                if self.crime.is_some() {
                    return Err(DomainError::illegal_move("crime card already selected"));
                }
                if team_of(card_ref.played_by) == team_of(reporter) {
                    return Err(DomainError::illegal_move(
                        "crime card must belong to the opposing team",
                    ));
                }
                self.crime = Some(card_ref);
            }
            QaydRole::Proof => {
                if self.proof.is_some() {
                    return Err(DomainError::illegal_move("proof card already selected"));
                }
                let crime = self
                    .crime
                    .ok_or_else(|| DomainError::illegal_move("select the crime card first"))?;
                if card_ref.played_by != crime.played_by {
                    return Err(DomainError::validation(
                        "proof must come from the suspect's plays",
                    ));
                }
                if card_ref.trick_index <= crime.trick_index {
                    return Err(DomainError::validation(
                        "proof must postdate the crime trick",
                    ));
                }
                self.proof = Some(card_ref);
            }
        }
        Ok(())
    }

    /// Confirm: from ReporterChoosing this runs the evaluation and reveals
    /// the verdict; from Revealed it closes the challenge. Returns the
    /// verdict once the engine reaches Idle.
    pub fn confirm(
        &mut self,
        seat: Seat,
        tricks: &[CompletedTrick],
        table: &[TablePlay],
        suspect_current_hand: &[Card],
        mode: GameMode,
        trump: Option<Suit>,
        is_locked: bool,
    ) -> Result<Option<QaydVerdict>, DomainError> {
        match self.stage {
            QaydStage::ReporterChoosing => {
                self.require_reporter(seat, QaydStage::ReporterChoosing)?;
                let violation = self
                    .violation
                    .ok_or_else(|| DomainError::illegal_move("no violation selected"))?;
                let crime = self
                    .crime
                    .ok_or_else(|| DomainError::illegal_move("no crime card selected"))?;
                let proof = self
                    .proof
                    .ok_or_else(|| DomainError::illegal_move("no proof card selected"))?;

                self.stage = QaydStage::AwaitingVerdict;
                let verdict = evaluate(
                    violation,
                    crime,
                    proof,
                    tricks,
                    table,
                    suspect_current_hand,
                    mode,
                    trump,
                    is_locked,
                );
                self.verdict = Some(verdict);
                self.stage = QaydStage::Revealed;
                Ok(None)
            }
            QaydStage::Revealed => {
                self.require_reporter(seat, QaydStage::Revealed)?;
                let verdict = self.verdict;
                self.close();
                Ok(verdict)
            }
            _ => Err(DomainError::wrong_phase("nothing to confirm")),
        }
    }

    /// Abort before a verdict is revealed; no penalty either way.
    pub fn cancel(&mut self, seat: Seat) -> Result<(), DomainError> {
        if self.stage == QaydStage::Idle {
            return Err(DomainError::wrong_phase("no qayd challenge is open"));
        }
        if self.stage == QaydStage::Revealed {
            return Err(DomainError::illegal_move(
                "verdict revealed, confirm to close",
            ));
        }
        self.require_reporter(seat, self.stage)?;
        self.close();
        Ok(())
    }

    fn close(&mut self) {
        self.stage = QaydStage::Idle;
        self.reporter = None;
        self.violation = None;
        self.crime = None;
        self.proof = None;
        // The verdict survives closing so the coordinator can apply the
        // penalty; it is cleared on the next start().
    }

    fn require_reporter(&self, seat: Seat, stage: QaydStage) -> Result<(), DomainError> {
        if self.stage != stage {
            return Err(DomainError::wrong_phase("unexpected qayd stage"));
        }
        if self.reporter != Some(seat) {
            return Err(DomainError::not_your_turn("only the reporter may act"));
        }
        Ok(())
    }
}

/// Reconstruct the suspect's hand at the moment of the crime: everything
/// they played from the crime trick onward, plus what they still hold.
fn hand_at_crime(
    suspect: Seat,
    crime_trick: usize,
    tricks: &[CompletedTrick],
    table: &[TablePlay],
    current_hand: &[Card],
) -> Vec<Card> {
    let mut hand: Vec<Card> = current_hand.to_vec();
    for trick in tricks.iter().skip(crime_trick) {
        hand.extend(
            trick
                .plays
                .iter()
                .filter(|p| p.played_by == suspect)
                .map(|p| p.card),
        );
    }
    hand.extend(
        table
            .iter()
            .filter(|p| p.played_by == suspect)
            .map(|p| p.card),
    );
    hand
}

#[allow(clippy::too_many_arguments)]
fn evaluate(
    violation: ViolationKind,
    crime: QaydCardRef,
    proof: QaydCardRef,
    tricks: &[CompletedTrick],
    table: &[TablePlay],
    suspect_current_hand: &[Card],
    mode: GameMode,
    trump: Option<Suit>,
    is_locked: bool,
) -> QaydVerdict {
    let Some(trick) = tricks.get(crime.trick_index) else {
        return QaydVerdict::Innocent;
    };
    let Some(pos) = trick
        .plays
        .iter()
        .position(|p| p.card == crime.card && p.played_by == crime.played_by)
    else {
        return QaydVerdict::Innocent;
    };
    let partial = &trick.plays[..pos];
    let Some(first) = partial.first() else {
        // Leading a trick cannot violate anything.
        return QaydVerdict::Innocent;
    };
    let lead = first.card.suit;

    let hand = hand_at_crime(
        crime.played_by,
        crime.trick_index,
        tricks,
        table,
        suspect_current_hand,
    );

    // The proof card must itself have been in the reconstructed hand and
    // belong to the suit the violation is about.
    let required_suit = match violation {
        ViolationKind::Revoke | ViolationKind::NoHigherCard | ViolationKind::TrumpInClosedDouble => {
            lead
        }
        ViolationKind::NoOvertrump | ViolationKind::NoTrumpForHokum => match trump {
            Some(t) => t,
            None => return QaydVerdict::Innocent,
        },
    };
    if proof.card.suit != required_suit || !hand.contains(&proof.card) {
        return QaydVerdict::Innocent;
    }

    let held_lead = hand.iter().any(|c| c.suit == lead);
    let guilty = match violation {
        ViolationKind::Revoke => crime.card.suit != lead && held_lead,
        ViolationKind::NoHigherCard => {
            if mode != GameMode::Sun || crime.card.suit != lead {
                false
            } else {
                let best = partial
                    .iter()
                    .map(|p| p.card)
                    .filter(|c| c.suit == lead)
                    .map(|c| c.sun_order())
                    .max()
                    .unwrap_or(0);
                let could_beat = hand
                    .iter()
                    .any(|c| c.suit == lead && c.sun_order() > best);
                could_beat && crime.card.sun_order() <= best
            }
        }
        ViolationKind::TrumpInClosedDouble => {
            is_locked && Some(crime.card.suit) == trump && Some(lead) != trump && held_lead
        }
        ViolationKind::NoTrumpForHokum => {
            let Some(t) = trump else { return QaydVerdict::Innocent };
            let partner_winning = crate::domain::rules::current_winner(partial, mode, trump)
                == Some(partner(crime.played_by));
            !held_lead
                && hand.iter().any(|c| c.suit == t)
                && !partner_winning
                && crime.card.suit != t
        }
        ViolationKind::NoOvertrump => {
            let Some(t) = trump else { return QaydVerdict::Innocent };
            if crime.card.suit != t || is_locked {
                false
            } else {
                let best_trump = partial
                    .iter()
                    .map(|p| p.card)
                    .filter(|c| c.suit == t)
                    .map(|c| c.trump_order())
                    .max();
                match best_trump {
                    Some(best) => {
                        let could_over = hand
                            .iter()
                            .any(|c| c.suit == t && c.trump_order() > best);
                        could_over && crime.card.trump_order() <= best
                    }
                    None => false,
                }
            }
        }
    };

    if guilty {
        QaydVerdict::Guilty
    } else {
        QaydVerdict::Innocent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::Rank;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn play(card: Card, seat: Seat) -> TablePlay {
        TablePlay {
            card,
            played_by: seat,
        }
    }

    /// Trick 0: seat 2 discards Q♦ on a hearts lead. Trick 1: seat 2 plays
    /// a heart, proving the revoke.
    fn revoke_history() -> Vec<CompletedTrick> {
        vec![
            CompletedTrick {
                plays: vec![
                    play(c(Rank::Ace, Suit::Hearts), 1),
                    play(c(Rank::Queen, Suit::Diamonds), 2),
                    play(c(Rank::Seven, Suit::Hearts), 3),
                    play(c(Rank::Eight, Suit::Hearts), 0),
                ],
                winner: 1,
            },
            CompletedTrick {
                plays: vec![
                    play(c(Rank::King, Suit::Clubs), 1),
                    play(c(Rank::Queen, Suit::Hearts), 2),
                    play(c(Rank::Seven, Suit::Clubs), 3),
                    play(c(Rank::Eight, Suit::Clubs), 0),
                ],
                winner: 1,
            },
        ]
    }

    fn run_revoke(reporter: Seat) -> (QaydState, Option<QaydVerdict>) {
        let tricks = revoke_history();
        let mut state = QaydState::default();
        state.start(reporter, Some(1)).unwrap();
        state
            .select_violation(reporter, ViolationKind::Revoke, GameMode::Sun)
            .unwrap();
        state
            .select_card(
                reporter,
                QaydRole::Crime,
                QaydCardRef {
                    trick_index: 0,
                    card: c(Rank::Queen, Suit::Diamonds),
                    played_by: 2,
                },
                &tricks,
            )
            .unwrap();
        state
            .select_card(
                reporter,
                QaydRole::Proof,
                QaydCardRef {
                    trick_index: 1,
                    card: c(Rank::Queen, Suit::Hearts),
                    played_by: 2,
                },
                &tricks,
            )
            .unwrap();
        let first = state
            .confirm(reporter, &tricks, &[], &[], GameMode::Sun, None, false)
            .unwrap();
        assert_eq!(first, None);
        assert_eq!(state.stage, QaydStage::Revealed);
        let verdict = state
            .confirm(reporter, &tricks, &[], &[], GameMode::Sun, None, false)
            .unwrap();
        (state, verdict)
    }

    #[test]
    fn revoke_is_found_guilty() {
        let (state, verdict) = run_revoke(1);
        assert_eq!(verdict, Some(QaydVerdict::Guilty));
        assert_eq!(state.stage, QaydStage::Idle);
    }

    #[test]
    fn engine_never_revisits_a_stage() {
        let tricks = revoke_history();
        let mut state = QaydState::default();
        state.start(1, None).unwrap();
        state
            .select_violation(1, ViolationKind::Revoke, GameMode::Sun)
            .unwrap();
        // Re-selecting the violation would be a backward step.
        assert!(state
            .select_violation(1, ViolationKind::Revoke, GameMode::Sun)
            .is_err());
        state
            .select_card(
                1,
                QaydRole::Crime,
                QaydCardRef {
                    trick_index: 0,
                    card: c(Rank::Queen, Suit::Diamonds),
                    played_by: 2,
                },
                &tricks,
            )
            .unwrap();
        assert!(state
            .select_card(
                1,
                QaydRole::Crime,
                QaydCardRef {
                    trick_index: 0,
                    card: c(Rank::Queen, Suit::Diamonds),
                    played_by: 2,
                },
                &tricks,
            )
            .is_err());
    }

    #[test]
    fn qayd_once_per_seat_per_round() {
        let (mut state, _) = run_revoke(1);
        assert!(state.start(1, None).is_err());
        // A different seat may still challenge.
        assert!(state.start(3, None).is_ok());
    }

    #[test]
    fn innocent_when_suspect_was_void() {
        // Same shape, but the "proof" heart was never in the suspect's
        // later plays: proof fails, verdict innocent.
        let mut tricks = revoke_history();
        tricks[1].plays[1] = play(c(Rank::Nine, Suit::Clubs), 2);
        let mut state = QaydState::default();
        state.start(1, None).unwrap();
        state
            .select_violation(1, ViolationKind::Revoke, GameMode::Sun)
            .unwrap();
        state
            .select_card(
                1,
                QaydRole::Crime,
                QaydCardRef {
                    trick_index: 0,
                    card: c(Rank::Queen, Suit::Diamonds),
                    played_by: 2,
                },
                &tricks,
            )
            .unwrap();
        let err = state.select_card(
            1,
            QaydRole::Proof,
            QaydCardRef {
                trick_index: 1,
                card: c(Rank::Queen, Suit::Hearts),
                played_by: 2,
            },
            &tricks,
        );
        // The claimed proof card is not in the recorded history at all.
        assert!(err.is_err());
    }

    #[test]
    fn cancel_returns_to_idle_without_verdict() {
        let mut state = QaydState::default();
        state.start(0, Some(2)).unwrap();
        state.cancel(0).unwrap();
        assert_eq!(state.stage, QaydStage::Idle);
        assert_eq!(state.verdict, None);
    }

    #[test]
    fn crime_must_target_opposing_team() {
        let tricks = revoke_history();
        let mut state = QaydState::default();
        state.start(0, None).unwrap();
        state
            .select_violation(0, ViolationKind::Revoke, GameMode::Sun)
            .unwrap();
        let err = state.select_card(
            0,
            QaydRole::Crime,
            QaydCardRef {
                trick_index: 0,
                card: c(Rank::Queen, Suit::Diamonds),
                played_by: 2,
            },
            &tricks,
        );
        assert!(err.is_err());
    }

    #[test]
    fn hokum_violations_rejected_in_sun() {
        let mut state = QaydState::default();
        state.start(1, None).unwrap();
        assert!(state
            .select_violation(1, ViolationKind::NoOvertrump, GameMode::Sun)
            .is_err());
    }
}
