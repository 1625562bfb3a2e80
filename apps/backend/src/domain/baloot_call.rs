//! The two-phase Baloot declaration: K then Q of trump.
//!
//! Phase 1 flags "Baloot" when the owner plays the king; phase 2 completes
//! with "Re-baloot" on the queen, worth a flat +2 GP applied after
//! doubling. A same-hand Hundred project containing both trump honours
//! absorbs the declaration.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, Rank, Suit};
use crate::domain::player::{team_of, Seat, TeamId};
use crate::domain::projects::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalootPhase {
    /// Owner still holds both honours.
    Eligible,
    /// King played and "Baloot" announced.
    Announced,
    /// Queen played and "Re-baloot" announced; bonus is due.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalootProgress {
    pub owner: Seat,
    pub phase: BalootPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalootState {
    pub progress: Option<BalootProgress>,
    #[serde(default)]
    pub suppressed: bool,
}

impl BalootState {
    /// Establish eligibility at deal time: the seat holding both K and Q
    /// of trump. Suppressed outright when one of the owner's projects
    /// contains both honours.
    pub fn on_deal(hands: [&[Card]; 4], trump: Suit, projects: &[Vec<Project>; 4]) -> Self {
        let king = Card::new(Rank::King, trump);
        let queen = Card::new(Rank::Queen, trump);
        for (seat, hand) in hands.iter().enumerate() {
            if hand.contains(&king) && hand.contains(&queen) {
                let absorbed = projects[seat]
                    .iter()
                    .any(|p| p.cards.contains(&king) && p.cards.contains(&queen));
                return BalootState {
                    progress: Some(BalootProgress {
                        owner: seat as Seat,
                        phase: BalootPhase::Eligible,
                    }),
                    suppressed: absorbed,
                };
            }
        }
        BalootState::default()
    }

    /// Advance the declaration when the owner plays a trump honour.
    /// Returns the announcement to broadcast, if any.
    pub fn on_card_played(&mut self, seat: Seat, card: Card, trump: Suit) -> Option<BalootPhase> {
        if self.suppressed {
            return None;
        }
        let progress = self.progress.as_mut()?;
        if progress.owner != seat || card.suit != trump {
            return None;
        }
        match (progress.phase, card.rank) {
            (BalootPhase::Eligible, Rank::King) => {
                progress.phase = BalootPhase::Announced;
                Some(BalootPhase::Announced)
            }
            (BalootPhase::Announced, Rank::Queen) => {
                progress.phase = BalootPhase::Completed;
                Some(BalootPhase::Completed)
            }
            // Queen before king forfeits the declaration.
            (BalootPhase::Eligible, Rank::Queen) => {
                self.progress = None;
                None
            }
            _ => None,
        }
    }

    /// Team owed the +2 bonus, if the declaration completed.
    pub fn completed_team(&self) -> Option<TeamId> {
        match self.progress {
            Some(BalootProgress {
                owner,
                phase: BalootPhase::Completed,
            }) if !self.suppressed => Some(team_of(owner)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projects::ProjectKind;

    fn hands_with_owner(owner: usize, trump: Suit) -> [Vec<Card>; 4] {
        let mut hands: [Vec<Card>; 4] = Default::default();
        hands[owner].push(Card::new(Rank::King, trump));
        hands[owner].push(Card::new(Rank::Queen, trump));
        hands
    }

    #[test]
    fn king_then_queen_completes() {
        let hands = hands_with_owner(2, Suit::Hearts);
        let refs = [
            hands[0].as_slice(),
            hands[1].as_slice(),
            hands[2].as_slice(),
            hands[3].as_slice(),
        ];
        let mut state = BalootState::on_deal(refs, Suit::Hearts, &Default::default());

        assert_eq!(
            state.on_card_played(2, Card::new(Rank::King, Suit::Hearts), Suit::Hearts),
            Some(BalootPhase::Announced)
        );
        assert_eq!(
            state.on_card_played(2, Card::new(Rank::Queen, Suit::Hearts), Suit::Hearts),
            Some(BalootPhase::Completed)
        );
        assert_eq!(state.completed_team(), Some(0));
    }

    #[test]
    fn queen_first_forfeits() {
        let hands = hands_with_owner(1, Suit::Spades);
        let refs = [
            hands[0].as_slice(),
            hands[1].as_slice(),
            hands[2].as_slice(),
            hands[3].as_slice(),
        ];
        let mut state = BalootState::on_deal(refs, Suit::Spades, &Default::default());

        assert_eq!(
            state.on_card_played(1, Card::new(Rank::Queen, Suit::Spades), Suit::Spades),
            None
        );
        assert_eq!(
            state.on_card_played(1, Card::new(Rank::King, Suit::Spades), Suit::Spades),
            None
        );
        assert_eq!(state.completed_team(), None);
    }

    #[test]
    fn project_with_both_honours_absorbs_declaration() {
        let hands = hands_with_owner(0, Suit::Clubs);
        let refs = [
            hands[0].as_slice(),
            hands[1].as_slice(),
            hands[2].as_slice(),
            hands[3].as_slice(),
        ];
        let mut projects: [Vec<Project>; 4] = Default::default();
        projects[0].push(Project {
            kind: ProjectKind::Hundred,
            cards: vec![
                Card::new(Rank::Ten, Suit::Clubs),
                Card::new(Rank::Jack, Suit::Clubs),
                Card::new(Rank::Queen, Suit::Clubs),
                Card::new(Rank::King, Suit::Clubs),
                Card::new(Rank::Ace, Suit::Clubs),
            ],
        });
        let mut state = BalootState::on_deal(refs, Suit::Clubs, &projects);
        assert!(state.suppressed);
        assert_eq!(
            state.on_card_played(0, Card::new(Rank::King, Suit::Clubs), Suit::Clubs),
            None
        );
        assert_eq!(state.completed_team(), None);
    }

    #[test]
    fn no_owner_when_honours_split() {
        let mut hands: [Vec<Card>; 4] = Default::default();
        hands[0].push(Card::new(Rank::King, Suit::Hearts));
        hands[1].push(Card::new(Rank::Queen, Suit::Hearts));
        let refs = [
            hands[0].as_slice(),
            hands[1].as_slice(),
            hands[2].as_slice(),
            hands[3].as_slice(),
        ];
        let state = BalootState::on_deal(refs, Suit::Hearts, &Default::default());
        assert!(state.progress.is_none());
    }
}
