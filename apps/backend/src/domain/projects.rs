//! Project (declaration) detection and cross-team conflict resolution.
//!
//! Sira (3-run), Fifty (4-run), Hundred (5-run or four-of-a-kind) and the
//! Sun-only FourHundred (four aces). The Baloot K+Q declaration is not a
//! project; it lives in `baloot_call`.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, GameMode, Rank, Suit};
use crate::domain::player::{team_of, Seat, SEATS};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Sira,
    Fifty,
    Hundred,
    FourHundred,
}

impl ProjectKind {
    pub fn abnat(self) -> u16 {
        match self {
            ProjectKind::Sira => 20,
            ProjectKind::Fifty => 50,
            ProjectKind::Hundred => 100,
            ProjectKind::FourHundred => 400,
        }
    }

    /// Suppression tier; higher tiers beat lower ones outright.
    fn tier(self) -> u8 {
        match self {
            ProjectKind::Sira => 0,
            ProjectKind::Fifty => 1,
            ProjectKind::Hundred => 2,
            ProjectKind::FourHundred => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub kind: ProjectKind,
    pub cards: Vec<Card>,
}

impl Project {
    /// Highest sequence rank in the project, for tie-breaking between
    /// equal kinds.
    pub fn top_rank(&self) -> u8 {
        self.cards
            .iter()
            .map(|c| c.rank.sequence_index())
            .max()
            .unwrap_or(0)
    }
}

/// Detect all projects in a hand. Runs use the fixed 7..A sequence order;
/// four-of-a-kind counts for 9 and above (aces are FourHundred in Sun,
/// Hundred in Hokum).
pub fn detect_projects(hand: &[Card], mode: GameMode) -> Vec<Project> {
    let mut found = Vec::new();

    for suit in Suit::ALL {
        let mut in_suit: Vec<Card> = hand.iter().copied().filter(|c| c.suit == suit).collect();
        in_suit.sort_by_key(|c| c.rank.sequence_index());

        let mut run: Vec<Card> = Vec::new();
        let flush_run = |run: &mut Vec<Card>, found: &mut Vec<Project>| {
            let kind = match run.len() {
                0..=2 => None,
                3 => Some(ProjectKind::Sira),
                4 => Some(ProjectKind::Fifty),
                _ => Some(ProjectKind::Hundred),
            };
            if let Some(kind) = kind {
                found.push(Project {
                    kind,
                    cards: run.clone(),
                });
            }
            run.clear();
        };

        for card in in_suit {
            match run.last() {
                Some(prev) if card.rank.sequence_index() == prev.rank.sequence_index() + 1 => {
                    run.push(card);
                }
                _ => {
                    flush_run(&mut run, &mut found);
                    run.push(card);
                }
            }
        }
        flush_run(&mut run, &mut found);
    }

    for rank in [Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace] {
        let of_rank: Vec<Card> = hand.iter().copied().filter(|c| c.rank == rank).collect();
        if of_rank.len() == 4 {
            let kind = if rank == Rank::Ace && mode == GameMode::Sun {
                ProjectKind::FourHundred
            } else {
                ProjectKind::Hundred
            };
            found.push(Project {
                kind,
                cards: of_rank,
            });
        }
    }

    found
}

/// Per-round project bookkeeping: what each seat may declare, what it did
/// declare, and the post-resolution survivors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub available: [Vec<Project>; 4],
    pub declared: [Vec<Project>; 4],
    #[serde(default)]
    pub resolved: Option<[Vec<Project>; 4]>,
}

impl ProjectState {
    pub fn on_deal(hands: [&[Card]; 4], mode: GameMode) -> Self {
        let available = [
            detect_projects(hands[0], mode),
            detect_projects(hands[1], mode),
            detect_projects(hands[2], mode),
            detect_projects(hands[3], mode),
        ];
        ProjectState {
            available,
            declared: Default::default(),
            resolved: None,
        }
    }

    /// Abnat contributed to each team after resolution.
    pub fn team_abnat(&self) -> [u16; 2] {
        let mut totals = [0u16; 2];
        if let Some(resolved) = &self.resolved {
            for (seat, projects) in resolved.iter().enumerate() {
                for p in projects {
                    totals[team_of(seat as Seat)] += p.kind.abnat();
                }
            }
        }
        totals
    }
}

/// Resolve declared projects across teams.
///
/// The team holding the single strongest project keeps every declaration it
/// made; the other team's declarations are all invalidated. Strength is
/// kind tier, then highest rank; a remaining tie goes to the seat that
/// speaks earlier in play order from `first_speaker`.
pub fn resolve_project_conflicts(
    declared: &[Vec<Project>; 4],
    first_speaker: Seat,
) -> [Vec<Project>; 4] {
    #[derive(PartialOrd, Ord, PartialEq, Eq)]
    struct Strength {
        tier: u8,
        top_rank: u8,
        // Earlier speakers win ties, so later seats get a lower score.
        speak_priority: u8,
    }

    let strength_of = |seat: Seat, p: &Project| Strength {
        tier: p.kind.tier(),
        top_rank: p.top_rank(),
        speak_priority: (SEATS as u8) - ((seat + SEATS as u8 - first_speaker) % SEATS as u8),
    };

    let mut best: Option<(Seat, Strength)> = None;
    for seat in 0..SEATS as u8 {
        for p in &declared[seat as usize] {
            let s = strength_of(seat, p);
            match &best {
                Some((_, current)) if *current >= s => {}
                _ => best = Some((seat, s)),
            }
        }
    }

    let Some((winner_seat, _)) = best else {
        return Default::default();
    };
    let winner_team = team_of(winner_seat);

    let mut resolved: [Vec<Project>; 4] = Default::default();
    for seat in 0..SEATS {
        if team_of(seat as Seat) == winner_team {
            resolved[seat] = declared[seat].clone();
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn detects_sira_and_fifty_runs() {
        let hand = vec![
            c(Rank::Seven, Suit::Hearts),
            c(Rank::Eight, Suit::Hearts),
            c(Rank::Nine, Suit::Hearts),
            c(Rank::Jack, Suit::Spades),
            c(Rank::Queen, Suit::Spades),
            c(Rank::King, Suit::Spades),
            c(Rank::Ace, Suit::Spades),
        ];
        let projects = detect_projects(&hand, GameMode::Hokum);
        assert_eq!(projects.len(), 2);
        assert!(projects
            .iter()
            .any(|p| p.kind == ProjectKind::Sira && p.cards[0].suit == Suit::Hearts));
        assert!(projects
            .iter()
            .any(|p| p.kind == ProjectKind::Fifty && p.cards[0].suit == Suit::Spades));
    }

    #[test]
    fn five_run_is_hundred() {
        let hand = vec![
            c(Rank::Ten, Suit::Diamonds),
            c(Rank::Jack, Suit::Diamonds),
            c(Rank::Queen, Suit::Diamonds),
            c(Rank::King, Suit::Diamonds),
            c(Rank::Ace, Suit::Diamonds),
        ];
        let projects = detect_projects(&hand, GameMode::Sun);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].kind, ProjectKind::Hundred);
    }

    #[test]
    fn broken_sequence_is_no_project() {
        // 10 J Q x A: the ace does not extend the run across the gap.
        let hand = vec![
            c(Rank::Ten, Suit::Clubs),
            c(Rank::Jack, Suit::Clubs),
            c(Rank::Queen, Suit::Clubs),
            c(Rank::Ace, Suit::Clubs),
        ];
        let projects = detect_projects(&hand, GameMode::Sun);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].kind, ProjectKind::Sira);
    }

    #[test]
    fn four_aces_in_sun_is_four_hundred() {
        let hand: Vec<Card> = Suit::ALL.iter().map(|s| c(Rank::Ace, *s)).collect();
        let sun = detect_projects(&hand, GameMode::Sun);
        assert_eq!(sun[0].kind, ProjectKind::FourHundred);
        let hokum = detect_projects(&hand, GameMode::Hokum);
        assert_eq!(hokum[0].kind, ProjectKind::Hundred);
    }

    #[test]
    fn four_sevens_are_nothing() {
        let hand: Vec<Card> = Suit::ALL.iter().map(|s| c(Rank::Seven, *s)).collect();
        assert!(detect_projects(&hand, GameMode::Sun).is_empty());
    }

    #[test]
    fn stronger_team_suppresses_weaker() {
        let mut declared: [Vec<Project>; 4] = Default::default();
        declared[0].push(Project {
            kind: ProjectKind::Sira,
            cards: vec![
                c(Rank::Seven, Suit::Hearts),
                c(Rank::Eight, Suit::Hearts),
                c(Rank::Nine, Suit::Hearts),
            ],
        });
        declared[1].push(Project {
            kind: ProjectKind::Fifty,
            cards: vec![
                c(Rank::Jack, Suit::Spades),
                c(Rank::Queen, Suit::Spades),
                c(Rank::King, Suit::Spades),
                c(Rank::Ace, Suit::Spades),
            ],
        });
        let resolved = resolve_project_conflicts(&declared, 0);
        assert!(resolved[0].is_empty());
        assert_eq!(resolved[1].len(), 1);
    }

    #[test]
    fn winning_team_keeps_all_its_projects() {
        let mut declared: [Vec<Project>; 4] = Default::default();
        declared[0].push(Project {
            kind: ProjectKind::Hundred,
            cards: vec![
                c(Rank::Ten, Suit::Hearts),
                c(Rank::Jack, Suit::Hearts),
                c(Rank::Queen, Suit::Hearts),
                c(Rank::King, Suit::Hearts),
                c(Rank::Ace, Suit::Hearts),
            ],
        });
        declared[2].push(Project {
            kind: ProjectKind::Sira,
            cards: vec![
                c(Rank::Seven, Suit::Clubs),
                c(Rank::Eight, Suit::Clubs),
                c(Rank::Nine, Suit::Clubs),
            ],
        });
        declared[1].push(Project {
            kind: ProjectKind::Fifty,
            cards: vec![
                c(Rank::Seven, Suit::Spades),
                c(Rank::Eight, Suit::Spades),
                c(Rank::Nine, Suit::Spades),
                c(Rank::Ten, Suit::Spades),
            ],
        });
        let resolved = resolve_project_conflicts(&declared, 0);
        assert_eq!(resolved[0].len(), 1);
        assert_eq!(resolved[2].len(), 1);
        assert!(resolved[1].is_empty());
    }

    #[test]
    fn equal_projects_tie_break_by_rank_then_order() {
        let mut declared: [Vec<Project>; 4] = Default::default();
        // Seat 0: sira topped by king. Seat 1: sira topped by ace.
        declared[0].push(Project {
            kind: ProjectKind::Sira,
            cards: vec![
                c(Rank::Jack, Suit::Hearts),
                c(Rank::Queen, Suit::Hearts),
                c(Rank::King, Suit::Hearts),
            ],
        });
        declared[1].push(Project {
            kind: ProjectKind::Sira,
            cards: vec![
                c(Rank::Queen, Suit::Spades),
                c(Rank::King, Suit::Spades),
                c(Rank::Ace, Suit::Spades),
            ],
        });
        let resolved = resolve_project_conflicts(&declared, 0);
        assert!(resolved[0].is_empty());
        assert_eq!(resolved[1].len(), 1);
    }

    #[test]
    fn team_abnat_sums_resolved_only() {
        let mut state = ProjectState::default();
        let mut resolved: [Vec<Project>; 4] = Default::default();
        resolved[1].push(Project {
            kind: ProjectKind::Fifty,
            cards: Vec::new(),
        });
        resolved[3].push(Project {
            kind: ProjectKind::Sira,
            cards: Vec::new(),
        });
        state.resolved = Some(resolved);
        assert_eq!(state.team_abnat(), [0, 70]);
    }
}
