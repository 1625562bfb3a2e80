//! Scenario: a revoke is prosecuted through the full Qayd sub-protocol
//! and the round resumes where it paused.

mod common;

use baloot_backend::domain::bid::Bid;
use baloot_backend::domain::cards::{Card, GameMode, Rank, Suit};
use baloot_backend::domain::game::{Game, GameAction, Phase};
use baloot_backend::domain::player::Player;
use baloot_backend::domain::qayd::{QaydCardRef, QaydRole, QaydStage, QaydVerdict, ViolationKind};
use baloot_backend::domain::rules::{CompletedTrick, TablePlay};

fn card(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

fn play(c: Card, seat: u8) -> TablePlay {
    TablePlay {
        card: c,
        played_by: seat,
    }
}

/// Seat 2 dumped Q♦ on a hearts lead in trick 0, then followed hearts in
/// trick 1: a provable revoke.
fn game_with_revoke() -> Game {
    let mut game = Game::new("qayd-room");
    for (i, name) in ["aziz", "badr", "celine", "duha"].iter().enumerate() {
        game.seats[i] = Some(Player::human(*name));
    }
    game.phase = Phase::Playing;
    game.round.bid = Bid {
        mode: Some(GameMode::Sun),
        trump: None,
        bidder: Some(0),
        is_ashkal: false,
        doubling: Default::default(),
    };
    game.round.tricks = vec![
        CompletedTrick {
            plays: vec![
                play(card(Rank::Ace, Suit::Hearts), 1),
                play(card(Rank::Queen, Suit::Diamonds), 2),
                play(card(Rank::Seven, Suit::Hearts), 3),
                play(card(Rank::Eight, Suit::Hearts), 0),
            ],
            winner: 1,
        },
        CompletedTrick {
            plays: vec![
                play(card(Rank::King, Suit::Clubs), 1),
                play(card(Rank::Queen, Suit::Hearts), 2),
                play(card(Rank::Seven, Suit::Clubs), 3),
                play(card(Rank::Eight, Suit::Clubs), 0),
            ],
            winner: 1,
        },
    ];
    // Whose turn the pause must restore.
    game.current_turn = Some(1);
    if let Some(p) = &mut game.seats[1] {
        p.is_active_turn = true;
    }
    game
}

#[test]
fn revoke_prosecution_returns_guilty_and_resumes_play() {
    let mut game = game_with_revoke();
    let mut rng = rand::rng();
    let reporter = 1u8;

    game.dispatch(reporter, GameAction::QaydStart, &mut rng)
        .unwrap();
    assert_eq!(game.phase, Phase::QaydActive);
    assert_eq!(game.round.qayd.stage, QaydStage::ReporterChoosing);

    game.dispatch(
        reporter,
        GameAction::QaydSelectViolation {
            kind: ViolationKind::Revoke,
        },
        &mut rng,
    )
    .unwrap();

    game.dispatch(
        reporter,
        GameAction::QaydSelectCard {
            role: QaydRole::Crime,
            card_ref: QaydCardRef {
                trick_index: 0,
                card: card(Rank::Queen, Suit::Diamonds),
                played_by: 2,
            },
        },
        &mut rng,
    )
    .unwrap();

    game.dispatch(
        reporter,
        GameAction::QaydSelectCard {
            role: QaydRole::Proof,
            card_ref: QaydCardRef {
                trick_index: 1,
                card: card(Rank::Queen, Suit::Hearts),
                played_by: 2,
            },
        },
        &mut rng,
    )
    .unwrap();

    // First confirm reveals the verdict, second closes the challenge.
    game.dispatch(reporter, GameAction::QaydConfirm, &mut rng)
        .unwrap();
    assert_eq!(game.round.qayd.stage, QaydStage::Revealed);
    assert_eq!(game.round.qayd.verdict, Some(QaydVerdict::Guilty));

    game.dispatch(reporter, GameAction::QaydConfirm, &mut rng)
        .unwrap();

    assert_eq!(game.phase, Phase::Playing);
    assert_eq!(game.current_turn, Some(1));
    // The accused team (seats 0 and 2) forfeits the round at scoring time.
    assert_eq!(game.round.qayd_guilty_team, Some(0));
}

#[test]
fn cancelled_challenge_restores_play_without_penalty() {
    let mut game = game_with_revoke();
    let mut rng = rand::rng();

    game.dispatch(3, GameAction::QaydStart, &mut rng).unwrap();
    game.dispatch(3, GameAction::QaydCancel, &mut rng).unwrap();

    assert_eq!(game.phase, Phase::Playing);
    assert_eq!(game.current_turn, Some(1));
    assert_eq!(game.round.qayd_guilty_team, None);
    assert_eq!(game.round.bonus_gp, [0, 0]);
}

#[test]
fn off_protocol_actions_are_rejected_while_qayd_is_active() {
    let mut game = game_with_revoke();
    let mut rng = rand::rng();

    game.dispatch(1, GameAction::QaydStart, &mut rng).unwrap();
    let err = game.dispatch(1, GameAction::Play { card_index: 0 }, &mut rng);
    assert!(err.is_err());
}
