//! Bot turns, timers and the auto-restart latch.
//!
//! Every scheduled callback carries the epoch (and, for turn-scoped work,
//! the turn sequence) captured at schedule time; a fired callback that
//! finds a different value is a no-op. That is the whole cancellation
//! model: timers are never cancelled, they just expire against a moved-on
//! game.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{ActionContext, ActionOrigin, GameService};
use crate::bot::{create_bot, fallback_action, BotContext};
use crate::domain::game::{
    Game, GameAction, GameEvent, Phase, ROUND_RESTART_DELAY_MS, TRICK_TRANSITION_DELAY_MS,
};
use crate::domain::player::Seat;
use crate::domain::qayd::{QaydStage, QAYD_BOT_TIMEOUT_SECS, QAYD_HUMAN_TIMEOUT_SECS};
use crate::domain::sawa::SAWA_RESPONSE_WINDOW_SECS;

/// Hard bound on consecutive bot turns without a human action.
pub const MAX_BOT_CHAIN: u32 = 500;

const BOT_TURN_DELAY_MS: u64 = 1000;
const BOT_TURN_DELAY_FAST_MS: u64 = 100;
/// Stagger for bot sawa responses so they read as individual reactions.
const BOT_RESPONSE_STAGGER_MS: u64 = 400;

impl GameService {
    /// Fan out follow-up work for the events of one completed action.
    pub(crate) fn process_events(self: &Arc<Self>, game: &Game, events: &[GameEvent], depth: u32) {
        for event in events {
            match event {
                GameEvent::TurnChanged { seat } => {
                    self.on_turn_changed(game, *seat, depth);
                }
                GameEvent::TrickCompleted { .. } => {
                    self.schedule_trick_clear(game, depth);
                }
                GameEvent::ScheduleRestart => {
                    self.schedule_restart(game);
                }
                GameEvent::SawaWindowOpened { claimer } => {
                    self.schedule_sawa_window(game, *claimer, depth);
                }
                GameEvent::QaydOpened { reporter } => {
                    self.schedule_qayd_timeout(game, *reporter);
                }
                GameEvent::MatchFinished { winner } => {
                    info!(room_id = %game.room_id, winner, "match finished");
                    self.schedule_archive(game);
                }
                _ => {}
            }
        }
    }

    fn bot_delay(game: &Game) -> Duration {
        if game.settings.is_debug {
            Duration::from_millis(BOT_TURN_DELAY_FAST_MS)
        } else {
            Duration::from_millis(BOT_TURN_DELAY_MS)
        }
    }

    fn on_turn_changed(self: &Arc<Self>, game: &Game, seat: Seat, depth: u32) {
        if game.is_bot(seat) {
            let service = self.clone();
            let room_id = game.room_id.clone();
            let epoch = game.epoch;
            let turn_seq = game.turn_seq;
            let delay = Self::bot_delay(game);
            tokio::spawn(async move {
                sleep(delay).await;
                service.bot_turn(room_id, seat, epoch, turn_seq, depth).await;
            });
        } else {
            self.schedule_turn_timer(game, seat, depth);
        }
    }

    /// Advance a bot seat: reload, verify freshness, decide, re-enter the
    /// ActionHandler as if it came from a client.
    pub async fn bot_turn(
        self: Arc<Self>,
        room_id: String,
        seat: Seat,
        epoch: u64,
        turn_seq: u64,
        depth: u32,
    ) {
        if depth >= MAX_BOT_CHAIN {
            error!(
                %room_id,
                seat, depth, "bot chain exceeded recursion cap, parking the room"
            );
            return;
        }
        let game = match self.rooms.get_game(&room_id).await {
            Ok(game) => game,
            Err(err) => {
                warn!(%room_id, error = %err, "bot turn could not load game");
                return;
            }
        };
        if game.epoch != epoch || game.turn_seq != turn_seq || game.current_turn != Some(seat) {
            debug!(%room_id, seat, "stale bot turn dropped");
            return;
        }
        if game.round.trick_transitioning {
            // The clear task re-enters us once the window closes.
            return;
        }
        let Some(difficulty) = game.player(seat).and_then(|p| p.bot_difficulty) else {
            return;
        };

        let strategy = create_bot(difficulty);
        let decision = strategy.decide(&BotContext { game: &game, seat });
        let action = match decision {
            Ok(action) => action,
            Err(err) => {
                // A bot failure must never corrupt the game: log loud,
                // play the safest legal action instead.
                error!(%room_id, seat, error = %err, "bot decide failed, using fallback");
                match fallback_action(&game, seat) {
                    Some(action) => action,
                    None => return,
                }
            }
        };

        let ctx = ActionContext {
            room_id: room_id.clone(),
            seat,
            origin: ActionOrigin::Bot,
            skip_professor: true,
            depth: depth + 1,
        };
        if let Err(err) = self.handle_action(ctx.clone(), action.clone()).await {
            warn!(%room_id, seat, error = %err, "bot action rejected, trying fallback");
            let fallback = fallback_action(&game, seat);
            match fallback {
                Some(fb) if fb != action => {
                    if let Err(err) = self.handle_action(ctx, fb).await {
                        error!(%room_id, seat, error = %err, "bot fallback also rejected");
                    }
                }
                _ => {
                    error!(%room_id, seat, "no usable bot fallback, parking the seat");
                }
            }
        }
    }

    /// Human turn countdown: expiry plays the fallback through the same
    /// pipeline, guarded by (epoch, turn_seq).
    fn schedule_turn_timer(self: &Arc<Self>, game: &Game, seat: Seat, depth: u32) {
        if !matches!(game.phase, Phase::Bidding | Phase::Playing) {
            return;
        }
        let service = self.clone();
        let room_id = game.room_id.clone();
        let epoch = game.epoch;
        let turn_seq = game.turn_seq;
        let wait = Duration::from_secs(game.settings.turn_duration as u64);
        tokio::spawn(async move {
            sleep(wait).await;
            let game = match service.rooms.get_game(&room_id).await {
                Ok(game) => game,
                Err(_) => return,
            };
            if game.epoch != epoch || game.turn_seq != turn_seq || game.current_turn != Some(seat)
            {
                return;
            }
            info!(%room_id, seat, "turn timer expired, auto-playing");
            let Some(action) = fallback_action(&game, seat) else {
                return;
            };
            let ctx = ActionContext {
                room_id: room_id.clone(),
                seat,
                origin: ActionOrigin::Scheduler,
                skip_professor: true,
                depth,
            };
            if let Err(err) = service.handle_action(ctx, action).await {
                warn!(%room_id, seat, error = %err, "turn-timeout action rejected");
            }
        });
    }

    /// Close the trick-transition window after the display delay, then
    /// hand control to whoever won.
    fn schedule_trick_clear(self: &Arc<Self>, game: &Game, depth: u32) {
        let service = self.clone();
        let room_id = game.room_id.clone();
        let epoch = game.epoch;
        let delay = if game.settings.is_debug {
            Duration::from_millis(BOT_TURN_DELAY_FAST_MS)
        } else {
            Duration::from_millis(TRICK_TRANSITION_DELAY_MS)
        };
        tokio::spawn(async move {
            sleep(delay).await;
            let lock = service.rooms.lock(&room_id);
            let guard = lock.lock().await;
            let mut game = match service.rooms.get_game(&room_id).await {
                Ok(game) => game,
                Err(_) => return,
            };
            if game.epoch != epoch || !game.round.trick_transitioning {
                return;
            }
            game.clear_trick_transition();
            if service.rooms.save_game(&game).await.is_err() {
                service.rooms.invalidate_cache(&room_id);
                return;
            }
            drop(guard);
            service.hub.broadcast_game(&game, false);
            if let Some(seat) = game.current_turn {
                service.process_events(
                    &game,
                    &[GameEvent::TurnChanged { seat }],
                    depth,
                );
            }
        });
    }

    /// Round restart after the standard delay. The latch guarantees at
    /// most one restart attempt per round transition; release happens on
    /// every exit path via the guard.
    fn schedule_restart(self: &Arc<Self>, game: &Game) {
        let service = self.clone();
        let room_id = game.room_id.clone();
        let epoch = game.epoch;
        let delay = if game.settings.is_debug {
            Duration::from_millis(BOT_TURN_DELAY_FAST_MS)
        } else {
            Duration::from_millis(ROUND_RESTART_DELAY_MS)
        };
        tokio::spawn(async move {
            sleep(delay).await;
            if service
                .restart_latches
                .insert(room_id.clone(), ())
                .is_some()
            {
                debug!(%room_id, "restart already in flight");
                return;
            }
            let _latch = RestartLatchGuard {
                service: &service,
                room_id: &room_id,
            };

            let lock = service.rooms.lock(&room_id);
            let guard = lock.lock().await;
            let mut game = match service.rooms.get_game(&room_id).await {
                Ok(game) => game,
                Err(_) => return,
            };
            if game.epoch != epoch || game.phase != Phase::RoundOver {
                return;
            }
            let events = {
                let mut rng = rand::rng();
                match game.advance_round(&mut rng) {
                    Ok(events) => events,
                    Err(err) => {
                        warn!(%room_id, error = %err, "auto-restart rejected");
                        return;
                    }
                }
            };
            if service.rooms.save_game(&game).await.is_err() {
                service.rooms.invalidate_cache(&room_id);
                return;
            }
            drop(guard);
            service.hub.broadcast_game(&game, false);
            service.process_events(&game, &events, 0);
        });
    }

    /// Sawa response window: prompt bot responders, then expire the claim.
    fn schedule_sawa_window(self: &Arc<Self>, game: &Game, claimer: Seat, depth: u32) {
        // Bots answer on their own, staggered for readability.
        for (idx, seat) in (0..4u8).filter(|s| *s != claimer).enumerate() {
            if !game.is_bot(seat) {
                continue;
            }
            let service = self.clone();
            let room_id = game.room_id.clone();
            let epoch = game.epoch;
            let delay = Duration::from_millis(BOT_RESPONSE_STAGGER_MS * (idx as u64 + 1));
            tokio::spawn(async move {
                sleep(delay).await;
                let game = match service.rooms.get_game(&room_id).await {
                    Ok(game) => game,
                    Err(_) => return,
                };
                if game.epoch != epoch || game.round.sawa.pending.is_none() {
                    return;
                }
                let Some(difficulty) = game.player(seat).and_then(|p| p.bot_difficulty) else {
                    return;
                };
                let accept =
                    create_bot(difficulty).respond_sawa(&BotContext { game: &game, seat });
                let ctx = ActionContext {
                    room_id: room_id.clone(),
                    seat,
                    origin: ActionOrigin::Bot,
                    skip_professor: true,
                    depth: depth + 1,
                };
                if let Err(err) = service
                    .handle_action(ctx, GameAction::SawaResponse { accept })
                    .await
                {
                    debug!(%room_id, seat, error = %err, "bot sawa response rejected");
                }
            });
        }

        // Window expiry: an unanswered claim lapses without effect.
        let service = self.clone();
        let room_id = game.room_id.clone();
        let epoch = game.epoch;
        tokio::spawn(async move {
            sleep(Duration::from_secs(SAWA_RESPONSE_WINDOW_SECS)).await;
            let lock = service.rooms.lock(&room_id);
            let guard = lock.lock().await;
            let mut game = match service.rooms.get_game(&room_id).await {
                Ok(game) => game,
                Err(_) => return,
            };
            if game.epoch != epoch || game.round.sawa.pending.is_none() {
                return;
            }
            info!(%room_id, "sawa window expired, claim lapses");
            game.round.sawa.abort();
            if service.rooms.save_game(&game).await.is_err() {
                service.rooms.invalidate_cache(&room_id);
                return;
            }
            drop(guard);
            service.hub.broadcast_game(&game, false);
        });
    }

    /// Qayd countdown: cancel an unfinished challenge, auto-close a
    /// revealed verdict.
    fn schedule_qayd_timeout(self: &Arc<Self>, game: &Game, reporter: Seat) {
        let service = self.clone();
        let room_id = game.room_id.clone();
        let epoch = game.epoch;
        let secs = if game.is_bot(reporter) {
            QAYD_BOT_TIMEOUT_SECS
        } else {
            QAYD_HUMAN_TIMEOUT_SECS
        };
        tokio::spawn(async move {
            sleep(Duration::from_secs(secs)).await;
            let game = match service.rooms.get_game(&room_id).await {
                Ok(game) => game,
                Err(_) => return,
            };
            if game.epoch != epoch || game.phase != Phase::QaydActive {
                return;
            }
            if game.round.qayd.reporter != Some(reporter) {
                return;
            }
            let action = if game.round.qayd.stage == QaydStage::Revealed {
                GameAction::QaydConfirm
            } else {
                GameAction::QaydCancel
            };
            info!(%room_id, reporter, "qayd timer expired");
            let ctx = ActionContext {
                room_id: room_id.clone(),
                seat: reporter,
                origin: ActionOrigin::Scheduler,
                skip_professor: true,
                depth: 0,
            };
            if let Err(err) = service.handle_action(ctx, action).await {
                warn!(%room_id, error = %err, "qayd timeout action rejected");
            }
        });
    }

    fn schedule_archive(self: &Arc<Self>, game: &Game) {
        let service = self.clone();
        let game = game.clone();
        tokio::spawn(async move {
            match service.rooms.archive_match(&game).await {
                Ok(match_id) => info!(room_id = %game.room_id, match_id, "archived"),
                Err(err) => warn!(room_id = %game.room_id, error = %err, "archive failed"),
            }
        });
    }
}

/// Releases the restart latch on every exit path, panics included.
struct RestartLatchGuard<'a> {
    service: &'a GameService,
    room_id: &'a str,
}

impl Drop for RestartLatchGuard<'_> {
    fn drop(&mut self) {
        self.service.restart_latches.remove(self.room_id);
    }
}
