//! Ingress pipeline: every state mutation flows through here.
//!
//! Order is fixed: the frame is already schema-validated and rate-limited
//! by the socket layer; we acquire the per-room lock, load through the
//! RoomManager, run the professor intercept, dispatch into the domain,
//! persist, release, then broadcast. A save failure after an in-memory
//! mutation rolls the cache back and suppresses the broadcast so clients
//! never see unpersisted state.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::GameService;
use crate::bot::BotLine;
use crate::domain::game::{Game, GameAction, GameEvent, Phase};
use crate::domain::player::{BotDifficulty, Seat};
use crate::error::AppError;
use crate::services::professor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOrigin {
    Human,
    Bot,
    /// Timers and internal follow-ups; never intercepted by the professor.
    Scheduler,
}

#[derive(Debug, Clone)]
pub struct ActionContext {
    pub room_id: String,
    pub seat: Seat,
    pub origin: ActionOrigin,
    pub skip_professor: bool,
    /// Consecutive bot-chain depth, bounded by the scheduler.
    pub depth: u32,
}

impl ActionContext {
    pub fn human(room_id: impl Into<String>, seat: Seat, skip_professor: bool) -> Self {
        ActionContext {
            room_id: room_id.into(),
            seat,
            origin: ActionOrigin::Human,
            skip_professor,
            depth: 0,
        }
    }
}

impl GameService {
    pub async fn create_room(self: &Arc<Self>) -> Result<String, AppError> {
        Ok(self.rooms.create_room().await?)
    }

    /// Seat a player (or rebind a reconnecting identity) and persist.
    /// Returns the seat and the saved game for the join response.
    pub async fn join_room(
        self: &Arc<Self>,
        room_id: &str,
        player_name: &str,
        identity: Option<&str>,
        bot: Option<BotDifficulty>,
    ) -> Result<(Seat, Game), AppError> {
        let lock = self.rooms.lock(room_id);
        let _guard = lock.lock().await;

        let mut game = self.rooms.get_game(room_id).await?;
        let (seat, events) = {
            let mut rng = rand::rng();
            game.join(player_name, identity, bot, &mut rng)?
        };
        if let Err(err) = self.rooms.save_game(&game).await {
            self.rooms.invalidate_cache(room_id);
            warn!(room_id, error = %err, "join could not be persisted");
            return Err(AppError::backend_unavailable("could not persist join"));
        }
        drop(_guard);

        info!(room_id, seat, player_name, "player joined");
        self.hub.broadcast_game(&game, false);
        self.process_events(&game, &events, 0);
        Ok((seat, game))
    }

    /// `add_bot` is a join with a generated name and the room's difficulty.
    pub async fn add_bot(self: &Arc<Self>, room_id: &str) -> Result<(Seat, Game), AppError> {
        let difficulty = {
            let game = self.rooms.get_game(room_id).await?;
            game.settings.bot_difficulty
        };
        let name = bot_name(difficulty);
        self.join_room(room_id, &name, None, Some(difficulty)).await
    }

    /// The ActionHandler proper: one fully-validated action in, one
    /// broadcast out (on success).
    pub async fn handle_action(
        self: &Arc<Self>,
        ctx: ActionContext,
        action: GameAction,
    ) -> Result<(), AppError> {
        let lock = self.rooms.lock(&ctx.room_id);
        let _guard = lock.lock().await;

        let mut game = self.rooms.get_game(&ctx.room_id).await?;

        // Ownership: the seat must exist; turn legality is the domain's
        // call (off-turn actions are whitelisted there).
        if game.player(ctx.seat).is_none() {
            return Err(AppError::invalid_payload("seat is not occupied"));
        }

        if let GameAction::Play { card_index } = &action {
            let human = ctx.origin == ActionOrigin::Human;
            if human && game.settings.professor_enabled && !ctx.skip_professor {
                if let Some(advice) = professor::review_play(&game, ctx.seat, *card_index) {
                    info!(
                        room_id = %ctx.room_id,
                        seat = ctx.seat,
                        suggestion = %advice.suggested_card,
                        "professor intervened"
                    );
                    return Err(AppError::ProfessorIntervention { advice });
                }
            }
        }

        let line = self.bot_line_for(&game, ctx.seat, ctx.origin, &action);
        let events = {
            let mut rng = rand::rng();
            game.dispatch(ctx.seat, action, &mut rng)?
        };

        if let Err(err) = self.rooms.save_game(&game).await {
            // The in-memory mutation is unpersisted: roll back the cache
            // and tell the caller; nobody else may observe this state.
            self.rooms.invalidate_cache(&ctx.room_id);
            error!(room_id = %ctx.room_id, error = %err, "post-action save failed");
            return Err(AppError::backend_unavailable(
                "action could not be persisted",
            ));
        }
        drop(_guard);

        // `game_start` goes out exactly when the phase first enters Playing.
        let started = events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundStarted));
        self.hub.broadcast_game(&game, started);
        if let Some(line) = line {
            self.hub.broadcast_bot_speak(&ctx.room_id, ctx.seat, &line);
        }
        self.process_events(&game, &events, ctx.depth);
        Ok(())
    }

    /// Debug ingress, gated by the room's debug flag.
    pub async fn debug_action(
        self: &Arc<Self>,
        room_id: &str,
        action: &str,
        payload: &serde_json::Value,
    ) -> Result<(), AppError> {
        let lock = self.rooms.lock(room_id);
        let _guard = lock.lock().await;

        let mut game = self.rooms.get_game(room_id).await?;
        if !game.settings.is_debug {
            return Err(AppError::invalid_payload("room is not in debug mode"));
        }
        let mut events = Vec::new();
        match action {
            "clear_trick" => {
                game.clear_trick_transition();
            }
            "set_match_score" => {
                let us = payload.get("us").and_then(|v| v.as_u64()).unwrap_or(0) as u16;
                let them = payload.get("them").and_then(|v| v.as_u64()).unwrap_or(0) as u16;
                game.match_score = [us, them];
            }
            "advance_round" => {
                let mut rng = rand::rng();
                events = game.advance_round(&mut rng)?;
            }
            other => {
                return Err(AppError::invalid_payload(format!(
                    "unknown debug action {other}"
                )))
            }
        }
        if let Err(err) = self.rooms.save_game(&game).await {
            self.rooms.invalidate_cache(room_id);
            return Err(AppError::backend_unavailable(err.to_string()));
        }
        drop(_guard);
        self.hub.broadcast_game(&game, false);
        self.process_events(&game, &events, 0);
        Ok(())
    }

    /// Handle a seat disconnecting: mark it and, when the room drains,
    /// drop or archive the key.
    pub async fn handle_disconnect(self: &Arc<Self>, room_id: &str, seat: Seat) {
        let lock = self.rooms.lock(room_id);
        let _guard = lock.lock().await;
        let Ok(mut game) = self.rooms.get_game(room_id).await else {
            return;
        };
        if let Some(Some(p)) = game.seats.get_mut(seat as usize) {
            p.connected = false;
        }
        let all_humans_gone = !game
            .seats
            .iter()
            .flatten()
            .any(|p| !p.is_bot && p.connected);
        if self.rooms.save_game(&game).await.is_err() {
            self.rooms.invalidate_cache(room_id);
        }
        drop(_guard);

        if all_humans_gone && self.hub.room_is_empty(room_id) {
            if game.phase == Phase::GameOver {
                if let Err(err) = self.rooms.archive_match(&game).await {
                    warn!(room_id, error = %err, "archive on empty room failed");
                }
            }
            // Otherwise the key ages out through its TTL.
        } else {
            self.hub.broadcast_game(&game, false);
        }
    }

    fn bot_line_for(
        &self,
        game: &Game,
        seat: Seat,
        origin: ActionOrigin,
        action: &GameAction,
    ) -> Option<BotLine> {
        if origin != ActionOrigin::Bot {
            return None;
        }
        let difficulty = game.player(seat)?.bot_difficulty?;
        let strategy = crate::bot::create_bot(difficulty);
        strategy.line_for(&crate::bot::BotContext { game, seat }, action)
    }
}

fn bot_name(difficulty: BotDifficulty) -> String {
    let base = match difficulty {
        BotDifficulty::Easy => "Faisal",
        BotDifficulty::Medium => "Mutaib",
        BotDifficulty::Hard => "Saqr",
        BotDifficulty::Khalid => "Khalid",
    };
    format!("{base} (bot)")
}
