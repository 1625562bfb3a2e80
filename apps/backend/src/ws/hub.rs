//! Per-room session registry and rotated broadcast fan-out.
//!
//! Sessions register under their room with an optional bound seat; every
//! broadcast builds one rotated state per recipient so a client always
//! sees itself at Bottom. The state is captured while the room lock is
//! held; delivery happens after release via actix mailboxes.

use std::sync::atomic::{AtomicUsize, Ordering};

use actix::prelude::*;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bot::BotLine;
use crate::domain::game::Game;
use crate::domain::player::Seat;
use crate::domain::view::{client_state, rotate};
use crate::ws::protocol::ServerMsg;

/// Outbound push, delivered to a session actor's mailbox.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Outbound(pub ServerMsg);

struct SessionHandle {
    seat: Option<Seat>,
    recipient: Recipient<Outbound>,
}

type RoomSessions = DashMap<Uuid, SessionHandle>;

pub struct GameHub {
    rooms: DashMap<String, RoomSessions>,
    active_connections: AtomicUsize,
}

impl GameHub {
    pub fn new() -> Self {
        GameHub {
            rooms: DashMap::new(),
            active_connections: AtomicUsize::new(0),
        }
    }

    pub fn register(&self, room_id: &str, conn_id: Uuid, recipient: Recipient<Outbound>) {
        let entry = self.rooms.entry(room_id.to_string()).or_default();
        entry.insert(
            conn_id,
            SessionHandle {
                seat: None,
                recipient,
            },
        );
        let active = self.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
        info!(room_id, %conn_id, active_connections = active, "session registered");
    }

    /// Bind a connection to the seat it joined as.
    pub fn bind_seat(&self, room_id: &str, conn_id: Uuid, seat: Seat) {
        if let Some(entry) = self.rooms.get(room_id) {
            if let Some(mut handle) = entry.get_mut(&conn_id) {
                handle.seat = Some(seat);
                return;
            }
        }
        warn!(room_id, %conn_id, "bind_seat for unknown connection");
    }

    pub fn unregister(&self, room_id: &str, conn_id: Uuid) {
        let now_empty = match self.rooms.get_mut(room_id) {
            Some(entry) => {
                let was_present = entry.remove(&conn_id).is_some();
                if was_present {
                    let prev = self.active_connections.load(Ordering::Relaxed);
                    if prev > 0 {
                        self.active_connections.fetch_sub(1, Ordering::Relaxed);
                    }
                }
                entry.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove(room_id);
        }
    }

    pub fn room_is_empty(&self, room_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|entry| entry.is_empty())
            .unwrap_or(true)
    }

    /// Fan out the post-action state: one rotated payload per recipient.
    /// Spectators get the Bottom-seat perspective with the hand hidden.
    pub fn broadcast_game(&self, game: &Game, started: bool) {
        let Some(entry) = self.rooms.get(&game.room_id) else {
            return;
        };
        for handle in entry.iter() {
            let state = match handle.value().seat {
                Some(seat) => client_state(game, seat),
                None => {
                    let mut state = client_state(game, 0);
                    if let Some(me) = state.players.get_mut(0) {
                        me.hand = None;
                    }
                    state
                }
            };
            let msg = if started {
                ServerMsg::GameStart { game_state: state }
            } else {
                ServerMsg::GameUpdate { game_state: state }
            };
            handle.value().recipient.do_send(Outbound(msg));
        }
    }

    /// Push a dialogue line, rotating the speaking seat per recipient.
    pub fn broadcast_bot_speak(&self, room_id: &str, seat: Seat, line: &BotLine) {
        let Some(entry) = self.rooms.get(room_id) else {
            return;
        };
        for handle in entry.iter() {
            let viewer = handle.value().seat.unwrap_or(0);
            handle.value().recipient.do_send(Outbound(ServerMsg::BotSpeak {
                player_index: rotate(seat, viewer),
                text: line.text.clone(),
                emotion: line.emotion.clone(),
            }));
        }
    }

    pub fn active_connections_count(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}

impl Default for GameHub {
    fn default() -> Self {
        Self::new()
    }
}
