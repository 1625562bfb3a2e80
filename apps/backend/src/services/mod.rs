//! Service layer: the ingress pipeline, bot scheduling and timers.
//!
//! `GameService` bridges the pure domain with Redis and the socket hub.
//! Its implementation is split across `action_handler` (validate → lock →
//! dispatch → persist → broadcast) and `bot_scheduler` (bot turns, epoch-
//! guarded timers, the auto-restart latch).

pub mod action_handler;
pub mod bot_scheduler;
pub mod professor;

use std::sync::Arc;

use dashmap::DashMap;

use crate::store::RoomManager;
use crate::ws::hub::GameHub;

pub use action_handler::{ActionContext, ActionOrigin};

pub struct GameService {
    pub(crate) rooms: Arc<RoomManager>,
    pub(crate) hub: Arc<GameHub>,
    /// Per-room auto-restart latch: present while a restart is in flight.
    pub(crate) restart_latches: DashMap<String, ()>,
}

impl GameService {
    pub fn new(rooms: Arc<RoomManager>, hub: Arc<GameHub>) -> Arc<Self> {
        Arc::new(GameService {
            rooms,
            hub,
            restart_latches: DashMap::new(),
        })
    }

    pub fn rooms(&self) -> &Arc<RoomManager> {
        &self.rooms
    }

    pub fn hub(&self) -> &Arc<GameHub> {
        &self.hub
    }
}
