use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::GameService;

/// Application state shared by every connection: the game service (room
/// store + hub + scheduler) and the resolved configuration.
pub struct AppState {
    pub service: Arc<GameService>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(service: Arc<GameService>, config: ServerConfig) -> Self {
        Self { service, config }
    }
}
