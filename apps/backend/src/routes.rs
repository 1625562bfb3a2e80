use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::app_state::AppState;
use crate::ws::session;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/ws", web::get().to(session::upgrade));
}

/// Liveness plus Redis reachability; degraded mode still answers 200 so
/// load balancers keep the node while Redis blips.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    let redis_ok = state.service.rooms().ping().await.is_ok();
    HttpResponse::Ok().json(json!({
        "status": if redis_ok { "ok" } else { "degraded" },
        "redis": redis_ok,
        "activeConnections": state.service.hub().active_connections_count(),
        "cachedRooms": state.service.rooms().cached_room_count(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
