#![deny(clippy::wildcard_imports)]

use std::sync::Arc;

use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_extensible_rate_limit::RateLimiter;
use actix_web::{web, App, HttpServer};
use baloot_backend::config::ServerConfig;
use baloot_backend::middleware::cors::cors_middleware;
use baloot_backend::middleware::rate_limit;
use baloot_backend::routes;
use baloot_backend::services::GameService;
use baloot_backend::state::app_state::AppState;
use baloot_backend::store::RoomManager;
use baloot_backend::telemetry;
use baloot_backend::ws::GameHub;

const EXIT_CONFIG: i32 = 1;
const EXIT_REDIS: i32 = 2;
const EXIT_BIND: i32 = 3;

#[actix_web::main]
async fn main() {
    telemetry::init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ configuration error: {err}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    let rooms = match RoomManager::connect(&config.redis_url()).await {
        Ok(rooms) => Arc::new(rooms),
        Err(err) => {
            eprintln!("❌ redis unreachable at {}: {err}", config.redis_url());
            std::process::exit(EXIT_REDIS);
        }
    };
    if let Err(err) = rooms.ping().await {
        eprintln!("❌ redis unreachable at {}: {err}", config.redis_url());
        std::process::exit(EXIT_REDIS);
    }

    let hub = Arc::new(GameHub::new());
    let service = GameService::new(rooms, hub);
    let app_state = web::Data::new(AppState::new(service, config.clone()));

    println!(
        "🚀 Baloot backend listening on http://127.0.0.1:{}",
        config.bind_port
    );

    let origins = config.cors_origins.clone();
    let limiter_backend = InMemoryBackend::builder().build();
    let server = HttpServer::new(move || {
        let limiter_input = rate_limit::api_rate_limit_config().build();
        let limiter = RateLimiter::builder(limiter_backend.clone(), limiter_input)
            .add_headers()
            .build();
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(limiter)
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", config.bind_port));

    let server = match server {
        Ok(server) => server,
        Err(err) => {
            eprintln!("❌ could not bind port {}: {err}", config.bind_port);
            std::process::exit(EXIT_BIND);
        }
    };

    if let Err(err) = server.run().await {
        eprintln!("❌ server error: {err}");
        std::process::exit(1);
    }
}
