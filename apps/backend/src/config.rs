//! Server configuration from the environment.
//!
//! Production refuses to start without `JWT_SECRET`; `OFFLINE_MODE=1`
//! relaxes the auth requirement for local play against bots.

use std::env;

use crate::error::AppError;

pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_BIND_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub offline_mode: bool,
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub bind_port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let redis_host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let redis_port = match env::var("REDIS_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::config(format!("REDIS_PORT is not a port: {raw}")))?,
            Err(_) => DEFAULT_REDIS_PORT,
        };
        let offline_mode = env::var("OFFLINE_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        if !offline_mode && jwt_secret.is_none() {
            return Err(AppError::config(
                "JWT_SECRET must be set (or OFFLINE_MODE=1 for local play)",
            ));
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "null")
            .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
            .collect();

        let bind_port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::config(format!("PORT is not a port: {raw}")))?,
            Err(_) => DEFAULT_BIND_PORT,
        };

        Ok(ServerConfig {
            redis_host,
            redis_port,
            offline_mode,
            jwt_secret,
            cors_origins,
            bind_port,
        })
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    /// Whether connections must present a verified identity.
    pub fn auth_required(&self) -> bool {
        !self.offline_mode
    }
}
