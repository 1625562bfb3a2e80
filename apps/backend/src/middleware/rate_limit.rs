//! HTTP-surface rate limiting configuration.
//!
//! The per-connection game-action limiter lives inside the socket session
//! (and fails closed); this covers the HTTP endpoints, i.e. the upgrade
//! handshake and health checks.

use std::time::Duration;

use actix_extensible_rate_limit::backend::SimpleInputFunctionBuilder;

/// General API limiting: 100 per 60 seconds per IP.
pub fn api_rate_limit_config() -> SimpleInputFunctionBuilder {
    SimpleInputFunctionBuilder::new(Duration::from_secs(60), 100).real_ip_key()
}
