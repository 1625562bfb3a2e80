//! Test helpers for generating unique test data
//!
//! Unique identifiers keep parallel test runs against a shared Redis
//! instance from colliding on room or player keys.

use uuid::Uuid;

/// Generate a unique string in the format `{prefix}-{uuid}`.
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Generate a unique room id for store tests.
pub fn unique_room_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a unique player name with the given prefix.
pub fn unique_player_name(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8])
}
