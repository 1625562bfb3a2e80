//! Redis-backed room store with an in-process cache of live `Game`s.
//!
//! Redis holds the canonical state (`game:<roomId>` → JSON); the cache is
//! only ever updated from a successful Redis read or write, so a failed
//! save can never leave the cache ahead of the store.

use std::sync::Arc;

use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::game::Game;

/// Session durability window for an active room.
const GAME_KEY_TTL_SECS: u64 = 24 * 60 * 60;
/// Archived matches are kept a week.
const ARCHIVE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub fn game_key(room_id: &str) -> String {
    format!("game:{room_id}")
}

pub fn match_key(match_id: &str) -> String {
    format!("match:{match_id}")
}

/// Why a stored game failed to decode. Distinct kinds let the caller
/// decide between retry (connectivity) and give-up (corrupt data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    Syntax,
    MissingField,
    TypeMismatch,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("room {room_id} not found")]
    NotFound { room_id: String },
    #[error("stored game failed to decode ({kind:?}): {detail}")]
    Decode { kind: DecodeKind, detail: String },
    #[error("redis unavailable: {detail}")]
    Connectivity { detail: String },
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Connectivity {
            detail: err.to_string(),
        }
    }
}

fn classify_decode(err: &serde_json::Error) -> DecodeKind {
    if !err.is_data() {
        return DecodeKind::Syntax;
    }
    if err.to_string().starts_with("missing field") {
        DecodeKind::MissingField
    } else {
        DecodeKind::TypeMismatch
    }
}

/// Archived-match envelope: the full round history plus when it closed.
#[derive(Serialize)]
struct MatchArchive<'a> {
    game: &'a Game,
    #[serde(with = "time::serde::timestamp")]
    archived_at: OffsetDateTime,
}

pub struct RoomManager {
    redis: ConnectionManager,
    cache: DashMap<String, Game>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RoomManager {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|err| StoreError::Connectivity {
            detail: format!("invalid redis url: {err}"),
        })?;
        let redis = ConnectionManager::new(client).await?;
        Ok(RoomManager {
            redis,
            cache: DashMap::new(),
            locks: DashMap::new(),
        })
    }

    pub fn from_manager(redis: ConnectionManager) -> Self {
        RoomManager {
            redis,
            cache: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// The per-room mutation lock. Non-reentrant; held across load →
    /// dispatch → save, released before broadcast.
    pub fn lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create an empty waiting room and persist it.
    pub async fn create_room(&self) -> Result<String, StoreError> {
        let room_id = Uuid::new_v4().to_string();
        let game = Game::new(room_id.clone());
        self.save_game(&game).await?;
        info!(%room_id, "room created");
        Ok(room_id)
    }

    /// Cache-through load. Never returns a partially-populated game: a
    /// decode failure surfaces as an error, not a default.
    pub async fn get_game(&self, room_id: &str) -> Result<Game, StoreError> {
        if let Some(game) = self.cache.get(room_id) {
            return Ok(game.clone());
        }
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(game_key(room_id)).await?;
        let Some(raw) = raw else {
            return Err(StoreError::NotFound {
                room_id: room_id.to_string(),
            });
        };
        let game: Game = serde_json::from_str(&raw).map_err(|err| StoreError::Decode {
            kind: classify_decode(&err),
            detail: err.to_string(),
        })?;
        self.cache.insert(room_id.to_string(), game.clone());
        Ok(game)
    }

    /// Serialize and persist; the cache is updated only after the write
    /// lands, preventing split-brain when Redis fails.
    pub async fn save_game(&self, game: &Game) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(game).map_err(|err| StoreError::Decode {
            kind: DecodeKind::Syntax,
            detail: format!("failed to serialize game: {err}"),
        })?;
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(game_key(&game.room_id), encoded, GAME_KEY_TTL_SECS)
            .await?;
        self.cache.insert(game.room_id.clone(), game.clone());
        Ok(())
    }

    /// Drop the cached copy after a failed save so the next load refetches
    /// the authoritative state.
    pub fn invalidate_cache(&self, room_id: &str) {
        self.cache.remove(room_id);
    }

    /// Cursor-based room enumeration. Never issues a blocking `KEYS`.
    pub async fn enumerate_rooms(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.redis.clone();
        let mut rooms = Vec::new();
        let mut iter = conn.scan_match::<_, String>("game:*").await?;
        while let Some(key) = iter.next_item().await {
            let key = key?;
            if let Some(room_id) = key.strip_prefix("game:") {
                rooms.push(room_id.to_string());
            }
        }
        Ok(rooms)
    }

    /// Archive a finished match under `match:<uuid>` and drop the live key.
    pub async fn archive_match(&self, game: &Game) -> Result<String, StoreError> {
        let match_id = Uuid::new_v4().to_string();
        let record = MatchArchive {
            game,
            archived_at: OffsetDateTime::now_utc(),
        };
        let encoded = serde_json::to_string(&record).map_err(|err| StoreError::Decode {
            kind: DecodeKind::Syntax,
            detail: format!("failed to serialize archive: {err}"),
        })?;
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(match_key(&match_id), encoded, ARCHIVE_TTL_SECS)
            .await?;
        self.delete_room(&game.room_id).await?;
        info!(room_id = %game.room_id, match_id, "match archived");
        Ok(match_id)
    }

    pub async fn delete_room(&self, room_id: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        if let Err(err) = conn.del::<_, ()>(game_key(room_id)).await {
            warn!(room_id, error = %err, "failed to delete room key");
            return Err(err.into());
        }
        self.cache.remove(room_id);
        self.locks.remove(room_id);
        Ok(())
    }

    /// Connectivity probe for the health endpoint.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(StoreError::from)
    }

    pub fn cached_room_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(game_key("abc"), "game:abc");
        assert_eq!(match_key("xyz"), "match:xyz");
    }

    #[test]
    fn decode_classification_distinguishes_kinds() {
        let syntax = serde_json::from_str::<Game>("{not json").unwrap_err();
        assert_eq!(classify_decode(&syntax), DecodeKind::Syntax);

        let missing = serde_json::from_str::<Game>("{}").unwrap_err();
        assert_eq!(classify_decode(&missing), DecodeKind::MissingField);

        let mismatch =
            serde_json::from_str::<Game>(r#"{"room_id": 7}"#).unwrap_err();
        assert_eq!(classify_decode(&mismatch), DecodeKind::TypeMismatch);
    }
}
