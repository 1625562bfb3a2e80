//! RoomManager persistence against a live Redis.
//!
//! These need a reachable Redis (REDIS_HOST/REDIS_PORT or localhost) and
//! are ignored by default; run with `cargo test -- --ignored`.

mod common;

use backend_test_support::unique_helpers::unique_player_name;
use baloot_backend::domain::game::Phase;
use baloot_backend::store::{RoomManager, StoreError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn redis_url() -> String {
    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
    format!("redis://{host}:{port}")
}

async fn manager() -> RoomManager {
    RoomManager::connect(&redis_url())
        .await
        .expect("redis must be reachable for ignored store tests")
}

#[actix_web::test]
#[ignore = "requires redis"]
async fn create_save_load_round_trips() {
    let rooms = manager().await;
    let room_id = rooms.create_room().await.unwrap();

    let mut game = rooms.get_game(&room_id).await.unwrap();
    assert_eq!(game.phase, Phase::Waiting);

    // Mutate through a full seat-up, persist, and reload cold.
    let mut rng = ChaCha8Rng::seed_from_u64(777);
    for _ in 0..4 {
        let name = unique_player_name("it");
        game.join(&name, Some(&name), None, &mut rng).unwrap();
    }
    rooms.save_game(&game).await.unwrap();

    rooms.invalidate_cache(&room_id);
    let reloaded = rooms.get_game(&room_id).await.unwrap();
    assert_eq!(reloaded, game);
    assert!(reloaded.cards_conserved());

    rooms.delete_room(&room_id).await.unwrap();
}

#[actix_web::test]
#[ignore = "requires redis"]
async fn missing_room_is_not_found() {
    let rooms = manager().await;
    let err = rooms.get_game("no-such-room").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[actix_web::test]
#[ignore = "requires redis"]
async fn enumerate_sees_created_rooms() {
    let rooms = manager().await;
    let room_id = rooms.create_room().await.unwrap();
    let listed = rooms.enumerate_rooms().await.unwrap();
    assert!(listed.contains(&room_id));
    rooms.delete_room(&room_id).await.unwrap();
}

#[actix_web::test]
#[ignore = "requires redis"]
async fn archive_moves_the_key() {
    let rooms = manager().await;
    let room_id = rooms.create_room().await.unwrap();
    let game = rooms.get_game(&room_id).await.unwrap();

    let match_id = rooms.archive_match(&game).await.unwrap();
    assert!(!match_id.is_empty());
    let err = rooms.get_game(&room_id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[actix_web::test]
#[ignore = "requires redis"]
async fn corrupt_payload_is_a_decode_error() {
    use redis::AsyncCommands;

    let rooms = manager().await;
    let room_id = format!("corrupt-{}", unique_player_name("x"));

    let client = redis::Client::open(redis_url()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    conn.set_ex::<_, _, ()>(format!("game:{room_id}"), "{broken", 60)
        .await
        .unwrap();

    let err = rooms.get_game(&room_id).await.unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }));

    let _: () = conn.del(format!("game:{room_id}")).await.unwrap();
}
