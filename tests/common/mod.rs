// tests/common/mod.rs

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use livequiz::{
    config::{Config, LiveSettings},
    live::LiveEngine,
    routes,
    state::AppState,
    models::question::{OptionLabel, Question, Quiz},
    store::{LiveStore, MemoryStore},
};

pub const SECRET: &str = "test_secret_for_integration_tests";
pub const HOST_ID: i64 = 7;
pub const QUIZ_ID: i64 = 1;

fn question(id: i64, text: &str, correct_option: OptionLabel, time_limit: i32, position: i32) -> Question {
    Question {
        id,
        quiz_id: QUIZ_ID,
        text: text.to_string(),
        image: None,
        option_a: "Paris".to_string(),
        option_b: "Rome".to_string(),
        option_c: "Oslo".to_string(),
        option_d: "Bern".to_string(),
        correct_option,
        time_limit,
        position,
    }
}

/// Store holding a two-question quiz owned by `HOST_ID`:
/// Q1 answer A with 20s, Q2 answer C with 10s.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_quiz(
            Quiz {
                id: QUIZ_ID,
                title: "World Capitals".to_string(),
                creator_id: HOST_ID,
            },
            vec![
                question(10, "Capital of France?", OptionLabel::A, 20, 0),
                question(11, "Capital of Norway?", OptionLabel::C, 10, 1),
            ],
        )
        .await;
    store
}

pub fn settings(require_host_token: bool) -> LiveSettings {
    LiveSettings {
        max_players: 50,
        start_delay: Duration::ZERO,
        require_host_token,
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        live: settings(true),
    }
}

/// Router over a seeded in-memory store, as `main` wires it.
pub async fn test_app() -> (axum::Router, Arc<MemoryStore>) {
    let store = seeded_store().await;
    let config = test_config();
    let engine = LiveEngine::new(store.clone(), config.live.clone(), &config.jwt_secret);
    (routes::create_router(AppState { engine, config }), store)
}

/// Spawns the app on a random port for testing.
/// Returns the base address (e.g., "127.0.0.1:12345") and the store
/// behind it.
pub async fn spawn_app() -> (String, Arc<MemoryStore>) {
    let (app, store) = test_app().await;

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = listener.local_addr().expect("Failed to read local address").to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    (address, store)
}

/// Engine over a seeded store plus the PIN of a fresh LOBBY session.
pub async fn engine_with_session(require_host_token: bool) -> (LiveEngine, Arc<MemoryStore>, String) {
    engine_with_settings(settings(require_host_token)).await
}

pub async fn engine_with_settings(settings: LiveSettings) -> (LiveEngine, Arc<MemoryStore>, String) {
    let store = seeded_store().await;
    let pin = store
        .create_session(QUIZ_ID, HOST_ID, 50)
        .await
        .expect("Failed to create session")
        .pin;
    let engine = LiveEngine::new(store.clone(), settings, SECRET);
    (engine, store, pin)
}
