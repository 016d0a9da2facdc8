// tests/live_socket_tests.rs

mod common;

use std::time::Duration;

use common::{HOST_ID, SECRET};
use futures_util::{SinkExt, StreamExt};
use livequiz::{
    live::roster,
    store::{LiveStore, MemoryStore},
    utils::jwt::sign_host_token,
};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(address: &str, pin: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws/live/{}", address, pin))
        .await
        .expect("Failed to open websocket");
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Next JSON frame, failing the test if none arrives in time.
async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Socket closed")
            .expect("Socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
        }
    }
}

/// Skips frames until one of type `kind` arrives.
async fn frame_of_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let frame = next_frame(socket).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

async fn open_game() -> (String, std::sync::Arc<MemoryStore>, String) {
    let (address, store) = common::spawn_app().await;
    let pin = store
        .create_session(common::QUIZ_ID, HOST_ID, 50)
        .await
        .expect("Failed to create session")
        .pin;
    (address, store, pin)
}

#[tokio::test]
async fn socket_round_trip_between_host_and_player() {
    let (address, store, pin) = open_game().await;
    let alice = roster::join(store.as_ref(), &pin, "Alice", 4).await.unwrap();

    let mut host = connect(&address, &pin).await;
    let token = sign_host_token(HOST_ID, &pin, SECRET, 60).unwrap();
    send(&mut host, json!({"action": "host_join", "host_token": token})).await;
    let connected = next_frame(&mut host).await;
    assert_eq!(connected["type"], "host_connected");
    assert_eq!(connected["session_pin"], pin.as_str());
    assert_eq!(connected["players"][0]["nickname"], "Alice");

    let mut player = connect(&address, &pin).await;
    player.send(Message::Text("not json at all".into())).await.unwrap();
    send(&mut player, json!({"action": "dance"})).await;
    send(
        &mut player,
        json!({"action": "player_join", "player_id": alice.id, "nickname": "Alice", "avatar_id": 4}),
    )
    .await;

    // Undecodable frames produced nothing, so the join is the first thing either side sees.
    let joined = next_frame(&mut player).await;
    assert_eq!(joined["type"], "player_joined");
    let joined = next_frame(&mut host).await;
    assert_eq!(joined, json!({"type": "player_joined", "player_id": alice.id, "nickname": "Alice", "avatar_id": 4}));

    send(&mut host, json!({"action": "start_game"})).await;
    let shown = frame_of_type(&mut player, "show_question").await;
    assert_eq!(shown["question"]["index"], 0);
    assert!(shown["question"].get("correct_option").is_none());

    send(
        &mut player,
        json!({"action": "submit_answer", "player_id": alice.id, "selected_option": null, "time_taken": 3}),
    )
    .await;
    let result = frame_of_type(&mut player, "answer_result").await;
    assert_eq!(result["points_earned"], 0);
    assert_eq!(result["is_correct"], false);

    send(&mut host, json!({"action": "show_results"})).await;
    let host_results = frame_of_type(&mut host, "question_results").await;
    assert_eq!(host_results["results"]["correct_option"], "A");
    let player_results = frame_of_type(&mut player, "question_results").await;
    assert!(player_results["results"].get("correct_option").is_none());

    player.close(None).await.unwrap();
    let left = frame_of_type(&mut host, "player_left").await;
    assert_eq!(left["player_id"], alice.id);
}

#[tokio::test]
async fn player_cannot_take_host_role_without_token() {
    let (address, _store, pin) = open_game().await;

    let mut impostor = connect(&address, &pin).await;
    send(&mut impostor, json!({"action": "host_join"})).await;
    send(&mut impostor, json!({"action": "player_ready", "player_id": 1})).await;

    // The rejected host_join sends nothing; the resync is the only reply.
    let reply = next_frame(&mut impostor).await;
    assert_eq!(reply, json!({"type": "sync_current_state", "status": "LOBBY"}));
}
