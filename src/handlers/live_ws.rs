// src/handlers/live_ws.rs

use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::{
    live::{Connection, LiveEngine},
    models::message::{ClientMessage, ServerMessage},
};

/// Upgrades to the live session socket for `pin`.
///
/// The socket carries no identity; the first `host_join` or
/// `player_join`/`player_ready` decides the role.
pub async fn live_socket(
    ws: WebSocketUpgrade,
    State(engine): State<LiveEngine>,
    Path(pin): Path<String>,
) -> impl IntoResponse {
    tracing::debug!(pin = %pin, "setting up live websocket");
    ws.on_upgrade(move |socket| handle_socket(socket, engine, pin))
}

async fn handle_socket(socket: WebSocket, engine: LiveEngine, pin: String) {
    // By splitting socket we can send and receive at the same time.
    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (mut conn, mut fanout) = Connection::open(engine, pin, outbox);

    loop {
        let outgoing = tokio::select! {
            Some(msg) = outbox_rx.recv() => msg,
            fanned = fanout.recv() => match fanned {
                Ok(msg) => conn.outbound(&msg),
                Err(RecvError::Lagged(skipped)) => {
                    // Client catches up with `player_ready`.
                    tracing::warn!(pin = %conn.pin(), skipped, "live socket lagging behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => {
                let Some(Ok(message)) = incoming else {
                    break;
                };
                match message {
                    Message::Text(text) => dispatch(&mut conn, text.as_str()).await,
                    Message::Close(_) => break,
                    _ => {}
                }
                continue;
            }
        };

        let payload = match serde_json::to_string(&outgoing) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(error = %error, "failed to encode live message");
                continue;
            }
        };
        if let Err(error) = sender.send(Message::Text(payload.into())).await {
            tracing::debug!(error = %error, "live socket send failed");
            break;
        }
    }

    drop(fanout);
    conn.close().await;
}

async fn dispatch(conn: &mut Connection, text: &str) {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(error) => {
            tracing::debug!(pin = %conn.pin(), error = %error, "ignoring unrecognised live message");
            return;
        }
    };

    if let Err(error) = conn.handle(msg).await {
        tracing::warn!(pin = %conn.pin(), error = %error, "live action rejected");
    }
}
