//! WebSocket streaming of engine events.
//!
//! Each connection first receives the current snapshot, then every event the
//! engine publishes. `?kinds=ENTER,EXIT` limits the stream to those kinds.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use hazard_core::EventKind;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    kinds: Option<String>,
}

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsQuery>,
) -> axum::response::Response {
    let filter = match params.kinds.as_deref().map(parse_kinds).transpose() {
        Ok(filter) => filter,
        Err(bad) => {
            return (StatusCode::BAD_REQUEST, format!("unknown event kind '{bad}'")).into_response()
        }
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, filter))
        .into_response()
}

fn parse_kinds(raw: &str) -> Result<Vec<EventKind>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            serde_json::from_value(json!(s.to_ascii_uppercase())).map_err(|_| s.to_string())
        })
        .collect()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, filter: Option<Vec<EventKind>>) {
    let mut rx = state.tx.subscribe();

    let hello = json!({ "kind": "SNAPSHOT", "payload": state.snapshot() }).to_string();
    if socket.send(Message::Text(hello)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(msg) => {
                        if let Some(kinds) = filter.as_deref() {
                            if !kinds.contains(&msg.kind) {
                                continue;
                            }
                        }
                        if socket.send(Message::Text(msg.payload.as_ref().to_owned())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Stream client lagged, skipped {} event(s)", skipped);
                        continue;
                    }
                    Err(_) => break,
                }
            }
        }
    }
}
