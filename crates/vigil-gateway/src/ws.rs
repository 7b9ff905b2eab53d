// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket endpoint: the hub client's read and write pumps.
//!
//! The write pump drains the client's bounded buffer, coalescing queued
//! frames into one message, and pings on a fixed cadence. The read pump
//! enforces the frame size limit and the pong deadline, and answers the
//! `ping`/`subscribe`/`unsubscribe` control messages. Either pump exiting
//! unregisters the client.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use vigil_hub::client::{ClientReceiver, MAX_MESSAGE_SIZE, PING_PERIOD, PONG_WAIT};
use vigil_hub::{Client, Hub, MessageType, WsMessage};

use crate::server::AppState;

/// Optional identity attached during the handshake.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub role: Option<String>,
}

/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

async fn handle_socket(socket: WebSocket, state: AppState, query: WsQuery) {
    let (sink, stream) = socket.split();
    let role = query.role.unwrap_or_else(|| "viewer".to_string());
    let (client, receiver) = Client::new(query.user_id, role);

    state.hub.register(client.clone());

    let writer = tokio::spawn(write_pump(sink, receiver));
    read_pump(state.hub.clone(), client, stream).await;
    let _ = writer.await;
}

/// Pushes buffered frames to the socket and pings every [`PING_PERIOD`].
async fn write_pump(mut sink: SplitSink<WebSocket, Message>, mut receiver: ClientReceiver) {
    let mut ping = tokio::time::interval(PING_PERIOD);
    ping.tick().await; // skip the immediate first tick

    loop {
        tokio::select! {
            maybe = receiver.outbound.recv() => {
                let Some(frame) = maybe else {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                };

                // Coalesce whatever else is queued into the same message.
                let mut data = frame;
                while let Ok(next) = receiver.outbound.try_recv() {
                    data.push(b'\n');
                    data.extend_from_slice(&next);
                }

                let text = String::from_utf8_lossy(&data).into_owned();
                if sink.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            _ = ping.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    return;
                }
            }
            _ = receiver.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
        }
    }
}

/// Reads frames until the socket errors, closes, breaks the size limit, or
/// misses the pong deadline, then unregisters the client.
///
/// Only a pong advances the read deadline; text or ping traffic from a
/// client that never answers the server's pings does not keep the
/// connection alive.
async fn read_pump(hub: Arc<Hub>, client: Arc<Client>, mut stream: SplitStream<WebSocket>) {
    let mut deadline = tokio::time::Instant::now() + PONG_WAIT;

    loop {
        let shutdown = client.shutdown_token();
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = tokio::time::timeout_at(deadline, stream.next()) => frame,
        };

        // Deadline elapsed without a pong.
        let Ok(next) = frame else {
            warn!(client_id = %client.id(), "websocket pong deadline exceeded");
            break;
        };
        let Some(Ok(message)) = next else { break };

        match message {
            Message::Text(text) => {
                if text.len() > MAX_MESSAGE_SIZE {
                    warn!(client_id = %client.id(), size = text.len(), "websocket frame too large");
                    break;
                }
                handle_client_message(&client, text.as_str());
            }
            Message::Pong(_) => {
                deadline = tokio::time::Instant::now() + PONG_WAIT;
            }
            Message::Ping(_) | Message::Binary(_) => {}
            Message::Close(_) => break,
        }
    }

    hub.unregister(client.id());
    client.close();
}

fn handle_client_message(client: &Client, text: &str) {
    let message: WsMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(client_id = %client.id(), error = %err, "failed to parse websocket message");
            return;
        }
    };

    let reply = match message.message_type {
        MessageType::Ping => WsMessage::pong(),
        MessageType::Subscribe => WsMessage::subscribed(message.channel),
        MessageType::Unsubscribe => WsMessage::unsubscribed(message.channel),
        other => {
            debug!(client_id = %client.id(), message_type = ?other, "unknown message type");
            return;
        }
    };

    if let Ok(frame) = serde_json::to_vec(&reply) {
        client.send(&frame);
    }
}
