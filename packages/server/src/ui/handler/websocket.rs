//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

use crate::{
    domain::UserId,
    hub::{Connection, ConnectionEndpoint, ConnectionId, ConnectionState, HubHandle, SharedState},
    ui::{auth::current_user, state::AppState},
};

/// Upgrade an authenticated request to a live connection.
///
/// Requests without a valid session cookie are rejected with `401` and never
/// reach the hub.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(user_id) = current_user(state.sessions.as_ref(), &headers).await else {
        tracing::warn!("Rejecting unauthenticated WebSocket upgrade");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let max_message_size = state.config.max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Spawns a task that drains the connection's outbound queue into the WebSocket sender.
///
/// Also sends a keepalive ping every `ping_period`. When the hub closes the
/// queue (slow consumer or shutdown) a Close frame is sent before exiting.
fn pusher_loop(
    mut outbound: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    connection_state: SharedState,
    ping_period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ping = tokio::time::interval_at(Instant::now() + ping_period, ping_period);

        loop {
            tokio::select! {
                msg = outbound.recv() => {
                    let Some(msg) = msg else {
                        if connection_state.get() == ConnectionState::Closed {
                            let frame = CloseFrame {
                                code: close_code::POLICY,
                                reason: Utf8Bytes::from_static("connection closed by server"),
                            };
                            let _ = sender.send(Message::Close(Some(frame))).await;
                        }
                        break;
                    };
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Spawns a task that submits every inbound frame to the hub on behalf of `user_id`.
///
/// Ends on close, transport error, or when nothing (not even a pong) arrives
/// within `pong_wait`.
fn reader_loop(
    mut receiver: SplitStream<WebSocket>,
    hub: HubHandle,
    pong_wait: Duration,
    connection_id: ConnectionId,
    user_id: UserId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let msg = match tokio::time::timeout(pong_wait, receiver.next()).await {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(e))) => {
                    tracing::debug!("WebSocket error on {}: {}", connection_id, e);
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "No traffic from {} within {:?}; treating peer as dead",
                        connection_id,
                        pong_wait
                    );
                    break;
                }
            };

            match msg {
                Message::Text(text) => hub.submit(user_id, text.as_str()),
                Message::Binary(data) => hub.submit(user_id, data.to_vec()),
                Message::Ping(_) | Message::Pong(_) => {
                    tracing::trace!("Keepalive from {}", connection_id);
                }
                Message::Close(_) => {
                    tracing::debug!("Connection {} requested close", connection_id);
                    break;
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (connection, endpoint) = Connection::open(user_id, state.config.outbound_queue_capacity);
    let ConnectionEndpoint {
        id,
        outbound,
        state: connection_state,
        ..
    } = endpoint;

    state.hub.register(connection);
    tracing::info!("User {} connected ({})", user_id, id);

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(
        outbound,
        sender,
        connection_state.clone(),
        state.config.ping_period,
    );
    let mut recv_task = reader_loop(
        receiver,
        state.hub.clone(),
        state.config.pong_wait,
        id,
        user_id,
    );

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    connection_state.begin_closing();
    state.hub.unregister(id);
    tracing::info!("User {} disconnected ({})", user_id, id);
}
