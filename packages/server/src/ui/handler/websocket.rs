//! WebSocket connection handler.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    config::SessionLimits,
    domain::{Identity, Session, SessionId, UserId},
    ui::{room::RoomHandle, state::RoomContext},
};

/// Header carrying the authenticated user id set by the host's auth layer
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's display name
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Reads the identity forwarded by the auth layer.
///
/// Returns `Ok(None)` for anonymous requests and `Err` when the id header is
/// present but not a valid user id.
fn identity_from_headers(headers: &HeaderMap) -> Result<Option<Identity>, String> {
    let Some(raw_id) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw_id = raw_id.to_str().map_err(|e| e.to_string())?;
    let id = raw_id.parse::<UserId>().map_err(|e| e.to_string())?;
    let username = headers
        .get(USER_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());

    Ok(Some(Identity { id, username }))
}

pub async fn websocket_handler(
    State(state): State<Arc<RoomContext>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!("Rejected non-upgrade chat request: {}", rejection);
            return (StatusCode::UPGRADE_REQUIRED, "Expected Upgrade: websocket").into_response();
        }
    };

    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Invalid {} header: {}", USER_ID_HEADER, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // The session is registered before the 101 response goes out
    let session = Session::new(identity);
    let session_id = session.id;
    let rx = match state.room.join(session).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::warn!(
                "Room {} refused session {}: {}",
                state.room.project_id(),
                session_id,
                e
            );
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let room = state.room.clone();
    let room_on_failure = state.room.clone();
    let limits = state.limits;

    ws.max_message_size(limits.transport_limit())
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for session {} failed: {}", session_id, e);
            tokio::spawn(async move {
                let _ = room_on_failure.leave(session_id).await;
            });
        })
        .on_upgrade(move |socket| handle_socket(socket, room, session_id, rx, limits))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Between messages it pings the client every `ping_interval`. The task ends
/// when the room drops the session's queue or the socket stops accepting
/// writes.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    ping_interval: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut pings = ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let outgoing = tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => Message::Text(msg.into()),
                    None => break,
                },
                _ = next_ping(&mut pings) => Message::Ping(Bytes::new()),
            };
            if sender.send(outgoing).await.is_err() {
                break;
            }
        }
    })
}

async fn next_ping(pings: &mut Option<Interval>) {
    match pings {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn handle_socket(
    socket: WebSocket,
    room: RoomHandle,
    session_id: SessionId,
    rx: mpsc::Receiver<String>,
    limits: SessionLimits,
) {
    let (sender, mut receiver) = socket.split();
    let idle_timeout = limits.idle_timeout;
    let room_for_frames = room.clone();

    // Spawn a task to forward this client's frames to the room
    let mut recv_task = tokio::spawn(async move {
        loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, receiver.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::info!("Session {} idle for {:?}, closing", session_id, limit);
                        break;
                    }
                },
                None => receiver.next().await,
            };

            let msg = match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error on session {}: {}", session_id, e);
                    break;
                }
                None => break,
            };

            match msg {
                Message::Text(text) if text.len() > limits.max_frame_bytes => {
                    tracing::warn!(
                        "Dropped {} byte frame from session {} (limit {})",
                        text.len(),
                        session_id,
                        limits.max_frame_bytes
                    );
                }
                Message::Text(text) => {
                    tracing::debug!("Received frame from {}: {}", session_id, text);
                    if room_for_frames
                        .submit_frame(session_id, text.to_string())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Message::Binary(_) => {
                    tracing::warn!("Dropped binary frame from session {}", session_id);
                }
                Message::Close(_) => {
                    tracing::debug!("Session {} requested close", session_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender, limits.ping_interval());

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if let Err(e) = room.leave(session_id).await {
        tracing::warn!("Failed to unregister session {}: {}", session_id, e);
    }
}
