//! HTTP surface of a single room, addressed with room-relative paths.

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::{
    config::SessionLimits,
    ui::{
        handler::{get_history, get_unread_count, not_found, websocket_handler},
        state::RoomContext,
    },
};

use super::actor::RoomHandle;

/// Routes served by one room:
///
/// - `GET /websocket` upgrades to a chat session (426 without `Upgrade`)
/// - `GET /messages` returns the history window with read receipts
/// - `GET /unread/{user_id}` returns `{"count": n}`
/// - anything else is 404
pub fn room_router(room: RoomHandle, limits: SessionLimits) -> Router {
    let state = Arc::new(RoomContext { room, limits });

    Router::new()
        .route("/websocket", get(websocket_handler))
        .route("/messages", get(get_history))
        .route("/unread/{user_id}", get(get_unread_count))
        .fallback(not_found)
        .with_state(state)
}
