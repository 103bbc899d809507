//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{DEFAULT_HISTORY_LIMIT, UserId},
    infrastructure::dto::http::{HistoryEntryDto, UnreadCountDto},
    ui::{room::RoomError, state::RoomContext},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

fn status_for(error: &RoomError) -> StatusCode {
    match error {
        RoomError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RoomError::RoomClosed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Latest messages of the room, oldest first, each with its read receipts
pub async fn get_history(
    State(state): State<Arc<RoomContext>>,
) -> Result<Json<Vec<HistoryEntryDto>>, StatusCode> {
    match state.room.history(DEFAULT_HISTORY_LIMIT).await {
        Ok(history) => {
            // Domain Model から DTO への変換
            Ok(Json(history.into_iter().map(HistoryEntryDto::from).collect()))
        }
        Err(e) => {
            tracing::error!(
                "Failed to load history of room {}: {}",
                state.room.project_id(),
                e
            );
            Err(status_for(&e))
        }
    }
}

pub async fn get_unread_count(
    State(state): State<Arc<RoomContext>>,
    Path(user_id): Path<String>,
) -> Result<Json<UnreadCountDto>, StatusCode> {
    let user_id = match user_id.parse::<UserId>() {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user id in unread path: '{}'", user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state.room.unread_count(user_id.clone()).await {
        Ok(count) => Ok(Json(UnreadCountDto { count })),
        Err(e) => {
            tracing::error!("Failed to read unread count of user {}: {}", user_id, e);
            Err(status_for(&e))
        }
    }
}
