//! Routing shim in front of the host application.
//!
//! `/projects/{projectId}/chat[...]` requests are rewritten to room-relative
//! paths and handed to that project's room. Everything else reaches the
//! host router untouched.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;

use crate::domain::ProjectId;

use super::state::AppState;

/// A request path that belongs to a project's chat room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoute {
    pub project_id: ProjectId,
    /// Path understood by the room router
    pub room_path: String,
}

impl ChatRoute {
    fn is_websocket(&self) -> bool {
        self.room_path == "/websocket"
    }
}

/// Maps `/projects/{id}/chat`, `/projects/{id}/chat/messages` and
/// `/projects/{id}/chat/unread/{userId}` onto room paths.
pub fn resolve_chat_route(path: &str) -> Option<ChatRoute> {
    let rest = path.strip_prefix("/projects/")?;
    let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();

    let room_path = match segments.as_slice() {
        [_, "chat"] => "/websocket".to_string(),
        [_, "chat", "messages"] => "/messages".to_string(),
        [_, "chat", "unread", user_id] if !user_id.is_empty() => format!("/unread/{}", user_id),
        _ => return None,
    };
    let project_id = segments[0].parse::<ProjectId>().ok()?;

    Some(ChatRoute {
        project_id,
        room_path,
    })
}

pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

fn rewrite_path(uri: &Uri, room_path: &str) -> Option<Uri> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", room_path, query),
        None => room_path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

/// Middleware that forwards chat requests to their room
pub async fn chat_shim(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }
    let Some(route) = resolve_chat_route(req.uri().path()) else {
        return next.run(req).await;
    };
    if route.is_websocket() && !is_websocket_upgrade(req.headers()) {
        return next.run(req).await;
    }
    let Some(uri) = rewrite_path(req.uri(), &route.room_path) else {
        return next.run(req).await;
    };

    let router = match state.directory.router(&route.project_id).await {
        Ok(router) => router,
        Err(e) => {
            tracing::error!("Cannot open room {}: {}", route.project_id, e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Chat room unavailable").into_response();
        }
    };

    tracing::debug!(
        "Forwarding {} to room {} as {}",
        req.uri().path(),
        route.project_id,
        route.room_path
    );
    *req.uri_mut() = uri;
    match router.oneshot(req).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    }
}
