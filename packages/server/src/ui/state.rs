//! Shared handler state.

use std::sync::Arc;

use crate::config::SessionLimits;

use super::room::{RoomDirectory, RoomHandle};

/// State of the host application router
pub struct AppState {
    /// RoomDirectory（プロジェクト ID からルームとそのルーターへの解決）
    pub directory: Arc<RoomDirectory>,
}

/// State of one room's router
pub struct RoomContext {
    pub room: RoomHandle,
    pub limits: SessionLimits,
}
