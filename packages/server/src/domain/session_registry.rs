//! Session registry port
//!
//! Tracks the live connections of one room and fans events out to them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{RoomEvent, SessionId};

/// Bounded outbound queue feeding one session's socket writer
pub type SessionChannel = mpsc::Sender<String>;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn register(&self, session_id: SessionId, channel: SessionChannel);

    /// Returns `false` if the session was not registered.
    async fn unregister(&self, session_id: &SessionId) -> bool;

    /// Serialize `event` once and queue it for every open session except
    /// `exclude`. A failed send is logged and does not stop the loop.
    async fn broadcast(&self, event: &RoomEvent, exclude: Option<&SessionId>) -> BroadcastReport;

    async fn count(&self) -> usize;
}
