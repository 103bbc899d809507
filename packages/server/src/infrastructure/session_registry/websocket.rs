//! WebSocket を使った SessionRegistry 実装
//!
//! ## 責務
//!
//! - セッションごとの送信キュー（bounded `mpsc::Sender`）を管理
//! - `RoomEvent` を一度だけ JSON にシリアライズし、全セッションへ配信
//!
//! ## 設計ノート
//!
//! ソケットの生成と書き込みは UI 層（`ui::handler::websocket`）が行います。
//! ここでは `try_send` でキューに積むだけで、待機はしません。キューが満杯
//! または閉じている場合は警告を出してスキップし、セッション自体は自身の
//! close で削除されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{
        BroadcastReport, RoomEvent, SessionChannel, SessionId, SessionPushError, SessionRegistry,
    },
    infrastructure::dto::websocket::ServerFrame,
};

/// WebSocket を使った SessionRegistry 実装
#[derive(Default)]
pub struct WebSocketSessionRegistry {
    /// 接続中のセッションの送信キュー
    sessions: Mutex<HashMap<SessionId, SessionChannel>>,
}

impl WebSocketSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        session_id: &SessionId,
        channel: &SessionChannel,
        payload: &str,
    ) -> Result<(), SessionPushError> {
        channel
            .try_send(payload.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => SessionPushError::QueueFull(session_id.to_string()),
                TrySendError::Closed(_) => SessionPushError::Closed(session_id.to_string()),
            })
    }
}

#[async_trait]
impl SessionRegistry for WebSocketSessionRegistry {
    async fn register(&self, session_id: SessionId, channel: SessionChannel) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session_id, channel);
        tracing::debug!("Session '{}' registered", session_id);
    }

    async fn unregister(&self, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(session_id).is_some();
        tracing::debug!("Session '{}' unregistered (present: {})", session_id, removed);
        removed
    }

    async fn broadcast(&self, event: &RoomEvent, exclude: Option<&SessionId>) -> BroadcastReport {
        let payload = match serde_json::to_string(&ServerFrame::from(event.clone())) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize broadcast frame: {}", e);
                return BroadcastReport::default();
            }
        };

        let sessions = self.sessions.lock().await;
        let mut report = BroadcastReport::default();

        for (session_id, channel) in sessions.iter() {
            if Some(session_id) == exclude {
                continue;
            }
            // ブロードキャストでは一部の送信失敗を許容
            match Self::push(session_id, channel, &payload) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("Failed to push frame: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Broadcast delivered to {} session(s), {} failed",
            report.delivered,
            report.failed
        );
        report
    }

    async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
