//! UseCase: セッション切断処理
//!
//! 切断時のブロードキャストは行わない（退室通知はない）。

use std::sync::Arc;

use crate::domain::{RoomState, SessionId, SessionRegistry};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<dyn SessionRegistry>,
}

impl DisconnectSessionUseCase {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// セッションを登録解除し、解除後のルーム状態を返す
    ///
    /// 未登録のセッションに対しても冪等に動作する。
    pub async fn execute(&self, session_id: &SessionId) -> RoomState {
        if !self.registry.unregister(session_id).await {
            tracing::debug!("Session '{}' was not registered", session_id);
        }
        RoomState::from_session_count(self.registry.count().await)
    }
}
