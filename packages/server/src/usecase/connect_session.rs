//! UseCase: セッション接続処理

use std::sync::Arc;

use crate::domain::{RoomState, SessionChannel, SessionId, SessionRegistry};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    registry: Arc<dyn SessionRegistry>,
}

impl ConnectSessionUseCase {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// セッションを登録し、登録後のルーム状態を返す
    pub async fn execute(&self, session_id: SessionId, channel: SessionChannel) -> RoomState {
        self.registry.register(session_id, channel).await;
        RoomState::from_session_count(self.registry.count().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::session_registry::WebSocketSessionRegistry;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_first_session_activates_room() {
        // テスト項目: 最初のセッション接続でルームが Active になる
        // given (前提条件):
        let registry = Arc::new(WebSocketSessionRegistry::new());
        let usecase = ConnectSessionUseCase::new(registry.clone());
        let (tx, _rx) = mpsc::channel(4);

        // when (操作):
        let state = usecase.execute(SessionId::generate(), tx).await;

        // then (期待する結果):
        assert_eq!(state, RoomState::Active);
        assert_eq!(registry.count().await, 1);
    }
}
