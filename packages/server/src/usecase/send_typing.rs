//! UseCase: 入力中通知処理

use std::sync::Arc;

use crate::domain::{RoomEvent, Session, SessionRegistry, UserId};

use super::error::FrameError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTypingInput {
    pub user_id: UserId,
    pub sender_name: String,
    pub is_typing: bool,
}

/// 入力中通知のユースケース（永続化しない）
pub struct SendTypingUseCase {
    registry: Arc<dyn SessionRegistry>,
}

impl SendTypingUseCase {
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 送信元セッション以外の全セッションに通知する
    pub async fn execute(&self, session: &Session, input: SendTypingInput) -> Result<(), FrameError> {
        if !session.may_act_as(&input.user_id) {
            return Err(FrameError::IdentityMismatch {
                session_id: session.id,
                claimed: input.user_id,
            });
        }

        let event = RoomEvent::Typing {
            user_id: input.user_id,
            sender_name: input.sender_name,
            is_typing: input.is_typing,
        };
        self.registry.broadcast(&event, Some(&session.id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{RecordingRegistry, session_of, user};

    #[tokio::test]
    async fn test_typing_excludes_origin_session() {
        // テスト項目: 入力中通知は送信元セッションを除外してブロードキャストされる
        // given (前提条件):
        let registry = Arc::new(RecordingRegistry::default());
        let usecase = SendTypingUseCase::new(registry.clone());
        let session = session_of(7, "alice");

        // when (操作):
        usecase
            .execute(
                &session,
                SendTypingInput {
                    user_id: user(7),
                    sender_name: "alice".to_string(),
                    is_typing: true,
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        let broadcasts = registry.broadcasts.lock().await;
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].1, Some(session.id));
    }

    #[tokio::test]
    async fn test_typing_as_someone_else_is_rejected() {
        // テスト項目: 他人になりすました入力中通知は拒否される
        let registry = Arc::new(RecordingRegistry::default());
        let usecase = SendTypingUseCase::new(registry.clone());

        let result = usecase
            .execute(
                &session_of(7, "alice"),
                SendTypingInput {
                    user_id: user(8),
                    sender_name: "bob".to_string(),
                    is_typing: false,
                },
            )
            .await;

        assert!(matches!(result, Err(FrameError::IdentityMismatch { .. })));
        assert!(registry.broadcasts.lock().await.is_empty());
    }
}
