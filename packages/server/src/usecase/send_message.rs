//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 永続化してからブロードキャストする順序、ID と作成時刻の払い出し
//!
//! ### なぜこのテストが必要か
//! - 送信者自身の画面もブロードキャストで更新されるため、送信者を除外してはならない
//! - 永続化に失敗したメッセージをブロードキャストすると履歴と表示が食い違う
//!
//! ### どのような状況を想定しているか
//! - 正常系：永続化とブロードキャスト（送信者を含む全員）
//! - 異常系：別プロジェクト宛て、なりすまし、ストア書き込み失敗

use std::sync::Arc;

use chatroom_shared::time::Clock;

use crate::domain::{
    ChatMessage, MessageId, MessageStore, NewChatMessage, ProjectId, RoomEvent, Session,
    SessionRegistry, Timestamp, UserId,
};

use super::error::FrameError;

/// Fields of a `message` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageInput {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub reply_to_id: Option<MessageId>,
    pub reply_to_content: Option<String>,
    pub reply_to_sender: Option<String>,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// このルームのプロジェクト ID
    project_id: ProjectId,
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        project_id: ProjectId,
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn SessionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            project_id,
            store,
            registry,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 永続化され、全セッションにブロードキャストされたメッセージ
    /// * `Err(FrameError)` - フレームは破棄され、何もブロードキャストされない
    pub async fn execute(
        &self,
        session: &Session,
        input: SendMessageInput,
    ) -> Result<ChatMessage, FrameError> {
        if input.project_id != self.project_id {
            return Err(FrameError::ProjectMismatch {
                frame: input.project_id,
                room: self.project_id.clone(),
            });
        }
        if !session.may_act_as(&input.user_id) {
            return Err(FrameError::IdentityMismatch {
                session_id: session.id,
                claimed: input.user_id,
            });
        }

        let new_message = NewChatMessage {
            project_id: input.project_id,
            user_id: input.user_id,
            sender_name: input.sender_name,
            content: input.content,
            reply_to_id: input.reply_to_id,
            reply_to_content: input.reply_to_content,
            reply_to_sender: input.reply_to_sender,
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        // 1. 永続化（失敗したらブロードキャストしない）
        let id = self.store.insert_message(&new_message).await?;
        let message = new_message.with_id(id);

        // 2. 送信者を含む全セッションにブロードキャスト
        self.registry
            .broadcast(&RoomEvent::MessagePosted(message.clone()), None)
            .await;

        // 3. 他のユーザーの未読数を加算
        if let Err(e) = self.store.increment_unread_except(&message.user_id).await {
            tracing::warn!("Failed to update unread counters for message {}: {}", id, e);
        }

        Ok(message)
    }
}
