//! UseCase: 既読処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MarkReadUseCase::execute() メソッド
//! - 同じ (message_id, user_id) への既読は上書きされ、重複しないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数メッセージの一括既読、同じメッセージの再既読
//! - 境界値：存在しないメッセージ ID への既読（そのまま保存される）
//! - 異常系：ストア書き込み失敗（一括書き込みなので既読は 1 件も残らない）

use std::sync::Arc;

use chatroom_shared::time::Clock;

use crate::domain::{
    MessageId, MessageStore, ReadReceipt, RoomEvent, Session, SessionRegistry, Timestamp, UserId,
};

use super::error::FrameError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkReadInput {
    pub user_id: UserId,
    pub user_name: String,
    pub message_ids: Vec<MessageId>,
}

/// 既読処理のユースケース
pub struct MarkReadUseCase {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl MarkReadUseCase {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn SessionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    /// 既読を記録し、記録時刻を返す
    ///
    /// バッチ内のすべてのメッセージに同じ `read_at` が付く。
    /// 既読は 1 トランザクションで書き込むため、失敗時は何も保存されず
    /// ブロードキャストも行わない。
    pub async fn execute(
        &self,
        session: &Session,
        input: MarkReadInput,
    ) -> Result<Timestamp, FrameError> {
        if !session.may_act_as(&input.user_id) {
            return Err(FrameError::IdentityMismatch {
                session_id: session.id,
                claimed: input.user_id,
            });
        }

        let read_at = Timestamp::new(self.clock.now_millis());
        let receipts: Vec<ReadReceipt> = input
            .message_ids
            .iter()
            .map(|message_id| ReadReceipt {
                message_id: *message_id,
                user_id: input.user_id.clone(),
                user_name: input.user_name.clone(),
                read_at,
            })
            .collect();
        self.store.upsert_read_receipts(&receipts).await?;

        if let Err(e) = self.store.reset_unread(&input.user_id).await {
            tracing::warn!("Failed to reset unread counter for user {}: {}", input.user_id, e);
        }

        let event = RoomEvent::ReadReceiptsUpdated {
            message_ids: input.message_ids,
            user_id: input.user_id,
            user_name: input.user_name,
            read_at,
        };
        self.registry.broadcast(&event, None).await;

        Ok(read_at)
    }
}
