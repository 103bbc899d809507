//! UseCase: 履歴取得処理

use std::sync::Arc;

use crate::domain::{MessageStore, MessageWithReads, StoreError};

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    store: Arc<dyn MessageStore>,
}

impl GetHistoryUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// 最新 `limit` 件を古い順に、それぞれの既読一覧と合わせて返す
    pub async fn execute(&self, limit: u32) -> Result<Vec<MessageWithReads>, StoreError> {
        let messages = self.store.list_recent_messages(limit).await?;

        let mut history = Vec::with_capacity(messages.len());
        for message in messages {
            let read_by = self.store.list_reads_for(message.id).await?;
            history.push(MessageWithReads { message, read_by });
        }
        Ok(history)
    }
}
