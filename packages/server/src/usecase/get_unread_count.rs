//! UseCase: 未読数取得処理

use std::sync::Arc;

use crate::domain::{MessageStore, StoreError, UserId};

pub struct GetUnreadCountUseCase {
    store: Arc<dyn MessageStore>,
}

impl GetUnreadCountUseCase {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, user_id: &UserId) -> Result<i64, StoreError> {
        self.store.get_unread_count(user_id).await
    }
}
