//! Message store port.
//!
//! The room actor owns exactly one store; stores are never shared between
//! rooms. Concrete implementations live in the infrastructure layer.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    ChatMessage, MessageId, NewChatMessage, ProjectId, ReadReceipt, StoreError, UserId,
};

/// Durable storage for one room's messages, read receipts and unread counters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Create the tables if absent. Safe to call on every room start.
    async fn init_schema(&self) -> Result<(), StoreError>;

    /// Append a message and return the id the store assigned to it.
    async fn insert_message(&self, message: &NewChatMessage) -> Result<MessageId, StoreError>;

    async fn find_message(&self, id: MessageId) -> Result<Option<ChatMessage>, StoreError>;

    /// Overwrite `content`. Unknown ids are ignored.
    async fn update_message_content(&self, id: MessageId, content: &str)
    -> Result<(), StoreError>;

    /// Up to `limit` newest messages, oldest first.
    async fn list_recent_messages(&self, limit: u32) -> Result<Vec<ChatMessage>, StoreError>;

    async fn list_reads_for(&self, message_id: MessageId) -> Result<Vec<ReadReceipt>, StoreError>;

    /// Insert, or overwrite `read_at` and `user_name` of the existing
    /// `(message_id, user_id)` receipt.
    async fn upsert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StoreError>;

    /// Upsert a batch of receipts atomically: either every receipt is stored
    /// or none is.
    async fn upsert_read_receipts(&self, receipts: &[ReadReceipt]) -> Result<(), StoreError>;

    /// Unread count for `user_id`; 0 when the user has no counter.
    async fn get_unread_count(&self, user_id: &UserId) -> Result<i64, StoreError>;

    /// Bump every tracked counter except the sender's.
    async fn increment_unread_except(&self, sender: &UserId) -> Result<(), StoreError>;

    /// Set the user's counter to 0, starting to track the user if needed.
    async fn reset_unread(&self, user_id: &UserId) -> Result<(), StoreError>;
}

/// Opens the store that belongs to one project's room
#[async_trait]
pub trait MessageStoreProvider: Send + Sync {
    async fn open(&self, project_id: &ProjectId) -> Result<Arc<dyn MessageStore>, StoreError>;
}
