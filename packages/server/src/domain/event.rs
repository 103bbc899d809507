//! Events a room broadcasts to its sessions.

use super::{
    entity::ChatMessage,
    value_object::{MessageId, Timestamp, UserId},
};

/// State change fanned out to sessions after it has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A message was persisted
    MessagePosted(ChatMessage),
    /// A message's content was overwritten
    MessageEdited {
        message_id: MessageId,
        content: String,
    },
    /// Someone started or stopped typing
    Typing {
        user_id: UserId,
        sender_name: String,
        is_typing: bool,
    },
    /// A batch of read receipts was recorded with one timestamp
    ReadReceiptsUpdated {
        message_ids: Vec<MessageId>,
        user_id: UserId,
        user_name: String,
        read_at: Timestamp,
    },
}
