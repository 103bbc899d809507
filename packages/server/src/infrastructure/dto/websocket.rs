//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object with a `type` discriminator; field names are
//! camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, ProjectId, UserId};

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    /// Post a new message
    Message {
        project_id: ProjectId,
        user_id: UserId,
        sender_name: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to_id: Option<MessageId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to_content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to_sender: Option<String>,
    },
    /// Overwrite the content of an existing message
    Edit {
        message_id: MessageId,
        content: String,
    },
    /// Typing indicator; never persisted
    Typing {
        user_id: UserId,
        sender_name: String,
        is_typing: bool,
    },
    /// Mark a batch of messages as read
    MarkRead {
        user_id: UserId,
        user_name: String,
        message_ids: Vec<MessageId>,
    },
}

/// A persisted message as broadcast and as returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: MessageId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub reply_to_id: Option<MessageId>,
    pub reply_to_content: Option<String>,
    pub reply_to_sender: Option<String>,
    pub created_at: i64,
}

/// Frames broadcast by the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerFrame {
    Message {
        message: MessageDto,
    },
    MessageUpdated {
        message_id: MessageId,
        content: String,
    },
    Typing {
        user_id: UserId,
        sender_name: String,
        is_typing: bool,
    },
    ReadReceiptUpdate {
        message_ids: Vec<MessageId>,
        user_id: UserId,
        user_name: String,
        read_at: i64,
    },
}
