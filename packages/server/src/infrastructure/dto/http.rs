//! HTTP response DTOs for the room's read paths.

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::websocket::MessageDto;

/// One reader of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadByDto {
    pub user_id: UserId,
    pub user_name: String,
    pub read_at: i64,
}

/// `GET /messages` entry: the message fields plus `readBy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDto {
    #[serde(flatten)]
    pub message: MessageDto,
    pub read_by: Vec<ReadByDto>,
}

/// `GET /unread/{userId}` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub count: i64,
}
