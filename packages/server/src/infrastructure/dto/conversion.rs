//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ChatMessage, MessageId, MessageWithReads, ProjectId, ReadReceipt, RoomEvent, StoreError,
    Timestamp, UserId,
};
use crate::infrastructure::dto::{
    http::{HistoryEntryDto, ReadByDto},
    row::{MessageRow, ReadReceiptRow},
    websocket::{MessageDto, ServerFrame},
};

// ========================================
// Row → Domain Entity
// ========================================

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Query(format!("corrupt row: {}", err))
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(row.id).map_err(corrupt)?,
            project_id: ProjectId::new(row.project_id).map_err(corrupt)?,
            user_id: UserId::new(row.user_id).map_err(corrupt)?,
            sender_name: row.sender_name,
            content: row.content,
            reply_to_id: row
                .reply_to_id
                .map(MessageId::new)
                .transpose()
                .map_err(corrupt)?,
            reply_to_content: row.reply_to_content,
            reply_to_sender: row.reply_to_sender,
            created_at: Timestamp::new(row.created_at),
        })
    }
}

impl TryFrom<ReadReceiptRow> for ReadReceipt {
    type Error = StoreError;

    fn try_from(row: ReadReceiptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: MessageId::new(row.message_id).map_err(corrupt)?,
            user_id: UserId::new(row.user_id).map_err(corrupt)?,
            user_name: row.user_name,
            read_at: Timestamp::new(row.read_at),
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<ChatMessage> for MessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            user_id: model.user_id,
            sender_name: model.sender_name,
            content: model.content,
            reply_to_id: model.reply_to_id,
            reply_to_content: model.reply_to_content,
            reply_to_sender: model.reply_to_sender,
            created_at: model.created_at.value(),
        }
    }
}

impl From<ReadReceipt> for ReadByDto {
    fn from(model: ReadReceipt) -> Self {
        Self {
            user_id: model.user_id,
            user_name: model.user_name,
            read_at: model.read_at.value(),
        }
    }
}

impl From<MessageWithReads> for HistoryEntryDto {
    fn from(model: MessageWithReads) -> Self {
        Self {
            message: model.message.into(),
            read_by: model.read_by.into_iter().map(ReadByDto::from).collect(),
        }
    }
}

impl From<RoomEvent> for ServerFrame {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::MessagePosted(message) => ServerFrame::Message {
                message: message.into(),
            },
            RoomEvent::MessageEdited {
                message_id,
                content,
            } => ServerFrame::MessageUpdated {
                message_id,
                content,
            },
            RoomEvent::Typing {
                user_id,
                sender_name,
                is_typing,
            } => ServerFrame::Typing {
                user_id,
                sender_name,
                is_typing,
            },
            RoomEvent::ReadReceiptsUpdated {
                message_ids,
                user_id,
                user_name,
                read_at,
            } => ServerFrame::ReadReceiptUpdate {
                message_ids,
                user_id,
                user_name,
                read_at: read_at.value(),
            },
        }
    }
}
