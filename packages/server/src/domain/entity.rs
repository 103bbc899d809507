//! Entities of a chat room.

use super::value_object::{MessageId, ProjectId, SessionId, Timestamp, UserId};

/// Number of messages returned by the history read path
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// A message that has been accepted by the room but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub project_id: ProjectId,
    pub user_id: UserId,
    /// Display name snapshot taken at send time
    pub sender_name: String,
    pub content: String,
    pub reply_to_id: Option<MessageId>,
    pub reply_to_content: Option<String>,
    pub reply_to_sender: Option<String>,
    pub created_at: Timestamp,
}

impl NewChatMessage {
    /// Attach the id assigned by the store.
    pub fn with_id(self, id: MessageId) -> ChatMessage {
        ChatMessage {
            id,
            project_id: self.project_id,
            user_id: self.user_id,
            sender_name: self.sender_name,
            content: self.content,
            reply_to_id: self.reply_to_id,
            reply_to_content: self.reply_to_content,
            reply_to_sender: self.reply_to_sender,
            created_at: self.created_at,
        }
    }
}

/// A stored message. Only `content` changes after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub reply_to_id: Option<MessageId>,
    pub reply_to_content: Option<String>,
    pub reply_to_sender: Option<String>,
    pub created_at: Timestamp,
}

/// Record that `user_id` has seen `message_id`.
///
/// `message_id` is not checked against the messages table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceipt {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub user_name: String,
    pub read_at: Timestamp,
}

/// History entry: a message and everyone who has read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithReads {
    pub message: ChatMessage,
    pub read_by: Vec<ReadReceipt>,
}

/// Authenticated user handed over by the host application's auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}

/// One live connection registered with a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// `None` for anonymous connections
    pub identity: Option<Identity>,
}

impl Session {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            id: SessionId::generate(),
            identity,
        }
    }

    /// Whether frames claiming to come from `user_id` may be accepted on this
    /// session. Anonymous sessions may speak for anyone.
    pub fn may_act_as(&self, user_id: &UserId) -> bool {
        match &self.identity {
            Some(identity) => &identity.id == user_id,
            None => true,
        }
    }

    /// Whether this session is bound to `user_id`.
    pub fn is_user(&self, user_id: &UserId) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| &identity.id == user_id)
    }
}

/// Lifecycle state of a room, derived from the number of open sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Constructed, schema initialized, no sessions
    Idle,
    /// At least one open session
    Active,
}

impl RoomState {
    pub fn from_session_count(count: usize) -> Self {
        if count == 0 {
            RoomState::Idle
        } else {
            RoomState::Active
        }
    }
}
