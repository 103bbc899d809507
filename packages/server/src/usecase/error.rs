//! UseCase errors.

use thiserror::Error;

use crate::domain::{MessageId, ProjectId, SessionId, StoreError, UserId};

/// Reasons a single frame is dropped. None of them close the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Not JSON, unknown `type`, or missing fields
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The frame names a user other than the session's authenticated one
    #[error("session '{session_id}' may not act as user {claimed}")]
    IdentityMismatch {
        session_id: SessionId,
        claimed: UserId,
    },

    /// The frame names a project other than the room's own
    #[error("frame for project {frame} was sent to the room of project {room}")]
    ProjectMismatch { frame: ProjectId, room: ProjectId },

    /// Edit attempted by someone other than the original author
    #[error("session is not the author of message {0}")]
    NotAuthor(MessageId),

    #[error("message {0} does not exist")]
    MessageNotFound(MessageId),

    /// The store rejected a write; nothing was broadcast
    #[error(transparent)]
    Store(#[from] StoreError),
}
