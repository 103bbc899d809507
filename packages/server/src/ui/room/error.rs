use thiserror::Error;

use crate::domain::StoreError;

/// Errors raised while starting or talking to a room actor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("room is closed")]
    RoomClosed,
}
