//! Domain layer: entities, value objects and the ports the room depends on.

pub mod entity;
pub mod error;
pub mod event;
pub mod message_store;
pub mod session_registry;
pub mod value_object;

pub use entity::{
    ChatMessage, DEFAULT_HISTORY_LIMIT, Identity, MessageWithReads, NewChatMessage, ReadReceipt,
    RoomState, Session,
};
pub use error::{SessionPushError, StoreError, ValueObjectError};
pub use event::RoomEvent;
pub use message_store::{MessageStore, MessageStoreProvider};
#[cfg(test)]
pub use message_store::MockMessageStore;
pub use session_registry::{BroadcastReport, SessionChannel, SessionRegistry};
pub use value_object::{MessageId, ProjectId, SessionId, Timestamp, UserId};
