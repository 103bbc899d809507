//! UseCase layer: one use case per frame kind and read path.

mod connect_session;
mod disconnect_session;
mod edit_message;
mod error;
mod get_history;
mod get_unread_count;
mod mark_read;
mod send_message;
mod send_typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use edit_message::EditMessageUseCase;
pub use error::FrameError;
pub use get_history::GetHistoryUseCase;
pub use get_unread_count::GetUnreadCountUseCase;
pub use mark_read::{MarkReadInput, MarkReadUseCase};
pub use send_message::{SendMessageInput, SendMessageUseCase};
pub use send_typing::{SendTypingInput, SendTypingUseCase};
