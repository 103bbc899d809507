//! Request handlers.

mod http;
mod websocket;

pub use http::{get_history, get_unread_count, health_check, not_found};
pub use websocket::websocket_handler;
