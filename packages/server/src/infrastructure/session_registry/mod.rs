//! Session registry implementations.
//!
//! - `websocket`: bounded per-session queues drained by each socket's writer task

pub mod websocket;

pub use websocket::WebSocketSessionRegistry;
