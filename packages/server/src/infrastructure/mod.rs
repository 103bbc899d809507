//! Infrastructure layer: SQLite store, WebSocket session registry and wire DTOs.

pub mod dto;
pub mod session_registry;
pub mod store;
