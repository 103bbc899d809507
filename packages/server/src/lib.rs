//! Per-project real-time chat rooms.
//!
//! Each project id is served by exactly one room actor that owns an embedded
//! SQLite message store and the set of live WebSocket sessions. A routing
//! shim in front of the host application forwards project-scoped chat
//! requests to the right room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
