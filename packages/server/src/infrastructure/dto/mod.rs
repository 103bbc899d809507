//! Data Transfer Objects for the chat room.
//!
//! DTOs are organized by boundary:
//! - `websocket`: JSON frames exchanged over an open socket
//! - `http`: HTTP read-path response bodies
//! - `row`: SQLite rows

pub mod conversion;
pub mod http;
pub mod row;
pub mod websocket;
