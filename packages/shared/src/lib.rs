//! Utilities shared by the chat room server and the CLI client.

pub mod logger;
pub mod time;
