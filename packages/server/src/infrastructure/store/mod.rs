//! Message store implementations.
//!
//! - `sqlite`: one embedded SQLite database per room

pub mod sqlite;

pub use sqlite::{SqliteMessageStore, SqliteStoreProvider};
