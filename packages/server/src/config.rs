//! Runtime configuration for the chat room server.

use std::{path::PathBuf, time::Duration};

/// Where room databases live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRoot {
    /// One `room-<project_id>.sqlite3` file per room under this directory
    Directory(PathBuf),
    /// Volatile per-room in-memory databases
    InMemory,
}

/// Who may edit a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPolicy {
    /// Only a session authenticated as the original author
    #[default]
    AuthorOnly,
    /// Any session may overwrite any message
    Permissive,
}

/// Settings applied to every room actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Capacity of the room's command mailbox
    pub room_queue_capacity: usize,
    /// Capacity of each session's outbound queue
    pub session_queue_capacity: usize,
    pub edit_policy: EditPolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_queue_capacity: 256,
            session_queue_capacity: 64,
            edit_policy: EditPolicy::default(),
        }
    }
}

/// Transport ceiling as a multiple of [`SessionLimits::max_frame_bytes`]
const TRANSPORT_LIMIT_FACTOR: usize = 16;

/// Limits applied to each WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Largest text frame handed to the room; bigger frames are dropped
    pub max_frame_bytes: usize,
    /// Close the session after this long without any inbound frame,
    /// pongs included
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 64 * 1024,
            idle_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl SessionLimits {
    /// `0` disables the idle timeout.
    pub fn with_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// How often the server pings a session. Twice per idle timeout, so a
    /// client that answers pings is never considered idle.
    pub fn ping_interval(&self) -> Option<Duration> {
        self.idle_timeout.map(|timeout| timeout / 2)
    }

    /// Message size at which the WebSocket layer gives up on the connection
    /// and closes it with 1009.
    pub fn transport_limit(&self) -> usize {
        self.max_frame_bytes.saturating_mul(TRANSPORT_LIMIT_FACTOR)
    }
}

/// Full server configuration assembled by the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_root: StoreRoot,
    pub room: RoomConfig,
    pub session: SessionLimits,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
