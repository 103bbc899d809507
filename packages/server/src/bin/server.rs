//! Per-project real-time chat server.
//!
//! Clients connect to `ws://<host>:<port>/projects/<projectId>/chat`; each
//! project gets its own room backed by its own SQLite database.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatroom-server
//! cargo run --bin chatroom-server -- --host 0.0.0.0 --port 3000 --data-dir ./data
//! ```

use std::path::PathBuf;

use chatroom_server::{
    config::{EditPolicy, RoomConfig, ServerConfig, SessionLimits, StoreRoot},
    ui::Server,
};
use chatroom_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatroom-server")]
#[command(about = "Per-project WebSocket chat rooms with SQLite history", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "CHATROOM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "CHATROOM_PORT", default_value = "8080")]
    port: u16,

    /// Directory holding one SQLite database per room
    #[arg(long, env = "CHATROOM_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Keep room databases in memory (nothing survives a restart)
    #[arg(long, env = "CHATROOM_IN_MEMORY")]
    in_memory: bool,

    /// Let any session edit any message
    #[arg(long, env = "CHATROOM_PERMISSIVE_EDITS")]
    permissive_edits: bool,

    /// Capacity of each room's command queue
    #[arg(long, env = "CHATROOM_ROOM_QUEUE", default_value = "256")]
    room_queue_capacity: usize,

    /// Capacity of each session's outbound queue
    #[arg(long, env = "CHATROOM_SESSION_QUEUE", default_value = "64")]
    session_queue_capacity: usize,

    /// Largest text frame handed to a room; larger frames are dropped
    #[arg(long, env = "CHATROOM_MAX_FRAME_BYTES", default_value = "65536")]
    max_frame_bytes: usize,

    /// Close sessions that send nothing, not even a pong, for this many seconds (0 disables)
    #[arg(long, env = "CHATROOM_IDLE_TIMEOUT_SECS", default_value = "300")]
    idle_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let store_root = if self.in_memory {
            StoreRoot::InMemory
        } else {
            StoreRoot::Directory(self.data_dir)
        };
        let edit_policy = if self.permissive_edits {
            EditPolicy::Permissive
        } else {
            EditPolicy::AuthorOnly
        };

        ServerConfig {
            host: self.host,
            port: self.port,
            store_root,
            room: RoomConfig {
                room_queue_capacity: self.room_queue_capacity.max(1),
                session_queue_capacity: self.session_queue_capacity.max(1),
                edit_policy,
            },
            session: SessionLimits {
                max_frame_bytes: self.max_frame_bytes,
                ..SessionLimits::default()
            }
            .with_idle_timeout_secs(self.idle_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = Args::parse().into_config();
    tracing::info!(
        "Storing rooms in {:?}, edit policy {:?}",
        config.store_root,
        config.room.edit_policy
    );

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
