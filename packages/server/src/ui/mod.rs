//! UI layer: HTTP/WebSocket handlers, the routing shim and the server runner.

mod handler;
pub mod room;
mod server;
mod shim;
mod signal;
mod state;

pub use room::{RoomDirectory, RoomError, RoomHandle, room_router};
pub use server::{Server, build_app};
pub use shim::{ChatRoute, resolve_chat_route};
pub use signal::shutdown_signal;
pub use state::{AppState, RoomContext};
