//! Room instances: one actor per project, the directory that addresses
//! them, and the HTTP surface each room exposes.

mod actor;
mod directory;
mod error;
mod router;

pub use actor::RoomHandle;
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use router::room_router;
