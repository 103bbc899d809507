//! Interactive command-line client for project chat rooms.

mod domain;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use domain::ClientOptions;
pub use runner::run_client;
