//! Interactive chat client for one project's room.
//!
//! Joins `ws://<host>/projects/<project>/chat`, sends typed lines as
//! messages and prints everything the room broadcasts. Automatically
//! reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatroom-client -- --project 42 --user-id 7 --name alice
//! cargo run --bin chatroom-client -- -u ws://127.0.0.1:3000 -P 42 -i 8 -n bob
//! ```

use chatroom_client::{ClientOptions, run_client};
use chatroom_server::domain::{ProjectId, UserId};
use chatroom_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatroom-client")]
#[command(about = "Interactive client for project chat rooms", long_about = None)]
struct Args {
    /// Chat server base URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Project whose room to join
    #[arg(short = 'P', long)]
    project: ProjectId,

    /// Your user id
    #[arg(short = 'i', long)]
    user_id: UserId,

    /// Display name shown to others
    #[arg(short = 'n', long)]
    name: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let options = ClientOptions {
        url: args.url,
        project_id: args.project,
        user_id: args.user_id,
        name: args.name,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
