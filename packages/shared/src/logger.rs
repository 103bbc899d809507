//! Logging setup utilities for the chat room binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level.
const WORKSPACE_TARGETS: [&str; 4] = [
    "chatroom_server",
    "chatroom_client",
    "chatroom_shared",
    "tower_http",
];

/// Build the default filter directive for the given binary.
///
/// The binary name is normalized the same way rustc normalizes crate names
/// (`-` becomes `_`), so `chatroom-server` yields a `chatroom_server=<level>`
/// directive.
pub fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect();

    if !WORKSPACE_TARGETS.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }

    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "chatroom-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use chatroom_shared::logger::setup_logger;
///
/// setup_logger("chatroom-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
