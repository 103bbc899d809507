//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{
    domain::{ClientOptions, should_attempt_reconnect},
    error::ClientError,
    session::run_client_session,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the chat client, reconnecting after lost connections
///
/// # Errors
///
/// Returns the last error once reconnecting is pointless or the attempts
/// are exhausted.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to join project {} as '{}' (attempt {}/{})",
            options.project_id,
            options.name,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&options).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                reconnect_count += 1;
                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!("Giving up after {} attempt(s): {}", reconnect_count, e);
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
