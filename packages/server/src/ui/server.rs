//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, middleware, routing::get};
use chatroom_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, infrastructure::store::SqliteStoreProvider};

use super::{
    handler::{health_check, not_found},
    room::RoomDirectory,
    shim::chat_shim,
    signal::shutdown_signal,
    state::AppState,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Host application router with the chat shim in front of it.
///
/// The bundled host only serves `/api/health`; every other non-chat path
/// falls through to 404.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, chat_shim))
        .layer(TraceLayer::new_for_http())
}

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig {
///     host: "127.0.0.1".to_string(),
///     port: 8080,
///     store_root: StoreRoot::Directory("data".into()),
///     room: RoomConfig::default(),
///     session: SessionLimits::default(),
/// });
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    /// RoomDirectory（プロジェクトごとのルーム管理）
    directory: Arc<RoomDirectory>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server whose rooms stamp messages with `clock`
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let provider = Arc::new(SqliteStoreProvider::new(config.store_root.clone()));
        let directory = Arc::new(RoomDirectory::new(
            provider,
            config.room,
            config.session,
            clock,
        ));
        Self { config, directory }
    }

    pub fn directory(&self) -> Arc<RoomDirectory> {
        self.directory.clone()
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address
    /// or if there's an error during server execution.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AppState {
            directory: self.directory,
        });
        let app = build_app(state);

        let local_addr = listener.local_addr()?;
        tracing::info!("Chat server listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/projects/{{projectId}}/chat", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
