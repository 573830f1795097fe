//! HTTP Server
//!
//! Binds the listener and serves the object router until shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::storage::ObjectStore;

use super::handlers::AppState;
use super::router::build_router;

/// HTTP server for immustore
pub struct Server {
    config: Config,
    store: Arc<ObjectStore>,
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: Arc<ObjectStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the router (useful for testing)
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.store)))
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|e| {
                StoreError::Network(format!("failed to bind {}: {}", self.config.listen_addr, e))
            })?;

        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            root = %self.store.root().display(),
            "immustore listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| StoreError::Network(e.to_string()))
    }
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating shutdown..."),
        Err(e) => {
            // Without a signal handler the server runs until killed
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await
        }
    }
}
