//! The HTTP server wrapper: bind, serve, shut down gracefully.

use std::net::SocketAddr;

use axum::Router;
use postbox_common::Signal;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Errors that can occur while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("Failed to bind HTTP server to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// The server encountered a runtime error.
    #[error("HTTP server error: {0}")]
    Serve(String),
}

/// HTTP server bound to its listener.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind the server to an address.
    ///
    /// # Errors
    /// Returns an error if binding fails.
    pub async fn bind(address: &str, router: Router) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.to_string(),
                source,
            })?;

        info!(address, "HTTP server bound");
        Ok(Self { listener, router })
    }

    /// The bound address, useful when binding to port 0.
    ///
    /// # Errors
    /// Returns an error if the local address cannot be determined.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Serve(e.to_string()))
    }

    /// Run until a shutdown signal arrives.
    ///
    /// # Errors
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), ServerError> {
        info!("HTTP server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server received shutdown signal");
            })
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
