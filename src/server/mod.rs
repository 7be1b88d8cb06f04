pub mod handler;

use crate::config::ServerConfig;
use crate::ports::SearchServicePort;
use crate::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use handler::router;

/// HTTP server for the search endpoint
pub struct Server {
    config: ServerConfig,
    search: Arc<dyn SearchServicePort>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: ServerConfig, search: Arc<dyn SearchServicePort>) -> Self {
        Self {
            config,
            search,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&address)
            .await
            .map_err(|e| Error::Service(format!("Failed to bind {address}: {e}")))
    }

    /// Serve until SIGINT/SIGTERM or [`Server::shutdown`]
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        info!("Listening on http://{}", local_addr);

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown_token.cancel();
        });

        let token = self.cancellation_token.clone();
        axum::serve(listener, router(Arc::clone(&self.search)))
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(|e| Error::Service(format!("HTTP server error: {e}")))?;

        info!("HTTP server shutdown complete");
        Ok(())
    }

    /// Request a graceful shutdown
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.cancellation_token.cancel();
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        warn!("Failed to install signal handlers, relying on explicit shutdown");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install Ctrl-C handler, relying on explicit shutdown");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl-C, initiating graceful shutdown");
}
