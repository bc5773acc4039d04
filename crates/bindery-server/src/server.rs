//! HTTP/1.1 server for a [`RouteTable`].
//!
//! Each accepted connection runs on its own task. On shutdown the accept
//! loop stops, open connections finish their in-flight request and close,
//! and the server waits up to the configured timeout for them to drain.
//!
//! ```rust,ignore
//! use bindery_config::BinderyConfig;
//! use bindery_server::{RouteTable, Server};
//!
//! let config = BinderyConfig::default();
//! let routes = RouteTable::builder(Binder::from_config(&config))
//!     .get("/ping", ping)
//!     .build()?;
//! Server::from_config(&config, routes).run().await?;
//! ```

use std::convert::Infallible;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use bindery_config::{BinderyConfig, ServerConfig};
use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::routes::RouteTable;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Failure to start the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// `http_addr` is not a socket address.
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Serves a route table over HTTP/1.1.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    routes: Arc<RouteTable>,
}

impl Server {
    /// Creates a server from its config section.
    #[must_use]
    pub fn new(config: ServerConfig, routes: RouteTable) -> Self {
        Self {
            config,
            routes: Arc::new(routes),
        }
    }

    /// Creates a server from the full application config.
    #[must_use]
    pub fn from_config(config: &BinderyConfig, routes: RouteTable) -> Self {
        Self::new(config.server.clone(), routes)
    }

    /// The routes being served.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The server settings.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr: SocketAddr =
            self.config
                .http_addr
                .parse()
                .map_err(|source| ServerError::InvalidAddress {
                    addr: self.config.http_addr.clone(),
                    source,
                })?;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Runs until `shutdown` is triggered.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered, then drains open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, routes = self.routes.len(), "Server listening");
        }

        let tracker = ConnectionTracker::new();
        let stop = shutdown.recv();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let token = tracker.acquire();
                        let routes = Arc::clone(&self.routes);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, routes, shutdown).await {
                                tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                },
                () = &mut stop => break,
            }
        }
        drop(listener);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        tracing::info!(
            connections = tracker.active_connections(),
            timeout_secs = self.config.shutdown_timeout_secs,
            "Shutting down, draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                connections = tracker.active_connections(),
                "Shutdown timeout reached with connections still open"
            );
        }
        tracing::info!("Server stopped");
    }
}

async fn serve_connection(
    stream: TcpStream,
    routes: Arc<RouteTable>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: Request<Incoming>| {
        let routes = Arc::clone(&routes);
        async move { Ok::<_, Infallible>(routes.handle(request).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);
    let stop = shutdown.recv();
    tokio::pin!(stop);
    let mut draining = false;

    loop {
        tokio::select! {
            result = conn.as_mut() => return result,
            () = &mut stop, if !draining => {
                conn.as_mut().graceful_shutdown();
                draining = true;
            }
        }
    }
}
