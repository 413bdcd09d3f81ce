//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Wrap the caller's router with the response (write) timeout
//! - Bind the listener and run the accept loop
//! - Hand each connection to its own task
//! - Stop accepting and drain connections on request
//!
//! # Design Decisions
//! - `serve` and `shutdown` take `&self` so one `Arc<HttpServer>` can be
//!   driven by the accept loop and a shutdown task at once
//! - A clean stop is `Ok(())` from `serve`; only failures are errors
//! - The accept loop counts as tracked work, so a completed drain implies
//!   the listening socket has been closed

use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tower_http::timeout::TimeoutLayer;

use crate::http::connection::{serve_connection, ConnectionTimeouts};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{accept_backoff, Listener, ListenerError};

/// Settings for an [`HttpServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address in `host:port` form.
    pub address: String,
    pub timeouts: ConnectionTimeouts,
    pub max_connections: usize,
}

/// Serving failed for a reason other than a requested stop.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Draining did not complete.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error(
        "graceful shutdown deadline of {grace:?} exceeded with {active} connection(s) still open"
    )]
    DeadlineExceeded { grace: Duration, active: u64 },
}

/// HTTP/1.1 server with graceful, bounded shutdown.
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server; nothing is bound until [`HttpServer::serve`].
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let router = Self::build_router(&config, router);
        Self {
            config,
            router,
            shutdown: Shutdown::new(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Apply the response deadline on top of the caller's routes.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, router: Router) -> Router {
        router.layer(TimeoutLayer::new(config.timeouts.write))
    }

    /// Bind and accept connections until [`HttpServer::shutdown`] is called.
    ///
    /// Returns `Ok(())` once the server was closed, immediately if it was
    /// closed before `serve` ran.
    pub async fn serve(&self) -> Result<(), ServeError> {
        let _accepting = self.tracker.track();
        let mut stop = self.shutdown.subscribe();
        if stop.is_triggered() {
            return Ok(());
        }

        let listener =
            Listener::bind(&self.config.address, self.config.max_connections).await?;
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                _ = stop.recv() => {
                    tracing::info!(address = %self.config.address, "Stopped accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        failures = 0;
                        let guard = self.tracker.track();
                        tokio::spawn(serve_connection(
                            stream,
                            peer,
                            self.router.clone(),
                            self.config.timeouts,
                            self.shutdown.subscribe(),
                            guard,
                            permit,
                        ));
                    }
                    Err(ListenerError::Accept(e)) => {
                        failures = failures.saturating_add(1);
                        let delay = accept_backoff(failures);
                        tracing::warn!(error = %e, retry_in = ?delay, "Accept failed");
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
    }

    /// Stop accepting, then wait up to `grace` for open connections to
    /// finish. Connections still open at the deadline are left running.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), ShutdownError> {
        self.shutdown.trigger();

        tokio::time::timeout(grace, self.tracker.wait_for_drain())
            .await
            .map_err(|_| ShutdownError::DeadlineExceeded {
                grace,
                active: self.tracker.active_count(),
            })
    }

    /// Whether shutdown has been requested.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Connections currently open (plus the accept loop while it runs).
    pub fn active_count(&self) -> u64 {
        self.tracker.active_count()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
