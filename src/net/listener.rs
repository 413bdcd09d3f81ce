//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured `host:port`
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//! - Back off on transient accept errors

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// First delay after a failed accept.
const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(5);
/// Upper bound for the accept backoff.
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),
    /// The connection limiter was closed.
    #[error("Connection limiter closed")]
    LimiterClosed,
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to `address` with connection limits.
    ///
    /// Host names are resolved here, so `localhost:8080` is accepted.
    pub async fn bind(address: &str, max_connections: usize) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ListenerError::Bind {
                address: address.to_string(),
                source,
            })?;

        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            address: address.to_string(),
            source,
        })?;

        tracing::info!(
            address = %local_addr,
            max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached. Returns the
    /// stream and a permit that must be held for the connection's lifetime.
    /// Cancel safe.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::LimiterClosed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool, even if
/// the connection task panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

/// Delay before retrying after `failures` consecutive accept errors.
///
/// Doubles from 5ms up to 1s.
pub fn accept_backoff(failures: u32) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(failures - 1);
    ACCEPT_BACKOFF_BASE
        .saturating_mul(factor)
        .min(ACCEPT_BACKOFF_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(accept_backoff(0), Duration::ZERO);
        assert_eq!(accept_backoff(1), Duration::from_millis(5));
        assert_eq!(accept_backoff(2), Duration::from_millis(10));
        assert_eq!(accept_backoff(8), Duration::from_millis(640));
        assert_eq!(accept_backoff(9), ACCEPT_BACKOFF_MAX);
        assert_eq!(accept_backoff(64), ACCEPT_BACKOFF_MAX);
    }

    #[tokio::test]
    async fn permits_bound_connections() {
        let listener = Listener::bind("127.0.0.1:0", 1).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(listener.max_connections(), 1);

        let _client = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 0);

        drop(permit);
        assert_eq!(listener.available_permits(), 1);
    }

    #[tokio::test]
    async fn bind_failure_names_the_address() {
        let taken = Listener::bind("127.0.0.1:0", 1).await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = Listener::bind(&addr, 1).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert!(err.to_string().contains(&addr));
    }
}
