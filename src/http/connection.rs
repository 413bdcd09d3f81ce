//! Per-connection HTTP/1.1 serving.
//!
//! # Responsibilities
//! - Drive one hyper connection with the shared router
//! - Bound request-header reads (read timeout)
//! - Close keep-alive connections that sit idle
//! - Switch to graceful close when shutdown is triggered
//!
//! # Design Decisions
//! - Graceful close lets the in-flight response finish; nothing is aborted
//! - The listener permit and tracker guard live exactly as long as the task

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;

use crate::lifecycle::shutdown::ShutdownListener;
use crate::net::connection::ConnectionGuard;
use crate::net::idle::{Activity, ActivityStream};
use crate::net::listener::ConnectionPermit;
use crate::observability::metrics;

/// Timeouts applied to every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Time allowed to receive a request's headers.
    pub read: Duration,
    /// Time allowed to produce a response.
    pub write: Duration,
    /// Quiet period after which a keep-alive connection is closed.
    pub idle: Duration,
}

/// Why a connection stopped reading new requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    Shutdown,
    Idle,
}

/// Serve a single accepted connection until it closes.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    timeouts: ConnectionTimeouts,
    mut shutdown: ShutdownListener,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
) {
    let connection_id = guard.id();
    metrics::connection_opened();

    let activity = Activity::new();
    let io = TokioIo::new(ActivityStream::new(stream, activity.clone()));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read)
        .keep_alive(true);

    let conn = builder.serve_connection(io, TowerToHyperService::new(router));
    tokio::pin!(conn);

    let mut closing: Option<CloseReason> = None;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(
                        connection_id = %connection_id,
                        peer_addr = %peer,
                        error = %e,
                        "Connection ended with error"
                    );
                }
                break;
            }
            _ = shutdown.recv(), if closing.is_none() => {
                closing = Some(CloseReason::Shutdown);
                conn.as_mut().graceful_shutdown();
            }
            _ = activity.idle(timeouts.idle), if closing.is_none() => {
                closing = Some(CloseReason::Idle);
                conn.as_mut().graceful_shutdown();
            }
        }
    }

    tracing::trace!(
        connection_id = %connection_id,
        peer_addr = %peer,
        reason = ?closing,
        "Connection closed"
    );
    metrics::connection_closed();
    drop(guard);
}
