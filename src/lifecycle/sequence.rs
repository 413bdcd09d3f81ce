//! The shutdown state machine.
//!
//! # States
//! ```text
//! Signaled → Draining → ServerShutdown → DependenciesShutdown → Stopped
//! ```
//!
//! Every phase runs even when the one before it failed. Failures are logged
//! through the service `Logger` and never propagated.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::chain_error;
use crate::container::DependencyContainer;
use crate::errors::ChainError;
use crate::http::HttpServer;
use crate::observability::{metrics, Logger};

/// Phases of the shutdown sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Signaled,
    Draining,
    ServerShutdown,
    DependenciesShutdown,
    Stopped,
}

impl ShutdownPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownPhase::Signaled => "signaled",
            ShutdownPhase::Draining => "draining",
            ShutdownPhase::ServerShutdown => "server_shutdown",
            ShutdownPhase::DependenciesShutdown => "dependencies_shutdown",
            ShutdownPhase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the watcher task needs to take the service down.
pub(crate) struct ShutdownSequence {
    pub name: String,
    pub server: Arc<HttpServer>,
    pub container: Arc<dyn DependencyContainer>,
    pub logger: Arc<dyn Logger>,
    pub grace: Duration,
    pub dependency_timeout: Option<Duration>,
}

impl ShutdownSequence {
    /// Run from *Signaled* to *Stopped*.
    pub async fn execute(self) {
        enter(ShutdownPhase::Signaled);

        enter(ShutdownPhase::Draining);
        self.logger
            .info(format_args!("{} service starting graceful shutdown...", self.name));

        enter(ShutdownPhase::ServerShutdown);
        let started = Instant::now();
        let drained = self.server.shutdown(self.grace).await;
        metrics::record_shutdown_phase(
            ShutdownPhase::ServerShutdown.as_str(),
            drained.is_ok(),
            started,
        );
        if let Err(e) = drained {
            let err = ChainError::new(e.to_string()).with_message("server shutdown");
            self.logger.error(format_args!("{}", err));
        }

        enter(ShutdownPhase::DependenciesShutdown);
        let started = Instant::now();
        let released = self.shutdown_dependencies().await;
        metrics::record_shutdown_phase(
            ShutdownPhase::DependenciesShutdown.as_str(),
            released.is_ok(),
            started,
        );
        if let Err(err) = released {
            self.logger.error(format_args!("{}", err));
        }

        enter(ShutdownPhase::Stopped);
        self.logger
            .info(format_args!("{} service has been stopped", self.name));
    }

    /// Call the container on a detached thread, bounded when configured.
    ///
    /// The thread is never joined: a call abandoned after the bound does not
    /// keep the runtime from shutting down.
    pub async fn shutdown_dependencies(&self) -> Result<(), ChainError> {
        const CONTEXT: &str = "dependency container shutdown";

        let (tx, rx) = oneshot::channel();
        let container = Arc::clone(&self.container);
        std::thread::Builder::new()
            .name("dependency-shutdown".into())
            .spawn(move || {
                let _ = tx.send(container.shutdown().map_err(|e| e.to_string()));
            })
            .map_err(|e| chain_error!("failed to start: {}", e).with_message(CONTEXT))?;

        let received = match self.dependency_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(chain_error!("timed out after {:?}", limit).with_message(CONTEXT))
                }
            },
            None => rx.await,
        };

        match received {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(ChainError::new(message).with_message(CONTEXT)),
            Err(_) => Err(ChainError::new("container call panicked").with_message(CONTEXT)),
        }
    }
}

fn enter(phase: ShutdownPhase) {
    tracing::debug!(phase = %phase, "Shutdown phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::BoxError;
    use crate::http::{ConnectionTimeouts, ServerConfig};
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Logger for Lines {
        fn info(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(format!("INFO {}", args));
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(format!("ERROR {}", args));
        }
    }

    struct Slow {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl DependencyContainer for Slow {
        fn shutdown(&self) -> Result<(), BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(())
        }
    }

    fn sequence(
        container: Arc<dyn DependencyContainer>,
        logger: Arc<Lines>,
        limit: Option<Duration>,
    ) -> ShutdownSequence {
        let config = ServerConfig {
            address: "127.0.0.1:0".into(),
            timeouts: ConnectionTimeouts {
                read: Duration::from_secs(1),
                write: Duration::from_secs(1),
                idle: Duration::from_secs(1),
            },
            max_connections: 1,
        };
        ShutdownSequence {
            name: "orders".into(),
            server: Arc::new(HttpServer::new(config, Router::new())),
            container,
            logger,
            grace: Duration::from_secs(5),
            dependency_timeout: limit,
        }
    }

    #[test]
    fn phase_names() {
        assert_eq!(ShutdownPhase::ServerShutdown.to_string(), "server_shutdown");
        assert_eq!(ShutdownPhase::Stopped.as_str(), "stopped");
    }

    #[tokio::test]
    async fn unbounded_container_call_is_awaited() {
        let container = Arc::new(Slow {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let logger = Arc::new(Lines::default());

        sequence(container.clone(), logger.clone(), None).execute().await;

        assert_eq!(container.calls.load(Ordering::SeqCst), 1);
        let lines = logger.0.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                "INFO orders service starting graceful shutdown...".to_string(),
                "INFO orders service has been stopped".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn bounded_container_call_times_out_and_still_stops() {
        let container = Arc::new(Slow {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(500),
        });
        let logger = Arc::new(Lines::default());

        sequence(container.clone(), logger.clone(), Some(Duration::from_millis(50)))
            .execute()
            .await;

        let lines = logger.0.lock().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "ERROR dependency container shutdown : timed out after 50ms"
        );
        assert_eq!(lines[2], "INFO orders service has been stopped");
    }
}
