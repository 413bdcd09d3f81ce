//! The lifecycle-managed service.
//!
//! # Data Flow
//! ```text
//! run()
//!     → register SIGINT/SIGTERM
//!     → announce (startup line)
//!     → spawn watcher: wait for signal (or serve failure) → ShutdownSequence
//!     → serve on the calling task until the server is closed
//!     → join the watcher
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::Notify;

use crate::config::schema::{
    ServiceConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_SHUTDOWN_GRACE_SECS,
};
use crate::container::DependencyContainer;
use crate::errors::ChainError;
use crate::http::{ConnectionTimeouts, HttpServer, ServerConfig};
use crate::lifecycle::sequence::ShutdownSequence;
use crate::lifecycle::signals::TerminationSignals;
use crate::lifecycle::startup::{announce, BuildInfo};
use crate::observability::Logger;

/// A network service with a signal-driven, bounded shutdown.
pub struct Service {
    name: String,
    address: String,
    read_timeout: Duration,
    write_timeout: Duration,
    handler: Router,
    logger: Arc<dyn Logger>,
    container: Arc<dyn DependencyContainer>,
    build: BuildInfo,
    max_connections: usize,
    shutdown_grace: Duration,
    dependency_timeout: Option<Duration>,
}

impl Service {
    /// Create a service from fully resolved parts.
    ///
    /// `address` and the timeouts are not validated here.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        read_timeout: Duration,
        write_timeout: Duration,
        handler: Router,
        logger: Arc<dyn Logger>,
        container: Arc<dyn DependencyContainer>,
        build: BuildInfo,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            read_timeout,
            write_timeout,
            handler,
            logger,
            container,
            build,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            dependency_timeout: None,
        }
    }

    /// Create a service from validated configuration.
    pub fn from_config(
        config: &ServiceConfig,
        handler: Router,
        logger: Arc<dyn Logger>,
        container: Arc<dyn DependencyContainer>,
        build: BuildInfo,
    ) -> Self {
        Self::new(
            config.service.name.clone(),
            config.listener.bind_address.clone(),
            config.timeouts.read_timeout(),
            config.timeouts.write_timeout(),
            handler,
            logger,
            container,
            build,
        )
        .with_max_connections(config.listener.max_connections)
        .with_shutdown_grace(config.timeouts.shutdown_grace())
        .with_dependency_timeout(config.timeouts.dependency_shutdown_timeout())
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Drain deadline for in-flight connections (default 5s).
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Bound the container's shutdown call. Unbounded by default.
    pub fn with_dependency_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dependency_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Serve until SIGINT or SIGTERM, then shut down.
    ///
    /// Returns once the shutdown sequence has finished. Failures are logged,
    /// never returned.
    pub async fn run(self) {
        match TerminationSignals::register() {
            Ok(signals) => {
                self.run_until(async move {
                    let signal = signals.recv().await;
                    tracing::info!(signal = %signal, "Termination signal received");
                })
                .await
            }
            Err(e) => {
                let err = ChainError::new(e.to_string()).with_message("signal registration");
                self.stop_unarmed(err).await
            }
        }
    }

    /// Without signal handlers nothing could ever stop the server, so skip
    /// serving and release dependencies right away.
    async fn stop_unarmed(self, err: ChainError) {
        announce(&*self.logger, &self.name, &self.build, &self.address);
        self.logger.error(format_args!("{}", err));
        self.sequence(Arc::new(self.server())).execute().await;
    }

    /// Serve until `trigger` resolves, then shut down.
    ///
    /// A serve failure (for example a bind error) starts the shutdown
    /// sequence without waiting for `trigger`.
    pub async fn run_until<F>(self, trigger: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        announce(&*self.logger, &self.name, &self.build, &self.address);

        let server = Arc::new(self.server());
        let serve_failed = Arc::new(Notify::new());
        let sequence = self.sequence(Arc::clone(&server));

        let watcher = {
            let serve_failed = Arc::clone(&serve_failed);
            tokio::spawn(async move {
                tokio::select! {
                    _ = trigger => {}
                    _ = serve_failed.notified() => {}
                }
                sequence.execute().await;
            })
        };

        if let Err(e) = server.serve().await {
            self.logger.error(format_args!("{}", e));
            serve_failed.notify_one();
        }

        if let Err(e) = watcher.await {
            let err = ChainError::new(e.to_string()).with_message("shutdown watcher");
            self.logger.error(format_args!("{}", err));
        }
    }

    fn server(&self) -> HttpServer {
        let config = ServerConfig {
            address: self.address.clone(),
            timeouts: ConnectionTimeouts {
                read: self.read_timeout,
                write: self.write_timeout,
                idle: self.write_timeout,
            },
            max_connections: self.max_connections,
        };
        HttpServer::new(config, self.handler.clone())
    }

    fn sequence(&self, server: Arc<HttpServer>) -> ShutdownSequence {
        ShutdownSequence {
            name: self.name.clone(),
            server,
            container: Arc::clone(&self.container),
            logger: Arc::clone(&self.logger),
            grace: self.shutdown_grace,
            dependency_timeout: self.dependency_timeout,
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("build", &self.build)
            .field("max_connections", &self.max_connections)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("dependency_timeout", &self.dependency_timeout)
            .finish_non_exhaustive()
    }
}
