//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Define the `Logger` sink the lifecycle layer reports through
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level from `RUST_LOG`, falling back to configuration
//! - Logging never fails from the caller's point of view

use std::fmt;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Leveled, fire-and-forget log sink.
///
/// Implementations must not block and must not panic.
pub trait Logger: Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// `Logger` that forwards to `tracing`, tagging each event with the service.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    service: String,
}

impl TracingLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(service = %self.service, "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(service = %self.service, "{}", args);
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=info", config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
