//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM and SIGINT handlers up front
//! - Resolve once on the first of either
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A signal delivered after `register` but before `recv` is not lost
//! - Both signals mean the same thing; later signals are not escalated

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to register {signal} handler: {source}")]
pub struct SignalError {
    signal: &'static str,
    #[source]
    source: std::io::Error,
}

/// The termination signal that was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Armed SIGINT/SIGTERM watcher.
#[cfg(unix)]
pub struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    /// Install the handlers. Must be called inside a Tokio runtime.
    pub fn register() -> Result<Self, SignalError> {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = signal(SignalKind::interrupt()).map_err(|source| SignalError {
            signal: "SIGINT",
            source,
        })?;
        let terminate = signal(SignalKind::terminate()).map_err(|source| SignalError {
            signal: "SIGTERM",
            source,
        })?;

        Ok(Self {
            interrupt,
            terminate,
        })
    }

    /// Wait for the first termination signal.
    pub async fn recv(mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
        }
    }
}

/// Ctrl+C watcher for platforms without Unix signals.
#[cfg(not(unix))]
pub struct TerminationSignals {
    _private: (),
}

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn register() -> Result<Self, SignalError> {
        Ok(Self { _private: () })
    }

    pub async fn recv(self) -> TerminationSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => TerminationSignal::Interrupt,
            Err(e) => {
                tracing::error!(error = %e, "Ctrl+C handler failed");
                std::future::pending().await
            }
        }
    }
}
