//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Grace period granted to in-flight connections once shutdown starts.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Connection limit when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Root configuration for a lifecycle-managed service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service identity.
    pub service: ServiceSection,

    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Connection and shutdown timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Name used to correlate log lines.
    pub name: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: "demo".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address in `host:port` form (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to read a request's headers, in seconds.
    pub read_secs: u64,

    /// Time allowed to produce a response, in seconds. Also used as the
    /// keep-alive idle timeout.
    pub write_secs: u64,

    /// Drain deadline once shutdown starts, in seconds.
    pub shutdown_grace_secs: u64,

    /// Optional bound on the dependency container's shutdown, in seconds.
    pub dependency_shutdown_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            write_secs: 30,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
            dependency_shutdown_secs: None,
        }
    }
}

impl TimeoutConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn dependency_shutdown_timeout(&self) -> Option<Duration> {
        self.dependency_shutdown_secs.map(Duration::from_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
