//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("invalid {field} '{address}': {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    if let Err(reason) = check_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            address: config.listener.bind_address.clone(),
            reason,
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let timeouts = &config.timeouts;
    let required = [
        ("read_secs", Some(timeouts.read_secs)),
        ("write_secs", Some(timeouts.write_secs)),
        ("shutdown_grace_secs", Some(timeouts.shutdown_grace_secs)),
        ("dependency_shutdown_secs", timeouts.dependency_shutdown_secs),
    ];
    for (field, value) in required {
        if value == Some(0) {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidAddress {
                field: "observability.metrics_address",
                address: config.observability.metrics_address.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `host:port` with a non-empty host (names resolve at bind time).
fn check_host_port(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| "expected host:port".to_string())?;

    if host.is_empty() {
        return Err("missing host".to_string());
    }

    port.parse::<u16>()
        .map(|_| ())
        .map_err(|e| format!("invalid port '{}': {}", port, e))
}
