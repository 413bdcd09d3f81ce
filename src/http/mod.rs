//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::listener)
//!     → server.rs (accept loop, spawn per connection)
//!     → connection.rs (hyper HTTP/1.1, timeouts, graceful close)
//!     → caller's Router (opaque handler)
//! ```

pub mod connection;
pub mod server;

pub use connection::ConnectionTimeouts;
pub use server::{HttpServer, ServeError, ServerConfig, ShutdownError};
