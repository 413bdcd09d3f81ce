//! Service lifecycle library: serve, watch for termination, shut down within
//! a deadline.

pub mod config;
pub mod container;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use container::{BoxError, Dependencies, DependencyContainer};
pub use errors::ChainError;
pub use http::HttpServer;
pub use lifecycle::{BuildInfo, Service};
pub use observability::{Logger, TracingLogger};
