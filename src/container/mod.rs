//! Dependency container contract.
//!
//! # Responsibilities
//! - Define what the lifecycle layer needs from the owner of subordinate
//!   resources (database handles, queues): a single teardown call
//! - Provide `Dependencies`, a reference container for simple services
//!
//! # Design Decisions
//! - `shutdown` is synchronous; the lifecycle layer runs it on the blocking pool
//! - Called at most once per process; implementations serialize their own teardown

pub mod dependencies;

pub use dependencies::Dependencies;

/// Boxed error returned by container and resource teardown.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An aggregate of owned resources exposing one teardown operation.
pub trait DependencyContainer: Send + Sync + 'static {
    /// Release every owned resource.
    fn shutdown(&self) -> Result<(), BoxError>;
}
