//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     BuildInfo + name + address → startup line
//!
//! Run (service.rs):
//!     Register signals → Spawn watcher → Serve → Join watcher
//!
//! Shutdown (sequence.rs, shutdown.rs):
//!     Signal received → Stop accepting → Drain (bounded) → Release dependencies → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Signals are armed before the listener accepts
//! - Ordered shutdown: stop accept, drain, release dependencies
//! - Drain has a deadline; no forced exit after it
//! - Every phase runs even if the previous one failed

pub mod sequence;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use sequence::ShutdownPhase;
pub use service::Service;
pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{SignalError, TerminationSignal, TerminationSignals};
pub use startup::BuildInfo;
