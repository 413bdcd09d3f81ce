//! Error values shared across subsystems.
//!
//! # Design Decisions
//! - `ChainError` is a plain message with functional context prefixes
//! - No kind taxonomy; typed errors live next to the code that raises them

pub mod chain;

pub use chain::ChainError;
