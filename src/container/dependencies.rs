//! Ordered teardown of registered resources.

use std::sync::Mutex;

use crate::container::{BoxError, DependencyContainer};
use crate::errors::ChainError;

type Release = Box<dyn FnOnce() -> Result<(), BoxError> + Send + 'static>;

/// A container that releases resources in reverse registration order.
///
/// Every resource is released even when an earlier one fails; the first
/// failure is returned, annotated with the resource name. Each release
/// closure runs at most once.
#[derive(Default)]
pub struct Dependencies {
    resources: Mutex<Vec<(String, Release)>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource and the closure that releases it.
    pub fn register<F>(&mut self, name: impl Into<String>, release: F)
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.resources
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.into(), Box::new(release)));
    }

    /// Builder-style [`Dependencies::register`].
    pub fn with<F>(mut self, name: impl Into<String>, release: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        self.register(name, release);
        self
    }

    /// Resources not yet released.
    pub fn len(&self) -> usize {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DependencyContainer for Dependencies {
    fn shutdown(&self) -> Result<(), BoxError> {
        let resources = std::mem::take(
            &mut *self
                .resources
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        let mut first_failure: Option<ChainError> = None;
        for (name, release) in resources.into_iter().rev() {
            match release() {
                Ok(()) => tracing::debug!(resource = %name, "Resource released"),
                Err(e) => {
                    let err = ChainError::new(e.to_string()).with_message(&name);
                    tracing::error!(resource = %name, error = %e, "Resource release failed");
                    first_failure.get_or_insert(err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(Box::new(err)),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("pending", &self.len())
            .finish()
    }
}
