//! Context-annotated error values.

use thiserror::Error;

/// Separator placed between a context segment and the message it annotates.
const CONTEXT_SEPARATOR: &str = " : ";

/// An immutable error carrying a rendered message.
///
/// Context is added with [`ChainError::with_message`], which returns a new
/// value and leaves the original untouched:
///
/// ```
/// use service_lifecycle::errors::ChainError;
///
/// let base = ChainError::new("connection refused");
/// let annotated = base.with_message("database shutdown");
///
/// assert_eq!(annotated.to_string(), "database shutdown : connection refused");
/// assert_eq!(base.to_string(), "connection refused");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Error)]
#[error("{message}")]
pub struct ChainError {
    message: String,
}

impl ChainError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The rendered message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Return a new error with `context` prepended.
    ///
    /// An empty context yields an equal copy of `self`.
    pub fn with_message(&self, context: &str) -> Self {
        if context.is_empty() {
            return self.clone();
        }

        let mut message =
            String::with_capacity(context.len() + CONTEXT_SEPARATOR.len() + self.message.len());
        message.push_str(context);
        message.push_str(CONTEXT_SEPARATOR);
        message.push_str(&self.message);

        Self { message }
    }
}

impl From<String> for ChainError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ChainError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Build a [`ChainError`] from `format!`-style arguments.
///
/// ```
/// use service_lifecycle::chain_error;
///
/// let err = chain_error!("error {}", "message");
/// assert_eq!(err.to_string(), "error message");
/// ```
#[macro_export]
macro_rules! chain_error {
    ($($arg:tt)*) => {
        $crate::errors::ChainError::new(::std::format!($($arg)*))
    };
}
