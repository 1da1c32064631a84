//! Error types for route registration and dispatch.
//!
//! [`ConfigError`] is returned from setup and is fatal. [`DispatchError`]
//! values are collected per invocation into an [`ErrorStack`] on the
//! [`Context`](crate::Context); none of them abort the parse on their own.

use std::fmt;

use cmdln_core::BindError;
use thiserror::Error;

/// Setup-time failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pattern with the same normalized skeleton is already registered.
    #[error("duplicate route pattern '{pattern}' (normalized: '{normalized}')")]
    DuplicatePattern { pattern: String, normalized: String },

    /// The pattern string contains no segments.
    #[error("route pattern cannot be empty")]
    EmptyPattern,

    /// File I/O failure while loading or saving configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Per-invocation failures, accumulated on the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// An option or capture value could not be coerced.
    #[error(transparent)]
    Binding(#[from] BindError),

    /// More than one route accepted the positional tokens.
    #[error("ambiguous command '{root}': matched {}", .patterns.join(", "))]
    Conflict { root: String, patterns: Vec<String> },

    /// Unrecognized flags were present and the router is configured to
    /// treat them as an error.
    #[error("unhandled flags: {}", .0.join(", "))]
    UnhandledFlags(Vec<String>),
}

/// Failures of the interactive prompt helpers.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The answer to a yes/no question was neither.
    #[error("invalid response: '{0}'")]
    InvalidResponse(String),
}

/// Append-only list of dispatch errors in occurrence order.
///
/// # Examples
///
/// ```
/// use cmdln_router::{DispatchError, ErrorStack};
///
/// let mut stack = ErrorStack::default();
/// stack.push(DispatchError::UnhandledFlags(vec!["--force".into()]));
/// stack.push(DispatchError::Conflict {
///     root: "task".into(),
///     patterns: vec!["task run".into(), "task :name".into()],
/// });
/// assert_eq!(stack.len(), 2);
/// assert_eq!(
///     stack.to_string(),
///     "unhandled flags: --force; ambiguous command 'task': matched task run, task :name"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorStack {
    errors: Vec<DispatchError>,
}

impl ErrorStack {
    pub fn push(&mut self, error: impl Into<DispatchError>) {
        self.errors.push(error.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &DispatchError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if any entry is a route conflict.
    pub fn has_conflict(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, DispatchError::Conflict { .. }))
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorStack {}

impl<'a> IntoIterator for &'a ErrorStack {
    type Item = &'a DispatchError;
    type IntoIter = std::slice::Iter<'a, DispatchError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Convenience alias for setup results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
