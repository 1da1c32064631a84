//! Error types for binding and coercion.
//!
//! Coercion failures are local: the field is left untouched and the caller
//! decides whether to keep going. [`BindError`] attaches the flag or capture
//! name the failure happened under.

use thiserror::Error;

use crate::FieldKind;

/// Errors produced while converting a raw token into a field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The token does not parse as the declared kind.
    #[error("invalid {kind} value '{value}': {reason}")]
    Invalid {
        kind: FieldKind,
        value: String,
        reason: String,
    },

    /// A value was expected but neither an explicit value nor a following
    /// token was available.
    #[error("missing value for {kind} field")]
    MissingValue { kind: FieldKind },

    /// A byte field received zero or more than one byte.
    #[error("expected exactly one byte, got {len} in '{value}'")]
    ByteLength { value: String, len: usize },

    /// The declared kind cannot be produced from text.
    #[error("value not convertible to {kind}")]
    NotConvertible { kind: FieldKind },
}

/// A coercion failure attributed to a flag or capture name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot bind '{name}': {source}")]
pub struct BindError {
    /// Flag string or capture name the value was bound under.
    pub name: String,
    /// Underlying coercion failure.
    #[source]
    pub source: CoercionError,
}

impl BindError {
    pub fn new(name: impl Into<String>, source: CoercionError) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Convenience alias for results with [`CoercionError`].
pub type Result<T> = std::result::Result<T, CoercionError>;
