//! Field kinds and coerced values.
//!
//! A bound field declares one [`FieldKind`] out of a small closed set. The
//! coercion layer turns raw tokens into a [`Value`] of that kind, and the
//! [`Field`] trait knows how to store a value into a concrete Rust field,
//! either overwriting it or appending to it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoercionError;

/// Coercion kind declared by a bound field.
///
/// The set is closed on purpose: anything outside it is carried as
/// [`FieldKind::Unsupported`] and fails when a value is coerced into it.
///
/// # Examples
///
/// ```
/// use cmdln_core::FieldKind;
///
/// assert!(!FieldKind::Bool.takes_value());
/// assert!(FieldKind::Int32.takes_value());
/// assert_eq!(FieldKind::Float.to_string(), "float");
/// assert_eq!(FieldKind::Unsupported("duration".into()).to_string(), "duration");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// `true`/`false`; a bare flag means `true`.
    Bool,
    /// Default-width signed integer (`isize`).
    Int,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
    /// A single byte.
    Byte,
    /// A kind the coercion layer cannot produce.
    Unsupported(String),
}

impl FieldKind {
    /// Returns a short lowercase label used in messages.
    pub fn label(&self) -> &str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Int16 => "int16",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Float => "float",
            FieldKind::String => "string",
            FieldKind::Byte => "byte",
            FieldKind::Unsupported(name) => name,
        }
    }

    /// Returns `true` if a flag of this kind expects a value token.
    ///
    /// Only booleans can stand alone; presence alone means `true`.
    pub fn takes_value(&self) -> bool {
        !matches!(self, FieldKind::Bool)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A coerced value, tagged with its kind.
///
/// # Examples
///
/// ```
/// use cmdln_core::{FieldKind, Value};
///
/// let v = Value::Int32(7);
/// assert_eq!(v.kind(), FieldKind::Int32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(isize),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f64),
    String(String),
    Byte(u8),
}

impl Value {
    /// Returns the kind this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Bool(_) => FieldKind::Bool,
            Value::Int(_) => FieldKind::Int,
            Value::Int16(_) => FieldKind::Int16,
            Value::Int32(_) => FieldKind::Int32,
            Value::Int64(_) => FieldKind::Int64,
            Value::Float(_) => FieldKind::Float,
            Value::String(_) => FieldKind::String,
            Value::Byte(_) => FieldKind::Byte,
        }
    }
}

/// A Rust field that can receive coerced values.
///
/// Implemented for every scalar of the closed kind set (`bool`, `isize`,
/// `i16`, `i32`, `i64`, `f64`, `String`, `u8`), for `Option<_>` of each
/// (set on first assignment), and for `Vec<_>` of each (repeated form:
/// every assignment appends).
///
/// # Examples
///
/// ```
/// use cmdln_core::{Field, FieldKind, Value};
///
/// let mut port: Option<i32> = None;
/// port.assign(Value::Int32(8080)).unwrap();
/// port.assign(Value::Int32(9090)).unwrap();
/// assert_eq!(port, Some(9090)); // last write wins
///
/// let mut tags: Vec<String> = Vec::new();
/// tags.assign(Value::String("a".into())).unwrap();
/// tags.assign(Value::String("b".into())).unwrap();
/// assert_eq!(tags, vec!["a", "b"]);
/// assert!(<Vec<String> as Field>::repeated());
/// assert_eq!(<Vec<String> as Field>::kind(), FieldKind::String);
/// ```
pub trait Field {
    /// Kind every assigned value must have.
    fn kind() -> FieldKind;

    /// Whether assignments accumulate instead of overwrite.
    fn repeated() -> bool;

    /// Stores `value` into the field.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError::NotConvertible`] if `value` is not of
    /// [`Field::kind`].
    fn assign(&mut self, value: Value) -> Result<(), CoercionError>;
}

macro_rules! impl_field {
    ($ty:ty, $kind:ident) => {
        impl Field for $ty {
            fn kind() -> FieldKind {
                FieldKind::$kind
            }

            fn repeated() -> bool {
                false
            }

            fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
                match value {
                    Value::$kind(v) => {
                        *self = v;
                        Ok(())
                    }
                    _ => Err(CoercionError::NotConvertible {
                        kind: FieldKind::$kind,
                    }),
                }
            }
        }

        impl Field for Option<$ty> {
            fn kind() -> FieldKind {
                FieldKind::$kind
            }

            fn repeated() -> bool {
                false
            }

            fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
                match value {
                    Value::$kind(v) => {
                        *self = Some(v);
                        Ok(())
                    }
                    _ => Err(CoercionError::NotConvertible {
                        kind: FieldKind::$kind,
                    }),
                }
            }
        }

        impl Field for Vec<$ty> {
            fn kind() -> FieldKind {
                FieldKind::$kind
            }

            fn repeated() -> bool {
                true
            }

            fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
                match value {
                    Value::$kind(v) => {
                        self.push(v);
                        Ok(())
                    }
                    _ => Err(CoercionError::NotConvertible {
                        kind: FieldKind::$kind,
                    }),
                }
            }
        }
    };
}

impl_field!(bool, Bool);
impl_field!(isize, Int);
impl_field!(i16, Int16);
impl_field!(i32, Int32);
impl_field!(i64, Int64);
impl_field!(f64, Float);
impl_field!(String, String);
impl_field!(u8, Byte);
