//! Conversion of raw tokens into typed values.
//!
//! [`coerce`] is the single entry point. It accepts the declared kind, the
//! literal value found after `=` (possibly empty), and optional access to
//! the tokens still pending in the stream. When the literal is empty and the
//! kind expects a value, the next pending token is taken instead, which is
//! how `--flag value` works alongside `--flag=value`.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{CoercionError, Result};
use crate::{FieldKind, Value};

/// Pending tokens a coercion may pull one value from.
pub type Lookahead<'a> = &'a mut dyn Iterator<Item = String>;

/// Converts `raw` into a [`Value`] of the given kind.
///
/// # Errors
///
/// - [`CoercionError::Invalid`] when a number does not parse.
/// - [`CoercionError::MissingValue`] when the value is empty and no token
///   can be pulled from `lookahead`.
/// - [`CoercionError::ByteLength`] when a byte value is not one byte long.
/// - [`CoercionError::NotConvertible`] for [`FieldKind::Unsupported`].
///
/// # Examples
///
/// ```
/// use cmdln_core::{coerce, FieldKind, Value};
///
/// assert_eq!(coerce(&FieldKind::Bool, "", None).unwrap(), Value::Bool(true));
/// assert_eq!(coerce(&FieldKind::Int16, "-12", None).unwrap(), Value::Int16(-12));
///
/// // `--config prod.yaml`: the value comes from the next pending token.
/// let mut rest = vec!["prod.yaml".to_string()].into_iter();
/// let v = coerce(&FieldKind::String, "", Some(&mut rest)).unwrap();
/// assert_eq!(v, Value::String("prod.yaml".into()));
/// assert!(rest.next().is_none());
/// ```
pub fn coerce(kind: &FieldKind, raw: &str, lookahead: Option<Lookahead<'_>>) -> Result<Value> {
    match kind {
        FieldKind::Bool => return Ok(Value::Bool(parse_bool(raw))),
        FieldKind::Unsupported(_) => {
            return Err(CoercionError::NotConvertible { kind: kind.clone() });
        }
        _ => {}
    }

    let pulled;
    let text = if raw.is_empty() {
        match lookahead.and_then(|rest| rest.next()) {
            Some(next) => {
                pulled = next;
                pulled.as_str()
            }
            None => return Err(CoercionError::MissingValue { kind: kind.clone() }),
        }
    } else {
        raw
    };

    match kind {
        FieldKind::Int => parse_number(kind, text).map(Value::Int),
        FieldKind::Int16 => parse_number(kind, text).map(Value::Int16),
        FieldKind::Int32 => parse_number(kind, text).map(Value::Int32),
        FieldKind::Int64 => parse_number(kind, text).map(Value::Int64),
        FieldKind::Float => parse_number(kind, text).map(Value::Float),
        FieldKind::String => Ok(Value::String(unquote(text).to_string())),
        FieldKind::Byte => parse_byte(text).map(Value::Byte),
        FieldKind::Bool => Ok(Value::Bool(parse_bool(text))),
        FieldKind::Unsupported(_) => Err(CoercionError::NotConvertible { kind: kind.clone() }),
    }
}

/// Interprets a boolean token.
///
/// Presence implies `true`: the empty string and any unrecognized text are
/// `true`; only the explicit false spellings give `false`.
///
/// # Examples
///
/// ```
/// use cmdln_core::parse_bool;
///
/// assert!(parse_bool(""));
/// assert!(parse_bool("TRUE"));
/// assert!(parse_bool("yes"));
/// assert!(!parse_bool("0"));
/// assert!(!parse_bool("False"));
/// ```
pub fn parse_bool(raw: &str) -> bool {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => true,
        "0" | "f" | "F" | "false" | "FALSE" | "False" => false,
        _ => true,
    }
}

/// Strips one matching pair of surrounding `"` or `'` quotes.
///
/// # Examples
///
/// ```
/// use cmdln_core::unquote;
///
/// assert_eq!(unquote("\"hello world\""), "hello world");
/// assert_eq!(unquote("'x'"), "x");
/// assert_eq!(unquote("\"mixed'"), "\"mixed'");
/// assert_eq!(unquote("\""), "\"");
/// ```
pub fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn parse_number<N>(kind: &FieldKind, text: &str) -> Result<N>
where
    N: FromStr,
    N::Err: Display,
{
    text.parse::<N>().map_err(|e| CoercionError::Invalid {
        kind: kind.clone(),
        value: text.to_string(),
        reason: e.to_string(),
    })
}

fn parse_byte(text: &str) -> Result<u8> {
    match text.as_bytes() {
        [b] => Ok(*b),
        bytes => Err(CoercionError::ByteLength {
            value: text.to_string(),
            len: bytes.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_spellings() {
        for s in ["1", "t", "T", "true", "TRUE", "True", "", "yes", "on"] {
            assert_eq!(coerce(&FieldKind::Bool, s, None).unwrap(), Value::Bool(true), "{s}");
        }
        for s in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(coerce(&FieldKind::Bool, s, None).unwrap(), Value::Bool(false), "{s}");
        }
    }

    #[test]
    fn test_bool_never_pulls_lookahead() {
        let mut rest = vec!["deploy".to_string()].into_iter();
        let v = coerce(&FieldKind::Bool, "", Some(&mut rest)).unwrap();
        assert_eq!(v, Value::Bool(true));
        assert_eq!(rest.next().as_deref(), Some("deploy"));
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(coerce(&FieldKind::Int, "42", None).unwrap(), Value::Int(42));
        assert_eq!(coerce(&FieldKind::Int32, "-7", None).unwrap(), Value::Int32(-7));
        assert_eq!(
            coerce(&FieldKind::Int64, "9000000000", None).unwrap(),
            Value::Int64(9_000_000_000)
        );
    }

    #[test]
    fn test_integer_overflow_is_invalid() {
        let err = coerce(&FieldKind::Int16, "70000", None).unwrap_err();
        assert!(matches!(err, CoercionError::Invalid { kind: FieldKind::Int16, .. }));
    }

    #[test]
    fn test_float_parse_failure() {
        assert_eq!(coerce(&FieldKind::Float, "2.5", None).unwrap(), Value::Float(2.5));
        let err = coerce(&FieldKind::Float, "two", None).unwrap_err();
        match err {
            CoercionError::Invalid { value, .. } => assert_eq!(value, "two"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_number_pulls_next_token_when_empty() {
        let mut rest = vec!["5".to_string(), "run".to_string()].into_iter();
        let v = coerce(&FieldKind::Int32, "", Some(&mut rest)).unwrap();
        assert_eq!(v, Value::Int32(5));
        assert_eq!(rest.next().as_deref(), Some("run"));
    }

    #[test]
    fn test_string_missing_value() {
        let mut rest = Vec::<String>::new().into_iter();
        let err = coerce(&FieldKind::String, "", Some(&mut rest)).unwrap_err();
        assert_eq!(
            err,
            CoercionError::MissingValue {
                kind: FieldKind::String
            }
        );
        let err = coerce(&FieldKind::String, "", None).unwrap_err();
        assert!(matches!(err, CoercionError::MissingValue { .. }));
    }

    #[test]
    fn test_string_is_unquoted() {
        let v = coerce(&FieldKind::String, "'This is a test?'", None).unwrap();
        assert_eq!(v, Value::String("This is a test?".into()));
    }

    #[test]
    fn test_byte_length() {
        assert_eq!(coerce(&FieldKind::Byte, "x", None).unwrap(), Value::Byte(b'x'));
        let err = coerce(&FieldKind::Byte, "xy", None).unwrap_err();
        assert_eq!(
            err,
            CoercionError::ByteLength {
                value: "xy".into(),
                len: 2
            }
        );
    }

    #[test]
    fn test_unsupported_kind_does_not_consume() {
        let kind = FieldKind::Unsupported("duration".into());
        let mut rest = vec!["5s".to_string()].into_iter();
        let err = coerce(&kind, "", Some(&mut rest)).unwrap_err();
        assert_eq!(err.to_string(), "value not convertible to duration");
        assert_eq!(rest.next().as_deref(), Some("5s"));
    }
}
