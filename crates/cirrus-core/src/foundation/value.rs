//! Attribute values and their type tags.
//!
//! [`AttributeValue`] is a closed union over the value kinds CloudEvents
//! defines, plus two escape hatches:
//!
//! - [`AttributeValue::Opaque`] holds an untyped JSON value, used for extension
//!   attributes no registered extension claims.
//! - [`AttributeValue::Custom`] holds a strongly typed, extension-defined value
//!   behind [`CustomValue`], recoverable through downcasting.
//!
//! # Coercion
//!
//! Values move between three representations: this enum, JSON tokens and
//! plain strings (transport headers). The conversions are:
//!
//! - [`AttributeValue::parse_as`]: string to a typed value
//! - [`AttributeValue::coerce_to`]: value to the type an attribute requires
//! - [`AttributeValue::from_json`] / [`AttributeValue::to_json`]: JSON tokens

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AttributeError, AttributeResult};
use crate::foundation::content_type::ContentType;
use crate::foundation::uri::Uri;

// ============================================================================
// Attribute Type
// ============================================================================

/// Type tag of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    String,
    Uri,
    Timestamp,
    Integer,
    Boolean,
    Binary,
    ContentType,
    /// No constraint; any value is accepted as is.
    Any,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Uri => "URI",
            Self::Timestamp => "timestamp",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::ContentType => "content type",
            Self::Any => "any",
        })
    }
}

// ============================================================================
// Extension-Defined Values
// ============================================================================

/// Object-safe view of a strongly typed extension value.
///
/// Implemented automatically for every `Serialize + PartialEq + Debug` type.
pub trait ExtensionValue: Any + fmt::Debug + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Renders the value in its serde form.
    fn to_json(&self) -> Result<Value, serde_json::Error>;

    /// Compares with another type-erased value.
    fn dyn_eq(&self, other: &dyn ExtensionValue) -> bool;

    /// Name of the concrete type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T> ExtensionValue for T
where
    T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn dyn_eq(&self, other: &dyn ExtensionValue) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A type-erased extension value that supports runtime downcasting.
#[derive(Clone)]
pub struct CustomValue {
    inner: Arc<dyn ExtensionValue>,
}

impl CustomValue {
    /// Wraps a typed value.
    pub fn new<V: ExtensionValue>(value: V) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Attempts to downcast to a concrete value type.
    pub fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns `true` if the wrapped value is a `V`.
    pub fn is<V: 'static>(&self) -> bool {
        self.inner.as_any().is::<V>()
    }

    /// Renders the wrapped value in its serde form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        self.inner.to_json()
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.dyn_eq(other.inner.as_ref())
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

// ============================================================================
// Attribute Value
// ============================================================================

/// The value of a single CloudEvent attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Uri(Uri),
    /// An instant, always normalized to UTC.
    Timestamp(DateTime<Utc>),
    Integer(i32),
    Boolean(bool),
    Binary(Vec<u8>),
    ContentType(ContentType),
    /// An untyped JSON value not claimed by any extension.
    Opaque(Value),
    /// An extension-defined typed value.
    Custom(CustomValue),
}

impl AttributeValue {
    /// Wraps an extension-defined value.
    pub fn custom<V: ExtensionValue>(value: V) -> Self {
        Self::Custom(CustomValue::new(value))
    }

    /// Returns the type tag of this value. Opaque and custom values are
    /// [`AttributeType::Any`].
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::String(_) => AttributeType::String,
            Self::Uri(_) => AttributeType::Uri,
            Self::Timestamp(_) => AttributeType::Timestamp,
            Self::Integer(_) => AttributeType::Integer,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::Binary(_) => AttributeType::Binary,
            Self::ContentType(_) => AttributeType::ContentType,
            Self::Opaque(_) | Self::Custom(_) => AttributeType::Any,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Self::Uri(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_content_type(&self) -> Option<&ContentType> {
        match self {
            Self::ContentType(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Self::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// Parses a string into a value of type `ty`.
    ///
    /// This is the conversion used for transport header strings.
    /// Timestamps must be RFC 3339 and are normalized to UTC. Binary values
    /// are standard base64.
    pub fn parse_as(text: &str, ty: AttributeType) -> AttributeResult<Self> {
        Ok(match ty {
            AttributeType::String | AttributeType::Any => Self::String(text.to_string()),
            AttributeType::Uri => Self::Uri(Uri::parse(text)?),
            AttributeType::Timestamp => Self::Timestamp(parse_timestamp(text)?),
            AttributeType::Integer => Self::Integer(
                text.trim()
                    .parse()
                    .map_err(|_| AttributeError::InvalidInteger(text.to_string()))?,
            ),
            AttributeType::Boolean => match text {
                "true" => Self::Boolean(true),
                "false" => Self::Boolean(false),
                _ => return Err(AttributeError::InvalidBoolean(text.to_string())),
            },
            AttributeType::Binary => Self::Binary(STANDARD.decode(text)?),
            AttributeType::ContentType => Self::ContentType(ContentType::parse(text)?),
        })
    }

    /// Converts this value to `ty`.
    ///
    /// Values already of the right type pass through. Strings are parsed
    /// with [`parse_as`](Self::parse_as). Opaque JSON is converted according
    /// to its token. Anything else is a type mismatch.
    pub fn coerce_to(self, ty: AttributeType) -> AttributeResult<Self> {
        if ty == AttributeType::Any || self.attribute_type() == ty {
            return Ok(self);
        }
        match self {
            Self::String(s) => Self::parse_as(&s, ty),
            Self::Opaque(value) => Self::from_json_as(&value, ty),
            Self::Uri(uri) if ty == AttributeType::String => Ok(Self::String(uri.to_string())),
            other => Err(AttributeError::mismatch(ty, other.describe())),
        }
    }

    /// Converts a JSON token by its own kind.
    ///
    /// Strings, booleans and integers in `i32` range become typed values.
    /// Everything else, including `null`, is kept as opaque JSON.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::String(s.clone()),
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => Self::Integer(i),
                None => Self::Opaque(value.clone()),
            },
            other => Self::Opaque(other.clone()),
        }
    }

    /// Converts a JSON token for a name with no declared type.
    ///
    /// Same as [`from_json`](Self::from_json), except that strings holding
    /// an RFC 3339 timestamp become [`Timestamp`](Self::Timestamp) values.
    pub fn infer_from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => parse_timestamp(s)
                .map(Self::Timestamp)
                .unwrap_or_else(|_| Self::String(s.clone())),
            other => Self::from_json(other),
        }
    }

    /// Converts a JSON token into a value of type `ty`.
    pub fn from_json_as(value: &Value, ty: AttributeType) -> AttributeResult<Self> {
        match (ty, value) {
            (AttributeType::Any, other) => Ok(Self::from_json(other)),
            (_, Value::String(s)) => Self::parse_as(s, ty),
            (AttributeType::Integer, Value::Number(n)) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Self::Integer)
                .ok_or_else(|| AttributeError::InvalidInteger(n.to_string())),
            (AttributeType::Boolean, Value::Bool(b)) => Ok(Self::Boolean(*b)),
            (AttributeType::Binary, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Self::Binary)
                .ok_or_else(|| AttributeError::mismatch(ty, "array of non-byte values")),
            (_, other) => Err(AttributeError::mismatch(ty, json_kind(other))),
        }
    }

    /// Renders the value as a JSON token.
    ///
    /// Timestamps use RFC 3339 in UTC, binary values use base64, and URIs and
    /// content types use their string form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        Ok(match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Uri(u) => Value::String(u.to_string()),
            Self::Timestamp(t) => Value::String(format_timestamp(t)),
            Self::Integer(i) => Value::from(*i),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Binary(b) => Value::String(STANDARD.encode(b)),
            Self::ContentType(c) => Value::String(c.to_string()),
            Self::Opaque(v) => v.clone(),
            Self::Custom(c) => c.to_json()?,
        })
    }

    fn describe(&self) -> String {
        match self {
            Self::Custom(c) => c.type_name().to_string(),
            Self::Opaque(v) => json_kind(v).to_string(),
            other => other.attribute_type().to_string(),
        }
    }
}

/// Parses an RFC 3339 timestamp, normalizing to UTC.
pub fn parse_timestamp(text: &str) -> AttributeResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| AttributeError::InvalidTimestamp {
            value: text.to_string(),
            source,
        })
}

/// Formats a timestamp as RFC 3339 with a `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Uri(u) => write!(f, "{u}"),
            Self::Timestamp(t) => f.write_str(&format_timestamp(t)),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Binary(b) => f.write_str(&STANDARD.encode(b)),
            Self::ContentType(c) => write!(f, "{c}"),
            Self::Opaque(v) => write!(f, "{v}"),
            Self::Custom(c) => match c.to_json() {
                Ok(v) => write!(f, "{v}"),
                Err(_) => write!(f, "{c:?}"),
            },
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Uri> for AttributeValue {
    fn from(value: Uri) -> Self {
        Self::Uri(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<ContentType> for AttributeValue {
    fn from(value: ContentType) -> Self {
        Self::ContentType(value)
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        Self::Opaque(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, PartialEq, serde::Serialize)]
    struct Point {
        x: i32,
    }

    #[test]
    fn test_parse_timestamp_normalizes_to_utc() {
        let value = AttributeValue::parse_as("2018-04-05T19:31:00+02:00", AttributeType::Timestamp)
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2018, 4, 5, 17, 31, 0).unwrap();
        assert_eq!(value, AttributeValue::Timestamp(expected));
        assert_eq!(value.to_json().unwrap(), json!("2018-04-05T17:31:00Z"));
    }

    #[test]
    fn test_parse_as_errors() {
        assert!(matches!(
            AttributeValue::parse_as("yesterday", AttributeType::Timestamp),
            Err(AttributeError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            AttributeValue::parse_as("99999999999", AttributeType::Integer),
            Err(AttributeError::InvalidInteger(_))
        ));
        assert!(matches!(
            AttributeValue::parse_as("True", AttributeType::Boolean),
            Err(AttributeError::InvalidBoolean(_))
        ));
        assert!(matches!(
            AttributeValue::parse_as("!!", AttributeType::Binary),
            Err(AttributeError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_from_json_by_token() {
        assert_eq!(AttributeValue::from_json(&json!("a")), AttributeValue::from("a"));
        assert_eq!(AttributeValue::from_json(&json!(5)), AttributeValue::Integer(5));
        assert_eq!(AttributeValue::from_json(&json!(true)), AttributeValue::Boolean(true));
        assert_eq!(
            AttributeValue::from_json(&json!(5_000_000_000i64)),
            AttributeValue::Opaque(json!(5_000_000_000i64))
        );
        assert_eq!(
            AttributeValue::from_json(&json!({"a": 1})),
            AttributeValue::Opaque(json!({"a": 1}))
        );
    }

    #[test]
    fn test_infer_from_json_reads_timestamps() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            AttributeValue::infer_from_json(&json!("2020-01-01T00:00:00Z")),
            AttributeValue::Timestamp(expected)
        );
        assert_eq!(
            AttributeValue::infer_from_json(&json!("2020-01-01")),
            AttributeValue::from("2020-01-01")
        );
        assert_eq!(AttributeValue::infer_from_json(&json!(7)), AttributeValue::Integer(7));
    }

    #[test]
    fn test_coerce_to() {
        let uri = AttributeValue::from("https://x/").coerce_to(AttributeType::Uri).unwrap();
        assert!(uri.as_uri().is_some());

        let same = AttributeValue::Integer(3).coerce_to(AttributeType::Integer).unwrap();
        assert_eq!(same, AttributeValue::Integer(3));

        let err = AttributeValue::Boolean(true).coerce_to(AttributeType::Uri).unwrap_err();
        assert!(matches!(err, AttributeError::TypeMismatch { expected: AttributeType::Uri, .. }));

        let bytes = AttributeValue::Opaque(json!([1, 2, 255]))
            .coerce_to(AttributeType::Binary)
            .unwrap();
        assert_eq!(bytes.as_binary(), Some(&[1u8, 2, 255][..]));
    }

    #[test]
    fn test_custom_values() {
        let a = AttributeValue::custom(Point { x: 1 });
        let b = AttributeValue::custom(Point { x: 1 });
        let c = AttributeValue::custom(Point { x: 2 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, AttributeValue::custom(1i32));

        let custom = a.as_custom().unwrap();
        assert!(custom.is::<Point>());
        assert_eq!(custom.downcast_ref::<Point>().unwrap().x, 1);
        assert_eq!(a.to_json().unwrap(), json!({"x": 1}));
        assert_eq!(a.attribute_type(), AttributeType::Any);
    }

    #[test]
    fn test_binary_to_json_is_base64() {
        let value = AttributeValue::Binary(b"hello".to_vec());
        assert_eq!(value.to_json().unwrap(), json!("aGVsbG8="));
        assert_eq!(
            AttributeValue::parse_as("aGVsbG8=", AttributeType::Binary).unwrap(),
            value
        );
    }
}
