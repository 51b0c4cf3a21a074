//! Event payloads.

use std::any::Any;
use std::io::Read;

use serde_json::Value;

use crate::error::CloudEventResult;
use crate::foundation::value::{CustomValue, ExtensionValue};

/// The `data` payload of a CloudEvent.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Raw bytes, written as `data_base64` in 1.0 structured mode.
    Binary(Vec<u8>),
    /// Text content.
    String(String),
    /// An untyped JSON value.
    Json(Value),
    /// A value of a formatter's payload type.
    Typed(CustomValue),
}

impl Data {
    /// Wraps a payload value.
    ///
    /// Bytes, strings and JSON values map to their dedicated variants so a
    /// formatter bound to one of those types produces the same data as an
    /// untyped one. A JSON string becomes [`Data::String`]. Anything else is
    /// stored as [`Data::Typed`].
    pub fn from_typed<T: ExtensionValue>(value: T) -> Self {
        let mut slot = Some(value);
        let any: &mut dyn Any = &mut slot;
        if let Some(bytes) = take_as::<Vec<u8>>(any) {
            return Self::Binary(bytes);
        }
        if let Some(text) = take_as::<String>(any) {
            return Self::String(text);
        }
        if let Some(json) = take_as::<Value>(any) {
            return match json {
                Value::String(text) => Self::String(text),
                other => Self::Json(other),
            };
        }
        match slot {
            Some(value) => Self::Typed(CustomValue::new(value)),
            None => Self::Json(Value::Null),
        }
    }

    /// Reads a binary payload from a reader.
    pub fn from_reader(mut reader: impl Read) -> CloudEventResult<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::Binary(buf))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to downcast a typed payload.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Typed(c) => c.downcast_ref(),
            _ => None,
        }
    }

    /// Returns `true` for raw byte payloads.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Renders the payload in its JSON form. Bytes become an array of numbers.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Binary(b) => serde_json::to_value(b),
            Self::String(s) => Ok(Value::String(s.clone())),
            Self::Json(v) => Ok(v.clone()),
            Self::Typed(c) => c.to_json(),
        }
    }

    /// Produces the bytes used as a transport message body.
    ///
    /// Binary payloads are used as is and strings as UTF-8. JSON and typed
    /// payloads are serialized.
    pub fn to_body_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Binary(b) => Ok(b.clone()),
            Self::String(s) => Ok(s.as_bytes().to_vec()),
            Self::Json(v) => serde_json::to_vec(v),
            Self::Typed(c) => serde_json::to_vec(&c.to_json()?),
        }
    }
}

fn take_as<U: 'static>(slot: &mut dyn Any) -> Option<U> {
    slot.downcast_mut::<Option<U>>().and_then(Option::take)
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, serde::Serialize)]
    struct Order {
        id: u32,
    }

    #[test]
    fn test_from_typed_specializes_builtin_types() {
        assert_eq!(Data::from_typed(vec![1u8, 2]), Data::Binary(vec![1, 2]));
        assert_eq!(Data::from_typed("hi".to_string()), Data::String("hi".into()));
        assert_eq!(Data::from_typed(json!({"a": 1})), Data::Json(json!({"a": 1})));
        assert_eq!(Data::from_typed(json!("<x/>")), Data::String("<x/>".into()));

        let typed = Data::from_typed(Order { id: 7 });
        assert_eq!(typed.downcast_ref::<Order>(), Some(&Order { id: 7 }));
        assert_eq!(typed.to_json().unwrap(), json!({"id": 7}));
    }

    #[test]
    fn test_body_bytes() {
        assert_eq!(Data::from("<x/>").to_body_bytes().unwrap(), b"<x/>");
        assert_eq!(Data::Json(json!([1])).to_body_bytes().unwrap(), b"[1]");
        assert_eq!(Data::Binary(vec![0xff]).to_body_bytes().unwrap(), vec![0xff]);
    }

    #[test]
    fn test_from_reader() {
        let data = Data::from_reader(&b"abc"[..]).unwrap();
        assert_eq!(data.as_bytes(), Some(&b"abc"[..]));
    }
}
