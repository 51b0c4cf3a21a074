//! Ready-made extension descriptors.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::Extension;
use crate::error::{AttributeError, AttributeResult};
use crate::foundation::value::{AttributeType, AttributeValue, ExtensionValue};

// ============================================================================
// String Extension
// ============================================================================

/// A single string-valued extension attribute.
#[derive(Debug, Clone)]
pub struct StringExtension {
    attribute: String,
    preset: Option<String>,
}

impl StringExtension {
    /// Creates an extension owning `attribute` (stored lowercase).
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_ascii_lowercase(),
            preset: None,
        }
    }

    /// Sets a value copied into every event this extension is attached to.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.preset = Some(value.into());
        self
    }
}

impl Extension for StringExtension {
    fn name(&self) -> &str {
        &self.attribute
    }

    fn attribute_names(&self) -> Vec<&str> {
        vec![self.attribute.as_str()]
    }

    fn validate_and_normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>> {
        if !self.owns(name) {
            return Ok(None);
        }
        match value {
            AttributeValue::String(_) => Ok(Some(value.clone())),
            _ => Err(AttributeError::rejected(
                &self.attribute,
                name,
                "value is missing or not a string",
            )),
        }
    }

    fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.owns(name).then_some(AttributeType::String)
    }

    fn preset_values(&self) -> Vec<(String, AttributeValue)> {
        self.preset
            .iter()
            .map(|v| (self.attribute.clone(), AttributeValue::from(v.as_str())))
            .collect()
    }
}

// ============================================================================
// Typed Extension
// ============================================================================

/// An extension attribute whose loosely typed literal is deserialized into
/// a strongly typed `V`.
///
/// The value is stored as [`AttributeValue::Custom`] and can be read back
/// with [`CloudEvent::extension_value`](crate::CloudEvent::extension_value).
pub struct TypedExtension<V> {
    attribute: String,
    _marker: PhantomData<fn() -> V>,
}

impl<V> TypedExtension<V> {
    /// Creates an extension owning `attribute` (stored lowercase).
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_ascii_lowercase(),
            _marker: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for TypedExtension<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedExtension")
            .field("attribute", &self.attribute)
            .field("type", &std::any::type_name::<V>())
            .finish()
    }
}

impl<V> Extension for TypedExtension<V>
where
    V: DeserializeOwned + ExtensionValue + Clone,
{
    fn name(&self) -> &str {
        &self.attribute
    }

    fn attribute_names(&self) -> Vec<&str> {
        vec![self.attribute.as_str()]
    }

    fn validate_and_normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>> {
        if !self.owns(name) {
            return Ok(None);
        }
        if let Some(typed) = value.as_custom().and_then(|c| c.downcast_ref::<V>()) {
            return Ok(Some(AttributeValue::custom(typed.clone())));
        }

        let reject = |reason: String| AttributeError::rejected(&self.attribute, name, reason);
        let json = value.to_json().map_err(|e| reject(e.to_string()))?;
        let typed: V = serde_json::from_value(json).map_err(|e| reject(e.to_string()))?;
        Ok(Some(AttributeValue::custom(typed)))
    }

    fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.owns(name).then_some(AttributeType::Any)
    }
}

// ============================================================================
// Sequence Extension
// ============================================================================

/// The `sequence` extension: a producer-assigned position of the event in a
/// stream, with an optional `sequencetype` describing its interpretation.
///
/// Integer values are accepted and normalized to their string form.
#[derive(Debug, Clone, Default)]
pub struct SequenceExtension {
    sequence_type: Option<String>,
}

impl SequenceExtension {
    pub const SEQUENCE: &'static str = "sequence";
    pub const SEQUENCE_TYPE: &'static str = "sequencetype";
    /// The only `sequencetype` defined by the extension.
    pub const INTEGER: &'static str = "Integer";

    pub fn new() -> Self {
        Self::default()
    }

    /// Presets `sequencetype` to `Integer`.
    pub fn integer() -> Self {
        Self {
            sequence_type: Some(Self::INTEGER.to_string()),
        }
    }
}

impl Extension for SequenceExtension {
    fn name(&self) -> &str {
        Self::SEQUENCE
    }

    fn attribute_names(&self) -> Vec<&str> {
        vec![Self::SEQUENCE, Self::SEQUENCE_TYPE]
    }

    fn validate_and_normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>> {
        if !self.owns(name) {
            return Ok(None);
        }
        match value {
            AttributeValue::String(_) => Ok(Some(value.clone())),
            AttributeValue::Integer(i) if name.eq_ignore_ascii_case(Self::SEQUENCE) => {
                Ok(Some(AttributeValue::String(i.to_string())))
            }
            _ => Err(AttributeError::rejected(
                Self::SEQUENCE,
                name,
                "value must be a string",
            )),
        }
    }

    fn preset_values(&self) -> Vec<(String, AttributeValue)> {
        self.sequence_type
            .iter()
            .map(|t| (Self::SEQUENCE_TYPE.to_string(), AttributeValue::from(t.as_str())))
            .collect()
    }
}

// ============================================================================
// Partitioning Extension
// ============================================================================

/// The `partitionkey` extension used by partitioned transports.
#[derive(Debug, Clone, Default)]
pub struct PartitioningExtension;

impl PartitioningExtension {
    pub const PARTITION_KEY: &'static str = "partitionkey";
}

impl Extension for PartitioningExtension {
    fn name(&self) -> &str {
        Self::PARTITION_KEY
    }

    fn attribute_names(&self) -> Vec<&str> {
        vec![Self::PARTITION_KEY]
    }

    fn validate_and_normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>> {
        if !self.owns(name) {
            return Ok(None);
        }
        match value.as_str() {
            Some(key) if !key.is_empty() => Ok(Some(value.clone())),
            _ => Err(AttributeError::rejected(
                Self::PARTITION_KEY,
                name,
                "partition key must be a non-empty string",
            )),
        }
    }

    fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.owns(name).then_some(AttributeType::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CustomData {
        #[serde(rename = "othervalue")]
        other_value: i32,
    }

    #[test]
    fn test_string_extension() {
        let ext = StringExtension::new("ComExampleExtension1").with_value("preset");
        assert_eq!(ext.attribute_names(), vec!["comexampleextension1"]);
        assert_eq!(
            ext.validate_and_normalize("comexampleextension1", &AttributeValue::from("v"))
                .unwrap(),
            Some(AttributeValue::from("v"))
        );
        assert_eq!(
            ext.validate_and_normalize("other", &AttributeValue::from("v")).unwrap(),
            None
        );
        let err = ext
            .validate_and_normalize("comexampleextension1", &AttributeValue::Integer(1))
            .unwrap_err();
        assert!(err.to_string().contains("value is missing or not a string"));
        assert_eq!(ext.preset_values().len(), 1);
    }

    #[test]
    fn test_typed_extension_deserializes_literal() {
        let ext = TypedExtension::<CustomData>::new("comexampleextension2");
        let normalized = ext
            .validate_and_normalize(
                "comexampleextension2",
                &AttributeValue::Opaque(json!({"othervalue": 5})),
            )
            .unwrap()
            .unwrap();
        let custom = normalized.as_custom().unwrap();
        assert_eq!(custom.downcast_ref::<CustomData>(), Some(&CustomData { other_value: 5 }));

        let again = ext
            .validate_and_normalize("comexampleextension2", &normalized)
            .unwrap();
        assert_eq!(again, Some(normalized));

        assert!(
            ext.validate_and_normalize("comexampleextension2", &AttributeValue::from("x"))
                .is_err()
        );
    }

    #[test]
    fn test_sequence_normalizes_integers() {
        let ext = SequenceExtension::integer();
        assert_eq!(
            ext.validate_and_normalize("sequence", &AttributeValue::Integer(42)).unwrap(),
            Some(AttributeValue::from("42"))
        );
        assert!(
            ext.validate_and_normalize("sequencetype", &AttributeValue::Integer(1))
                .is_err()
        );
        assert_eq!(
            ext.preset_values(),
            vec![("sequencetype".to_string(), AttributeValue::from("Integer"))]
        );
    }

    #[test]
    fn test_partition_key_rejects_empty() {
        let ext = PartitioningExtension;
        assert!(
            ext.validate_and_normalize("partitionkey", &AttributeValue::from(""))
                .is_err()
        );
        assert!(
            ext.validate_and_normalize("partitionkey", &AttributeValue::from("p1"))
                .unwrap()
                .is_some()
        );
    }
}
