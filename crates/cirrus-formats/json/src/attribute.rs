//! Per-attribute JSON encoding for binary-mode transports that carry each
//! attribute as a separately encoded value.

use serde_json::Value;

use cirrus_core::{
    AttributeError, AttributeRole, AttributeValue, BoxedExtension, CloudEventError,
    CloudEventResult, ExtensionSet, SpecVersion,
};

use crate::formatter::{JsonFormatter, JsonPayload};

impl<T: JsonPayload> JsonFormatter<T> {
    /// Decodes one attribute from its JSON text.
    ///
    /// Role attributes get their role type. The data role is deserialized
    /// into `T` and returned as a custom value. Other names use the type
    /// declared by the first extension that constrains them, falling back
    /// to the JSON token kind with RFC 3339 strings read as timestamps.
    pub fn decode_attribute_value(
        &self,
        version: SpecVersion,
        name: &str,
        value: &[u8],
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<AttributeValue> {
        let json: Value = serde_json::from_slice(value)?;

        let declared = match version.role_of(name) {
            Some(AttributeRole::Data) => {
                let typed: T = serde_json::from_value(json).map_err(|source| {
                    CloudEventError::DataDeserialization {
                        type_name: std::any::type_name::<T>(),
                        source,
                    }
                })?;
                return Ok(AttributeValue::custom(typed));
            }
            Some(role) => Some(role.attribute_type()),
            None => ExtensionSet::from_slice(extensions).attribute_type(name),
        };

        let decoded = match declared {
            Some(ty) => AttributeValue::from_json_as(&json, ty)
                .map_err(|e| AttributeError::for_attribute(name, e))?,
            None => AttributeValue::infer_from_json(&json),
        };
        Ok(decoded)
    }

    /// Encodes one attribute as JSON text, converted to the extension's
    /// declared type when one exists.
    pub fn encode_attribute_value(
        &self,
        version: SpecVersion,
        name: &str,
        value: &AttributeValue,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<Vec<u8>> {
        let declared = match version.role_of(name) {
            Some(_) => None,
            None => ExtensionSet::from_slice(extensions).attribute_type(name),
        };
        let json = match declared {
            Some(ty) => value
                .clone()
                .coerce_to(ty)
                .map_err(|e| AttributeError::for_attribute(name, e))?
                .to_json()?,
            None => value.to_json()?,
        };
        Ok(serde_json::to_vec(&json)?)
    }
}
