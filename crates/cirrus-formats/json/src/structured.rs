//! Whole-document encoding and decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use cirrus_core::{
    AttributeRole, AttributeValue, BoxedExtension, CloudEvent, CloudEventError,
    CloudEventResult, Data, SpecVersion,
};

use crate::formatter::{JsonFormatter, JsonPayload};

/// Member carrying base64-encoded binary data in 1.0 documents. Older
/// versions keep it as an ordinary attribute.
pub const DATA_BASE64: &str = "data_base64";

impl<T: JsonPayload> JsonFormatter<T> {
    /// Decodes a structured document from bytes.
    pub fn decode(&self, body: &[u8], extensions: &[BoxedExtension]) -> CloudEventResult<CloudEvent> {
        let document: Value = serde_json::from_slice(body)?;
        self.decode_value(document, extensions)
    }

    /// Decodes an already parsed structured document.
    pub fn decode_value(
        &self,
        document: Value,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let Value::Object(members) = document else {
            return Err(CloudEventError::malformed(
                "structured CloudEvent must be a JSON object",
            ));
        };

        let resolution = SpecVersion::resolve_structured(&members);
        let version = self
            .options
            .version_policy
            .apply(resolution, self.options.default_spec_version)?;
        let mut event = CloudEvent::with_extensions(version, extensions)?;
        let data_name = version.attribute_name(AttributeRole::Data);

        for (name, value) in members {
            if SpecVersion::is_spec_version_name(&name) {
                continue;
            }

            if name.eq_ignore_ascii_case(data_name) {
                if !value.is_null() {
                    set_data_once(&mut event, decode_data::<T>(value)?)?;
                }
                continue;
            }

            if version == SpecVersion::V1_0 && name.eq_ignore_ascii_case(DATA_BASE64) {
                set_data_once(&mut event, decode_base64(value)?)?;
                continue;
            }

            if value.is_null() {
                event.remove(&name);
                continue;
            }

            trace!(attribute = %name, "Decoding structured member");
            let value = match event.attribute_type(&name.to_ascii_lowercase()) {
                Some(_) => AttributeValue::from_json(&value),
                None => AttributeValue::infer_from_json(&value),
            };
            event.set_decoded(&name, value)?;
        }

        debug!(
            spec_version = %version,
            attributes = event.attributes().count(),
            has_data = event.data().is_some(),
            "Decoded structured CloudEvent"
        );
        Ok(event)
    }

    /// Encodes an event into a structured document.
    pub fn encode(&self, event: &CloudEvent) -> CloudEventResult<Vec<u8>> {
        let document = Value::Object(self.encode_value(event)?);
        Ok(serde_json::to_vec(&document)?)
    }

    /// Encodes an event into the members of a structured document.
    pub fn encode_value(&self, event: &CloudEvent) -> CloudEventResult<Map<String, Value>> {
        let version = event.spec_version();
        let mut members = Map::new();
        members.insert(
            version.attribute_name(AttributeRole::SpecVersion).to_string(),
            Value::String(version.version_id().to_string()),
        );

        for (name, value) in event.attributes() {
            let member = match version.role_of(name) {
                Some(role) => version.attribute_name(role).to_string(),
                None => name.to_string(),
            };
            members.insert(member, value.to_json()?);
        }

        match event.data() {
            Some(Data::Binary(bytes)) if version == SpecVersion::V1_0 => {
                members.insert(DATA_BASE64.to_string(), Value::String(STANDARD.encode(bytes)));
            }
            Some(data) => {
                members.insert(
                    version.attribute_name(AttributeRole::Data).to_string(),
                    data.to_json()?,
                );
            }
            None => {}
        }

        debug!(
            spec_version = %version,
            members = members.len(),
            "Encoded structured CloudEvent"
        );
        Ok(members)
    }
}

fn decode_data<T: JsonPayload>(value: Value) -> CloudEventResult<Data> {
    let typed: T =
        serde_json::from_value(value).map_err(|source| CloudEventError::DataDeserialization {
            type_name: std::any::type_name::<T>(),
            source,
        })?;
    Ok(Data::from_typed(typed))
}

fn decode_base64(value: Value) -> CloudEventResult<Data> {
    let Value::String(encoded) = value else {
        return Err(CloudEventError::malformed(format!(
            "'{DATA_BASE64}' must be a string"
        )));
    };
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| CloudEventError::malformed(format!("invalid '{DATA_BASE64}': {e}")))?;
    Ok(Data::Binary(bytes))
}

fn set_data_once(event: &mut CloudEvent, data: Data) -> CloudEventResult<()> {
    if event.data().is_some() {
        return Err(CloudEventError::malformed(format!(
            "'data' and '{DATA_BASE64}' are mutually exclusive"
        )));
    }
    event.set_data(data);
    Ok(())
}
