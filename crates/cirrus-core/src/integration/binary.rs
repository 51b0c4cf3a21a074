//! Binary-mode mapping.
//!
//! In binary mode the payload travels as the transport message body and
//! every attribute travels as a transport property under a namespace
//! prefix (`cloudEvents:` by default):
//!
//! ```text
//! cloudEvents:specversion = "1.0"
//! cloudEvents:type        = "com.example.test"
//! cloudEvents:source      = "https://example.com/src"
//! cloudEvents:time        = <native UTC timestamp>
//! content-type            = <datacontenttype>
//! body                    = <data bytes>
//! ```
//!
//! Properties without the prefix belong to the transport and are never
//! read or written by [`BinaryMapper`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{CloudEventError, CloudEventResult};
use crate::foundation::data::Data;
use crate::foundation::event::CloudEvent;
use crate::foundation::value::AttributeValue;
use crate::foundation::version::{AttributeRole, SpecVersion};
use crate::integration::extension::BoxedExtension;
use crate::integration::formatter::is_cloud_events_content_type;

/// Prefix used for CloudEvents properties unless configured otherwise.
pub const DEFAULT_PROPERTY_PREFIX: &str = "cloudEvents:";

// ============================================================================
// Property Values
// ============================================================================

/// A transport-native property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Integer(i32),
    Boolean(bool),
    /// A native instant, for transports with a date type.
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
    /// A structured value with no native representation.
    Json(Value),
}

impl PropertyValue {
    /// Converts an attribute value to its property form.
    ///
    /// URIs and content types become strings, timestamps stay native
    /// instants, and opaque or custom values become JSON.
    pub fn from_attribute(value: &AttributeValue) -> Result<Self, serde_json::Error> {
        Ok(match value {
            AttributeValue::String(s) => Self::String(s.clone()),
            AttributeValue::Uri(u) => Self::String(u.to_string()),
            AttributeValue::Timestamp(t) => Self::Timestamp(*t),
            AttributeValue::Integer(i) => Self::Integer(*i),
            AttributeValue::Boolean(b) => Self::Boolean(*b),
            AttributeValue::Binary(b) => Self::Binary(b.clone()),
            AttributeValue::ContentType(c) => Self::String(c.to_string()),
            AttributeValue::Opaque(v) => Self::Json(v.clone()),
            AttributeValue::Custom(c) => Self::Json(c.to_json()?),
        })
    }

    /// Converts back to an attribute value. Strings stay strings here; the
    /// event types them when they are assigned.
    pub fn to_attribute(&self) -> AttributeValue {
        match self {
            Self::String(s) => AttributeValue::String(s.clone()),
            Self::Integer(i) => AttributeValue::Integer(*i),
            Self::Boolean(b) => AttributeValue::Boolean(*b),
            Self::Timestamp(t) => AttributeValue::Timestamp(*t),
            Self::Binary(b) => AttributeValue::Binary(b.clone()),
            Self::Json(v) => AttributeValue::Opaque(v.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Transport properties keyed by name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// The binary-mode form of an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryMessage {
    pub properties: PropertyMap,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

// ============================================================================
// Binary Mapper
// ============================================================================

/// Maps events to and from prefixed transport properties.
#[derive(Debug, Clone)]
pub struct BinaryMapper {
    prefix: String,
}

impl Default for BinaryMapper {
    fn default() -> Self {
        Self::new(DEFAULT_PROPERTY_PREFIX)
    }
}

impl BinaryMapper {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key under which `version` writes its identifier.
    pub fn spec_version_key(&self, version: SpecVersion) -> String {
        self.property_key(version.attribute_name(AttributeRole::SpecVersion))
    }

    /// Prefixed key for an attribute name.
    pub fn property_key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        let n = self.prefix.len();
        let head = key.get(..n)?;
        head.eq_ignore_ascii_case(&self.prefix).then(|| &key[n..])
    }

    /// Returns `true` if a message with this content type and properties
    /// carries a CloudEvent in either mode.
    pub fn is_cloud_event(&self, content_type: Option<&str>, properties: &PropertyMap) -> bool {
        content_type.is_some_and(is_cloud_events_content_type)
            || self.has_version_property(properties)
    }

    /// Returns `true` if a version property is present under any spelling
    /// used by a supported version.
    pub fn has_version_property(&self, properties: &PropertyMap) -> bool {
        properties.keys().any(|key| {
            self.strip_prefix(key)
                .is_some_and(SpecVersion::is_spec_version_name)
        })
    }

    /// Reads the version from the reserved property.
    ///
    /// Fails with [`CloudEventError::NotACloudEvent`] when no version
    /// property is present.
    pub fn read_spec_version(&self, properties: &PropertyMap) -> CloudEventResult<SpecVersion> {
        let legacy = SpecVersion::V0_1.attribute_name(AttributeRole::SpecVersion);
        let mut found = None;
        for (key, value) in properties {
            let Some(name) = self.strip_prefix(key) else {
                continue;
            };
            if name.eq_ignore_ascii_case(legacy) {
                return Ok(SpecVersion::V0_1);
            }
            if SpecVersion::is_spec_version_name(name) {
                found = Some(value);
            }
        }

        let value = found.ok_or(CloudEventError::NotACloudEvent)?;
        match value.as_str() {
            Some(id) => id.parse(),
            None => Err(CloudEventError::UnknownSpecVersion(format!("{value:?}"))),
        }
    }

    // ------------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------------

    /// Encodes an event into properties, body and content type.
    pub fn encode(&self, event: &CloudEvent) -> CloudEventResult<BinaryMessage> {
        let properties = self.encode_properties(event, &[AttributeRole::DataContentType])?;
        let body = match event.data() {
            Some(data) => data.to_body_bytes()?,
            None => Vec::new(),
        };
        let content_type = event.data_content_type().map(ToString::to_string);

        debug!(
            spec_version = %event.spec_version(),
            properties = properties.len(),
            body_len = body.len(),
            "Encoded binary CloudEvent"
        );
        Ok(BinaryMessage {
            properties,
            body,
            content_type,
        })
    }

    /// Encodes the event's attributes into prefixed properties, skipping
    /// the roles in `exclude`. The version property is always written.
    pub fn encode_properties(
        &self,
        event: &CloudEvent,
        exclude: &[AttributeRole],
    ) -> CloudEventResult<PropertyMap> {
        let version = event.spec_version();
        let mut properties = PropertyMap::new();
        properties.insert(
            self.spec_version_key(version),
            PropertyValue::from(version.version_id()),
        );

        for (name, value) in event.attributes() {
            let key = match version.role_of(name) {
                Some(role) if exclude.contains(&role) => continue,
                Some(role) => self.property_key(version.attribute_name(role)),
                None => self.property_key(name),
            };
            properties.insert(key, PropertyValue::from_attribute(value)?);
        }
        Ok(properties)
    }

    // ------------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------------

    /// Decodes and validates a binary-mode message.
    pub fn decode(
        &self,
        message: &BinaryMessage,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let event = self.decode_unvalidated(
            &message.properties,
            &message.body,
            message.content_type.as_deref(),
            extensions,
        )?;
        event.validate()?;
        Ok(event)
    }

    /// Decodes a binary-mode message without checking required attributes.
    ///
    /// The body always becomes [`Data::Binary`]. The content type, when
    /// given, is assigned last and overrides any `datacontenttype` property.
    /// A `data` property is ignored. Without an id property a UUID v4 id is
    /// generated; transports replace it with their message id.
    pub fn decode_unvalidated(
        &self,
        properties: &PropertyMap,
        body: &[u8],
        content_type: Option<&str>,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let version = self.read_spec_version(properties)?;
        let mut event = CloudEvent::with_extensions(version, extensions)?;
        let data_name = version.attribute_name(AttributeRole::Data);

        for (key, value) in properties {
            let Some(name) = self.strip_prefix(key) else {
                continue;
            };
            if SpecVersion::is_spec_version_name(name) || name.eq_ignore_ascii_case(data_name) {
                continue;
            }
            trace!(attribute = name, "Decoding binary property");
            event.set_decoded(name, value.to_attribute())?;
        }

        if event.id().is_none() {
            event.set_id(uuid::Uuid::new_v4().to_string());
        }
        event.set_data(Data::Binary(body.to_vec()));
        if let Some(content_type) = content_type {
            let name = version.attribute_name(AttributeRole::DataContentType);
            event.set_from_string(name, content_type)?;
        }

        debug!(
            spec_version = %version,
            attributes = event.attributes().count(),
            "Decoded binary CloudEvent"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::extension::StringExtension;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
            .collect()
    }

    fn sample() -> CloudEvent {
        let mut event = CloudEvent::builder(SpecVersion::V1_0)
            .id("A1")
            .event_type("com.example.test")
            .source("https://example.com/src")
            .time(Utc.with_ymd_and_hms(2018, 4, 5, 17, 31, 0).unwrap())
            .data_content_type("text/xml")
            .data("<x/>")
            .build()
            .unwrap();
        event.set("comexampleextension1", "value").unwrap();
        event
    }

    #[test]
    fn test_decode_minimal_message() {
        let mapper = BinaryMapper::new("ns:");
        let message = BinaryMessage {
            properties: props(&[
                ("ns:specversion", "1.0"),
                ("ns:type", "t"),
                ("ns:source", "https://x/"),
                ("ns:id", "1"),
            ]),
            body: Vec::new(),
            content_type: Some("application/json".into()),
        };

        let event = mapper.decode(&message, &[]).unwrap();
        assert_eq!(event.data(), Some(&Data::Binary(Vec::new())));
        assert_eq!(
            event.data_content_type().map(|c| c.to_string()),
            Some("application/json".to_string())
        );
        assert_eq!(event.source().map(|s| s.as_str()), Some("https://x/"));
    }

    #[test]
    fn test_decode_without_id_generates_one() {
        let mapper = BinaryMapper::new("ns:");
        let message = BinaryMessage {
            properties: props(&[
                ("ns:specversion", "1.0"),
                ("ns:type", "t"),
                ("ns:source", "https://x/"),
            ]),
            body: Vec::new(),
            content_type: Some("application/json".into()),
        };

        let event = mapper.decode(&message, &[]).unwrap();
        let id = event.id().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(event.event_type(), Some("t"));
        assert_eq!(event.data(), Some(&Data::Binary(Vec::new())));
    }

    #[test]
    fn test_missing_required_attributes_are_aggregated() {
        let mapper = BinaryMapper::new("ns:");
        let message = BinaryMessage {
            properties: props(&[("ns:specversion", "1.0")]),
            ..Default::default()
        };
        match mapper.decode(&message, &[]) {
            Err(CloudEventError::Validation { problems }) => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].contains("'type'"));
                assert!(problems[1].contains("'source'"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_data_property_is_ignored() {
        let mapper = BinaryMapper::default();
        let message = BinaryMessage {
            properties: props(&[
                ("cloudEvents:specversion", "1.0"),
                ("cloudEvents:id", "1"),
                ("cloudEvents:type", "t"),
                ("cloudEvents:source", "/s"),
                ("cloudEvents:data", "ignored"),
            ]),
            body: b"body".to_vec(),
            content_type: None,
        };

        let event = mapper.decode(&message, &[]).unwrap();
        assert_eq!(event.data(), Some(&Data::Binary(b"body".to_vec())));
        assert!(event.get("data").is_none());
    }

    #[test]
    fn test_property_names_with_separators_are_kept() {
        let mapper = BinaryMapper::default();
        let message = BinaryMessage {
            properties: props(&[
                ("cloudEvents:specversion", "1.0"),
                ("cloudEvents:id", "1"),
                ("cloudEvents:type", "t"),
                ("cloudEvents:source", "/s"),
                ("cloudEvents:trace_id", "abc"),
                ("cloudEvents:Retry-Count", "2"),
            ]),
            ..Default::default()
        };

        let event = mapper.decode(&message, &[]).unwrap();
        assert_eq!(event.get("trace_id").and_then(|v| v.as_str()), Some("abc"));
        assert_eq!(event.get("retry-count").and_then(|v| v.as_str()), Some("2"));
    }

    #[test]
    fn test_encode_uses_native_timestamp() {
        let mapper = BinaryMapper::default();
        let message = mapper.encode(&sample()).unwrap();

        assert_eq!(
            message.properties.get("cloudEvents:specversion"),
            Some(&PropertyValue::from("1.0"))
        );
        assert!(matches!(
            message.properties.get("cloudEvents:time"),
            Some(PropertyValue::Timestamp(_))
        ));
        assert!(!message.properties.contains_key("cloudEvents:datacontenttype"));
        assert_eq!(message.content_type.as_deref(), Some("text/xml"));
        assert_eq!(message.body, b"<x/>");
    }

    #[test]
    fn test_round_trip_keeps_attributes() {
        let mapper = BinaryMapper::default();
        let original = sample();
        let message = mapper.encode(&original).unwrap();
        let decoded = mapper
            .decode(&message, &[Arc::new(StringExtension::new("comexampleextension1"))])
            .unwrap();

        assert_eq!(decoded.attributes().collect::<Vec<_>>(), original.attributes().collect::<Vec<_>>());
        assert_eq!(decoded.data(), Some(&Data::Binary(b"<x/>".to_vec())));
    }

    #[test]
    fn test_unprefixed_properties_are_ignored() {
        let mapper = BinaryMapper::default();
        let mut message = mapper.encode(&sample()).unwrap();
        message
            .properties
            .insert("type".into(), PropertyValue::from("transport-owned"));
        message
            .properties
            .insert("Diagnostic-Id".into(), PropertyValue::Integer(7));

        let decoded = mapper.decode(&message, &[]).unwrap();
        assert_eq!(decoded.event_type(), Some("com.example.test"));
        assert!(decoded.get("diagnosticid").is_none());
    }

    #[test]
    fn test_version_detection() {
        let mapper = BinaryMapper::default();
        assert!(mapper.has_version_property(&props(&[("CLOUDEVENTS:SpecVersion", "1.0")])));
        assert!(mapper.has_version_property(&props(&[("cloudEvents:cloudEventsVersion", "0.1")])));
        assert!(!mapper.has_version_property(&props(&[("specversion", "1.0")])));
        assert!(mapper.is_cloud_event(Some("application/cloudevents+json"), &PropertyMap::new()));

        assert!(matches!(
            mapper.read_spec_version(&PropertyMap::new()),
            Err(CloudEventError::NotACloudEvent)
        ));
        assert_eq!(
            mapper
                .read_spec_version(&props(&[("cloudEvents:cloudEventsVersion", "0.1")]))
                .unwrap(),
            SpecVersion::V0_1
        );
        assert!(matches!(
            mapper.read_spec_version(&props(&[("cloudEvents:specversion", "5.0")])),
            Err(CloudEventError::UnknownSpecVersion(_))
        ));
    }

    #[test]
    fn test_legacy_version_uses_legacy_names() {
        let mapper = BinaryMapper::default();
        let event = CloudEvent::builder(SpecVersion::V0_1)
            .id("1")
            .event_type("t")
            .source("/s")
            .build()
            .unwrap();
        let message = mapper.encode(&event).unwrap();
        assert!(message.properties.contains_key("cloudEvents:eventID"));
        assert_eq!(
            message.properties.get("cloudEvents:cloudEventsVersion"),
            Some(&PropertyValue::from("0.1"))
        );
        assert_eq!(mapper.decode(&message, &[]).unwrap().spec_version(), SpecVersion::V0_1);
    }
}
