//! Structured-mode formatter contract.
//!
//! A formatter turns a whole [`CloudEvent`] into one self-describing
//! document and back. Format crates (such as the JSON one) implement
//! [`EventFormatter`]; transports pick an implementation by the media type
//! suffix of the message content type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CloudEventResult;
use crate::foundation::content_type::ContentType;
use crate::foundation::event::CloudEvent;
use crate::foundation::value::AttributeValue;
use crate::foundation::version::{SpecVersion, VersionPolicy};
use crate::integration::extension::BoxedExtension;

/// Media type of a single structured CloudEvent, without format suffix.
pub const STRUCTURED_MEDIA_TYPE: &str = "application/cloudevents";

/// Media type of a batch of CloudEvents, without format suffix.
pub const BATCH_MEDIA_TYPE: &str = "application/cloudevents-batch";

/// How an event travels on a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// The whole event is one document in the message body.
    #[default]
    Structured,
    /// Attributes travel as transport properties and the body is the payload.
    Binary,
}

/// Returns `true` if `content_type` names a single structured CloudEvent,
/// with or without a format suffix.
pub fn is_cloud_events_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if media_type.starts_with(BATCH_MEDIA_TYPE) {
        return false;
    }
    media_type == STRUCTURED_MEDIA_TYPE
        || media_type
            .strip_prefix(STRUCTURED_MEDIA_TYPE)
            .is_some_and(|rest| rest.starts_with('+'))
}

/// Options shared by structured decoders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Version assumed when a document has no version attribute.
    pub default_spec_version: SpecVersion,
    /// Whether a missing version attribute falls back or fails.
    pub version_policy: VersionPolicy,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            version_policy: VersionPolicy::Strict,
            ..Default::default()
        }
    }

    pub fn with_default_version(mut self, version: SpecVersion) -> Self {
        self.default_spec_version = version;
        self
    }
}

/// A structured-mode event format.
pub trait EventFormatter: Send + Sync {
    /// The media type suffix this format handles, e.g. `json`.
    fn media_type_suffix(&self) -> &'static str;

    /// The full structured content type produced by this format.
    fn content_type(&self) -> ContentType;

    /// Decodes one structured document.
    ///
    /// No presence validation is performed; call
    /// [`CloudEvent::validate`] on the result when needed.
    fn decode_structured(
        &self,
        body: &[u8],
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent>;

    /// Encodes an event into one structured document.
    fn encode_structured(&self, event: &CloudEvent) -> CloudEventResult<(Vec<u8>, ContentType)>;

    /// Decodes a single attribute value from its encoded bytes.
    fn decode_attribute(
        &self,
        version: SpecVersion,
        name: &str,
        value: &[u8],
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<AttributeValue>;

    /// Encodes a single attribute value.
    fn encode_attribute(
        &self,
        version: SpecVersion,
        name: &str,
        value: &AttributeValue,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<Vec<u8>>;
}

/// A shared, type-erased formatter.
pub type BoxedFormatter = Arc<dyn EventFormatter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_content_type_detection() {
        assert!(is_cloud_events_content_type("application/cloudevents+json"));
        assert!(is_cloud_events_content_type(
            "Application/CloudEvents+JSON; charset=utf-8"
        ));
        assert!(is_cloud_events_content_type("application/cloudevents"));
        assert!(!is_cloud_events_content_type("application/cloudevents-batch+json"));
        assert!(!is_cloud_events_content_type("application/cloudeventsx"));
        assert!(!is_cloud_events_content_type("application/json"));
    }
}
