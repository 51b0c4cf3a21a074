//! The JSON formatter type and its [`EventFormatter`] implementation.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use cirrus_core::{
    AttributeValue, BoxedExtension, CloudEvent, CloudEventResult, ContentType, DecodeOptions,
    EventFormatter, ExtensionValue, SpecVersion, VersionPolicy,
};

/// Content type of structured JSON CloudEvents.
pub const JSON_MEDIA_TYPE: &str = "application/cloudevents+json";

/// Types usable as the payload of a [`JsonFormatter`].
pub trait JsonPayload: DeserializeOwned + ExtensionValue {}

impl<T: DeserializeOwned + ExtensionValue> JsonPayload for T {}

/// Structured-mode JSON formatter bound to the payload type `T`.
pub struct JsonFormatter<T = Value> {
    pub(crate) options: DecodeOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFormatter<T> {
    /// Creates a formatter with the default options: version 1.0 and the
    /// lenient version policy.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            _marker: PhantomData,
        }
    }

    /// Sets the version assumed for documents without a version member.
    pub fn default_spec_version(mut self, version: SpecVersion) -> Self {
        self.options.default_spec_version = version;
        self
    }

    /// Sets how a missing version member is handled.
    pub fn version_policy(mut self, policy: VersionPolicy) -> Self {
        self.options.version_policy = policy;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// The content type written for structured JSON events.
    pub fn structured_content_type() -> ContentType {
        ContentType::from_static(JSON_MEDIA_TYPE).with_parameter("charset", "utf-8")
    }
}

impl<T> Default for JsonFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonFormatter<T> {
    fn clone(&self) -> Self {
        Self::with_options(self.options)
    }
}

impl<T> fmt::Debug for JsonFormatter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFormatter")
            .field("payload", &std::any::type_name::<T>())
            .field("options", &self.options)
            .finish()
    }
}

impl<T: JsonPayload> EventFormatter for JsonFormatter<T> {
    fn media_type_suffix(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> ContentType {
        Self::structured_content_type()
    }

    fn decode_structured(
        &self,
        body: &[u8],
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        self.decode(body, extensions)
    }

    fn encode_structured(&self, event: &CloudEvent) -> CloudEventResult<(Vec<u8>, ContentType)> {
        Ok((self.encode(event)?, Self::structured_content_type()))
    }

    fn decode_attribute(
        &self,
        version: SpecVersion,
        name: &str,
        value: &[u8],
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<AttributeValue> {
        self.decode_attribute_value(version, name, value, extensions)
    }

    fn encode_attribute(
        &self,
        version: SpecVersion,
        name: &str,
        value: &AttributeValue,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<Vec<u8>> {
        self.encode_attribute_value(version, name, value, extensions)
    }
}
