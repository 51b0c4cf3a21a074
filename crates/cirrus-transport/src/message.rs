//! The transport-neutral message type.

use cirrus_core::{
    BoxedExtension, CloudEvent, CloudEventResult, EventFormatter, PropertyMap, PropertyValue,
};

use crate::codec::MessageCodec;

/// A queue or topic message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportMessage {
    /// Message payload.
    pub body: Vec<u8>,
    /// Content type of the body.
    pub content_type: Option<String>,
    /// Broker-level message identifier.
    pub message_id: Option<String>,
    /// User properties, including prefixed CloudEvents attributes.
    pub properties: PropertyMap,
}

impl TransportMessage {
    /// Creates a message with the given body.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// CloudEvents conversions on a received message, using the default
/// property prefix.
pub trait MessageExt {
    /// Returns `true` if the message holds a single CloudEvent in either
    /// content mode.
    fn is_cloud_event(&self) -> bool;

    /// Converts the message into a validated CloudEvent.
    ///
    /// Structured messages are decoded with `formatter`; when it is `None`,
    /// `+json` content types use the built-in JSON format.
    fn to_cloud_event(
        &self,
        formatter: Option<&dyn EventFormatter>,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent>;
}

impl MessageExt for TransportMessage {
    fn is_cloud_event(&self) -> bool {
        MessageCodec::default().is_cloud_event(self)
    }

    fn to_cloud_event(
        &self,
        formatter: Option<&dyn EventFormatter>,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        MessageCodec::default().decode_with(self, formatter, extensions)
    }
}
