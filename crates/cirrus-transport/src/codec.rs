//! Conversion between [`CloudEvent`] and [`TransportMessage`].

use serde_json::Value;
use tracing::debug;

use cirrus_core::{
    AttributeRole, BinaryMapper, BoxedExtension, BoxedFormatter, CloudEvent, CloudEventError,
    CloudEventResult, ContentMode, ContentType, DecodeOptions, EventFormatter,
    is_cloud_events_content_type,
};
use cirrus_format_json::JsonFormatter;

use crate::message::TransportMessage;

/// Roles carried outside the property map: the id travels as the message
/// id and the data content type as the message content type.
const OUT_OF_BAND_ROLES: &[AttributeRole] = &[AttributeRole::Id, AttributeRole::DataContentType];

/// Maps events to and from transport messages.
///
/// The codec owns the property mapper and an optional structured formatter.
/// Without a formatter, structured mode uses JSON.
#[derive(Clone, Default)]
pub struct MessageCodec {
    mapper: BinaryMapper,
    formatter: Option<BoxedFormatter>,
    options: DecodeOptions,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `mapper` for property keys.
    pub fn with_mapper(mut self, mapper: BinaryMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Uses `formatter` for structured mode.
    pub fn with_formatter(mut self, formatter: BoxedFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Decode options for the default JSON formatter.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mapper(&self) -> &BinaryMapper {
        &self.mapper
    }

    /// Returns `true` if the message holds a single CloudEvent.
    pub fn is_cloud_event(&self, message: &TransportMessage) -> bool {
        self.mapper
            .is_cloud_event(message.content_type.as_deref(), &message.properties)
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Converts a received message into a validated CloudEvent.
    pub fn to_cloud_event(
        &self,
        message: &TransportMessage,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        self.decode_with(message, self.formatter.as_deref(), extensions)
    }

    pub(crate) fn decode_with(
        &self,
        message: &TransportMessage,
        formatter: Option<&dyn EventFormatter>,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let structured = message
            .content_type
            .as_deref()
            .filter(|ct| is_cloud_events_content_type(ct));

        let event = match structured {
            Some(content_type) => {
                self.decode_structured(message, content_type, formatter, extensions)?
            }
            None => self.decode_binary(message, extensions)?,
        };
        event.validate()?;
        Ok(event)
    }

    fn decode_structured(
        &self,
        message: &TransportMessage,
        content_type: &str,
        formatter: Option<&dyn EventFormatter>,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let suffix = ContentType::parse(content_type)
            .ok()
            .and_then(|ct| ct.suffix().map(str::to_ascii_lowercase));

        let mut event = match formatter {
            Some(formatter) => {
                if suffix.as_deref() != Some(formatter.media_type_suffix()) {
                    return Err(CloudEventError::UnsupportedContentType(
                        content_type.to_owned(),
                    ));
                }
                formatter.decode_structured(&message.body, extensions)?
            }
            None if suffix.as_deref() == Some("json") => {
                JsonFormatter::<Value>::with_options(self.options)
                    .decode_structured(&message.body, extensions)?
            }
            None => {
                return Err(CloudEventError::UnsupportedContentType(
                    content_type.to_owned(),
                ));
            }
        };

        if let Some(id) = &message.message_id {
            event.set_id(id.clone());
        }

        debug!(content_type, "Decoded structured message");
        Ok(event)
    }

    fn decode_binary(
        &self,
        message: &TransportMessage,
        extensions: &[BoxedExtension],
    ) -> CloudEventResult<CloudEvent> {
        let mut event = self.mapper.decode_unvalidated(
            &message.properties,
            &message.body,
            message.content_type.as_deref(),
            extensions,
        )?;
        if let Some(id) = &message.message_id {
            event.set_id(id.clone());
        }

        debug!(
            message_id = ?message.message_id,
            body_len = message.body.len(),
            "Decoded binary message"
        );
        Ok(event)
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Converts a valid event into a message in the given content mode.
    pub fn to_message(
        &self,
        event: &CloudEvent,
        mode: ContentMode,
    ) -> CloudEventResult<TransportMessage> {
        event.validate()?;

        let (body, content_type) = match mode {
            ContentMode::Structured => {
                let (body, content_type) = match &self.formatter {
                    Some(formatter) => formatter.encode_structured(event)?,
                    None => JsonFormatter::<Value>::with_options(self.options)
                        .encode_structured(event)?,
                };
                (body, Some(content_type.to_string()))
            }
            ContentMode::Binary => {
                let body = match event.data() {
                    Some(data) => data.to_body_bytes()?,
                    None => Vec::new(),
                };
                (body, event.data_content_type().map(ToString::to_string))
            }
        };

        let properties = self.mapper.encode_properties(event, OUT_OF_BAND_ROLES)?;

        debug!(
            ?mode,
            spec_version = %event.spec_version(),
            properties = properties.len(),
            body_len = body.len(),
            "Encoded CloudEvent message"
        );
        Ok(TransportMessage {
            body,
            content_type,
            message_id: event.id().map(str::to_owned),
            properties,
        })
    }
}

impl std::fmt::Debug for MessageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCodec")
            .field("mapper", &self.mapper)
            .field(
                "formatter",
                &self.formatter.as_ref().map(|f| f.media_type_suffix()),
            )
            .field("options", &self.options)
            .finish()
    }
}
