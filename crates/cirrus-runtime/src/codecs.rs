//! Codec construction from configuration.

use std::sync::Arc;

use cirrus_core::{BinaryMapper, BoxedFormatter, ContentMode, DecodeOptions};
use cirrus_format_json::{JsonFormatter, JsonPayload};
use cirrus_transport::MessageCodec;
use tracing::debug;

use crate::config::CodecConfig;

/// Formatters and mappers configured from one [`CodecConfig`].
#[derive(Debug, Clone)]
pub struct Codecs {
    options: DecodeOptions,
    mapper: BinaryMapper,
    content_mode: ContentMode,
}

impl Default for Codecs {
    fn default() -> Self {
        Self::from_config(&CodecConfig::default())
    }
}

impl Codecs {
    pub fn from_config(config: &CodecConfig) -> Self {
        debug!(
            default_spec_version = %config.default_spec_version,
            version_policy = ?config.version_policy,
            property_prefix = %config.property_prefix,
            "Building codecs from configuration"
        );
        Self {
            options: DecodeOptions {
                default_spec_version: config.default_spec_version,
                version_policy: config.version_policy,
            },
            mapper: BinaryMapper::new(config.property_prefix.clone()),
            content_mode: config.content_mode,
        }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// JSON formatter for payload type `T`.
    pub fn json<T: JsonPayload>(&self) -> JsonFormatter<T> {
        JsonFormatter::with_options(self.options)
    }

    pub fn mapper(&self) -> &BinaryMapper {
        &self.mapper
    }

    /// Mode used when sending.
    pub fn content_mode(&self) -> ContentMode {
        self.content_mode
    }

    /// Message codec using the configured prefix and a JSON formatter for
    /// payload type `T`.
    pub fn message_codec<T: JsonPayload>(&self) -> MessageCodec {
        let formatter: BoxedFormatter = Arc::new(self.json::<T>());
        MessageCodec::new()
            .with_mapper(self.mapper.clone())
            .with_options(self.options)
            .with_formatter(formatter)
    }
}
