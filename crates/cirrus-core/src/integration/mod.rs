//! Integration layer - Extension hooks and wire mappings.
//!
//! This module contains the interfaces codecs and transports plug into:
//! - Extension protocol for vendor-defined attributes
//! - Structured formatter contract
//! - Binary-mode property mapping

pub mod binary;
pub mod extension;
pub mod formatter;

pub use binary::{BinaryMapper, BinaryMessage, DEFAULT_PROPERTY_PREFIX, PropertyMap, PropertyValue};

pub use extension::{
    BoxedExtension, Extension, ExtensionSet, PartitioningExtension, SequenceExtension,
    StringExtension, TypedExtension,
};

pub use formatter::{
    BATCH_MEDIA_TYPE, BoxedFormatter, ContentMode, DecodeOptions, EventFormatter,
    STRUCTURED_MEDIA_TYPE, is_cloud_events_content_type,
};
