//! # Cirrus Core
//!
//! The attribute model and wire mappings of the Cirrus CloudEvents toolkit.
//!
//! This crate provides the pieces every codec and transport shares: the
//! versioned attribute model, the extension protocol and the binary-mode
//! property mapping.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Core abstractions and type system:
//! - **Spec Versions**: Supported versions and their attribute names ([`SpecVersion`], [`AttributeRole`])
//! - **Attribute Values**: A closed union of typed values ([`AttributeValue`], [`Uri`], [`ContentType`])
//! - **Events**: The CloudEvent itself ([`CloudEvent`], [`CloudEventBuilder`], [`Data`])
//!
//! ### Integration Layer
//!
//! Interfaces to formats and transports:
//! - **Extension Protocol**: Vendor-defined attributes ([`Extension`], [`ExtensionSet`])
//! - **Structured Formats**: The contract format crates implement ([`EventFormatter`])
//! - **Binary Mode**: Attribute to property mapping ([`BinaryMapper`])
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │  CloudEvent │────▶│  EventFormatter  │────▶│  body bytes   │
//! │ (+ exts)    │     │  (structured)    │     └───────────────┘
//! │             │     └──────────────────┘     ┌───────────────┐
//! │             │────▶│  BinaryMapper    │────▶│ props + body  │
//! └─────────────┘     └──────────────────┘     └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cirrus_core::{BinaryMapper, CloudEvent, SpecVersion};
//!
//! let event = CloudEvent::builder(SpecVersion::V1_0)
//!     .event_type("com.example.test")
//!     .source("https://example.com/src")
//!     .data_content_type("text/xml")
//!     .data("<x/>")
//!     .build()?;
//!
//! let message = BinaryMapper::default().encode(&event)?;
//! assert_eq!(message.body, b"<x/>");
//! ```

pub mod error;

// Architectural layers
pub mod foundation;
pub mod integration;

pub use error::{AttributeError, AttributeResult, CloudEventError, CloudEventResult};

// Re-export foundation types
pub use foundation::{
    AttributeRole, AttributeType, AttributeValue, CloudEvent, CloudEventBuilder, ContentType,
    CustomValue, Data, ExtensionValue, SpecVersion, Uri, VersionPolicy, VersionResolution,
};

// Re-export integration types
pub use integration::{
    BATCH_MEDIA_TYPE, BinaryMapper, BinaryMessage, BoxedExtension, BoxedFormatter, ContentMode,
    DEFAULT_PROPERTY_PREFIX, DecodeOptions, EventFormatter, Extension, ExtensionSet,
    PartitioningExtension, PropertyMap, PropertyValue, STRUCTURED_MEDIA_TYPE, SequenceExtension,
    StringExtension, TypedExtension, is_cloud_events_content_type,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::*;
    pub use super::foundation::*;
    pub use super::integration::{
        BoxedExtension, BoxedFormatter, ContentMode, EventFormatter, Extension,
    };
}
