//! # Cirrus
//!
//! CloudEvents for Rust: a version-aware attribute model, the structured
//! JSON format, and binary-mode mapping onto transport messages.
//!
//! ## Overview
//!
//! One in-memory event model serves four wire versions (0.1, 0.2, 0.3 and
//! 1.0). Attribute names, required attributes and value types come from a
//! per-version registry, so the same code reads and writes every version.
//! Extensions constrain and type their own attributes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────────┐
//! │  CloudEvent  │────▶│  JsonFormatter   │────▶│  structured body   │
//! │  + Extension │     │  (EventFormatter)│     └────────────────────┘
//! │    set       │     └──────────────────┘
//! │              │     ┌──────────────────┐     ┌────────────────────┐
//! │              │────▶│  BinaryMapper    │────▶│  properties + body │
//! └──────────────┘     └──────────────────┘     └────────────────────┘
//!                               ▲
//!                      ┌──────────────────┐
//!                      │  MessageCodec    │  (transport adapter)
//!                      └──────────────────┘
//! ```
//!
//! - **core**: attribute model, version registry, extensions, binary mapping
//! - **json**: structured-mode JSON format
//! - **transport**: conversion to and from transport messages
//! - **runtime**: configuration and logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cirrus::prelude::*;
//!
//! let event = CloudEvent::builder(SpecVersion::V1_0)
//!     .event_type("com.example.order.created")
//!     .source("/orders")
//!     .data(serde_json::json!({"id": 42}))
//!     .build()?;
//!
//! let (body, content_type) = JsonFormatter::<serde_json::Value>::new().encode_structured(&event)?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use cirrus_core as core;
pub use cirrus_format_json as json;
pub use cirrus_runtime as runtime;
pub use cirrus_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use cirrus::prelude::*;
/// ```
pub mod prelude {
    // Event model
    pub use cirrus_core::{
        AttributeRole, AttributeType, AttributeValue, CloudEvent, CloudEventBuilder,
        CloudEventError, CloudEventResult, ContentType, Data, SpecVersion, Uri, VersionPolicy,
    };

    // Extensions
    pub use cirrus_core::{
        BoxedExtension, Extension, PartitioningExtension, SequenceExtension, StringExtension,
        TypedExtension,
    };

    // Formats and mapping
    pub use cirrus_core::{BinaryMapper, ContentMode, DecodeOptions, EventFormatter};
    pub use cirrus_format_json::JsonFormatter;
    pub use cirrus_transport::{MessageCodec, MessageExt, TransportMessage};

    // Setup
    pub use cirrus_runtime::{CirrusConfig, Codecs, ConfigLoader};
}
