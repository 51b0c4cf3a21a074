//! Foundation layer - Attribute model and version registry.
//!
//! This module contains the building blocks every codec shares:
//! - Spec versions and their per-version attribute names
//! - Attribute values, URIs and content types
//! - The CloudEvent itself and its payload

pub mod content_type;
pub mod data;
pub mod event;
pub mod uri;
pub mod value;
pub mod version;

pub use content_type::ContentType;
pub use data::Data;
pub use event::{CloudEvent, CloudEventBuilder, normalize_name};
pub use uri::Uri;
pub use value::{
    AttributeType, AttributeValue, CustomValue, ExtensionValue, format_timestamp,
    parse_timestamp,
};
pub use version::{AttributeRole, SpecVersion, VersionPolicy, VersionResolution};
