//! Extension protocol.
//!
//! An [`Extension`] owns one or a few attribute names and decides what
//! values are acceptable for them. Codecs receive an ordered list of
//! extensions per call and attach them to every event they build; from
//! then on each assignment to an owned name goes through the extension.
//!
//! # Precedence
//!
//! Extensions are consulted in attachment order:
//!
//! - `Ok(None)` from [`Extension::validate_and_normalize`] declines the
//!   name and the next extension is asked.
//! - `Ok(Some(value))` accepts; the normalized value is stored and no
//!   further extension is consulted.
//! - `Err(..)` rejects and the assignment fails.
//!
//! The same rule applies to [`Extension::attribute_type`]: the first
//! extension returning `Some` decides how raw values are coerced.
//!
//! # Example
//!
//! ```rust,ignore
//! use cirrus_core::{AttributeValue, CloudEvent, StringExtension};
//!
//! let mut event = CloudEvent::builder(SpecVersion::V1_0)
//!     .extension(StringExtension::new("comexampleextension1"))
//!     .event_type("com.example.test")
//!     .source("https://example.com/src")
//!     .attribute("comexampleextension1", "value")
//!     .build()?;
//!
//! // Rejected: the extension only accepts strings.
//! assert!(event.set("comexampleextension1", 5).is_err());
//! ```

pub mod builtin;
pub mod set;

use std::sync::Arc;

use crate::error::AttributeResult;
use crate::foundation::value::{AttributeType, AttributeValue};

pub use builtin::{PartitioningExtension, SequenceExtension, StringExtension, TypedExtension};
pub use set::ExtensionSet;

/// A capability object owning a set of extension attribute names.
pub trait Extension: Send + Sync {
    /// Name used in diagnostics and for attach idempotence.
    fn name(&self) -> &str;

    /// The lowercase attribute names this extension owns.
    fn attribute_names(&self) -> Vec<&str>;

    /// Validates and normalizes a candidate value.
    ///
    /// Returns `Ok(None)` for names this extension does not own.
    fn validate_and_normalize(
        &self,
        name: &str,
        value: &AttributeValue,
    ) -> AttributeResult<Option<AttributeValue>>;

    /// The type raw values for `name` should be coerced to before
    /// validation, if this extension constrains it.
    fn attribute_type(&self, _name: &str) -> Option<AttributeType> {
        None
    }

    /// Values copied into an event when the extension is attached.
    fn preset_values(&self) -> Vec<(String, AttributeValue)> {
        Vec::new()
    }

    /// Returns `true` if `name` is one of this extension's attributes.
    fn owns(&self, name: &str) -> bool {
        self.attribute_names()
            .iter()
            .any(|owned| owned.eq_ignore_ascii_case(name))
    }
}

/// A shared, type-erased extension.
pub type BoxedExtension = Arc<dyn Extension>;
