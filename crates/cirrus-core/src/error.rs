//! Unified error types for the Cirrus core.
//!
//! Two layers of errors exist:
//!
//! - [`AttributeError`]: a single attribute value could not be coerced,
//!   parsed or accepted by an extension. Raised at the point of assignment.
//! - [`CloudEventError`]: a whole encode/decode call failed. Wraps
//!   attribute errors and adds document-level failures (malformed JSON,
//!   unknown spec version, payload coercion, aggregated validation).

use thiserror::Error;

use crate::foundation::value::AttributeType;

// ============================================================================
// Attribute Errors
// ============================================================================

/// Errors raised while assigning or coercing a single attribute value.
#[derive(Debug, Clone, Error)]
pub enum AttributeError {
    /// The attribute name is empty or contains characters other than ASCII
    /// letters and digits.
    #[error("invalid attribute name '{0}': names must be non-empty ASCII letters and digits")]
    InvalidName(String),

    /// The attribute is derived from the event itself and cannot be assigned.
    #[error("attribute '{0}' is reserved and cannot be set directly")]
    Reserved(String),

    /// Changing the spec version would move a role onto an extension
    /// attribute of the same name.
    #[error("attribute '{0}' is held by an extension attribute")]
    Conflict(String),

    /// The value has a different type than the attribute requires.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        /// The type the attribute requires.
        expected: AttributeType,
        /// Description of the value that was supplied.
        found: String,
    },

    /// A URI literal could not be parsed.
    #[error("invalid URI '{value}': {reason}")]
    InvalidUri {
        /// The rejected literal.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A timestamp literal is not valid RFC 3339.
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        /// The rejected literal.
        value: String,
        /// Parser failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A media type literal could not be parsed.
    #[error("invalid content type '{value}': {reason}")]
    InvalidContentType {
        /// The rejected literal.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An integer literal is not a 32-bit signed integer.
    #[error("invalid integer '{0}'")]
    InvalidInteger(String),

    /// A boolean literal is neither `true` nor `false`.
    #[error("invalid boolean '{0}'")]
    InvalidBoolean(String),

    /// Binary content is not valid base64.
    #[error("invalid base64 value: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// An extension refused a value for an attribute it owns.
    #[error("extension '{extension}' rejected attribute '{attribute}': {reason}")]
    Rejected {
        /// Name of the rejecting extension.
        extension: String,
        /// The attribute being assigned.
        attribute: String,
        /// Reason reported by the extension.
        reason: String,
    },

    /// A coercion failure attributed to a named attribute.
    #[error("attribute '{name}': {source}")]
    Invalid {
        /// The attribute being assigned.
        name: String,
        /// The underlying coercion failure.
        #[source]
        source: Box<AttributeError>,
    },
}

impl AttributeError {
    /// Creates an extension rejection.
    pub fn rejected(
        extension: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            extension: extension.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn mismatch(expected: AttributeType, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Attributes a coercion failure to `name`.
    ///
    /// Errors that already name their attribute are returned unchanged.
    pub fn for_attribute(name: &str, err: AttributeError) -> Self {
        match err {
            Self::InvalidName(_)
            | Self::Reserved(_)
            | Self::Conflict(_)
            | Self::Rejected { .. }
            | Self::Invalid { .. } => {
                err
            }
            other => Self::Invalid {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }
}

// ============================================================================
// CloudEvent Errors
// ============================================================================

/// Errors that fail a whole encode, decode or conversion call.
#[derive(Debug, Error)]
pub enum CloudEventError {
    /// The input is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is well-formed but does not have the shape of a CloudEvent.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// An attribute value was rejected.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// A spec version identifier was present but is not a known version.
    #[error("unknown CloudEvents spec version '{0}'")]
    UnknownSpecVersion(String),

    /// No spec version attribute was found and the strict policy is active.
    #[error("no CloudEvents spec version attribute found")]
    MissingSpecVersion,

    /// The payload could not be converted into the formatter's data type.
    #[error("failed to deserialize data of type {type_name}: {source}")]
    DataDeserialization {
        /// Fully qualified name of the target payload type.
        type_name: &'static str,
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },

    /// The assembled event is missing required attributes or holds invalid ones.
    #[error("invalid CloudEvent: {}", .problems.join("; "))]
    Validation {
        /// Every problem found, in attribute order.
        problems: Vec<String>,
    },

    /// Binary-mode decode was requested for a message without a CloudEvents
    /// spec version property.
    #[error("message is not a CloudEvent")]
    NotACloudEvent,

    /// The structured content type names a format no formatter handles.
    #[error("unsupported CloudEvents content type '{0}'")]
    UnsupportedContentType(String),

    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudEventError {
    /// Creates a malformed input error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Returns `true` for precondition violations made by the caller, as
    /// opposed to problems with the data being decoded.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::NotACloudEvent | Self::UnsupportedContentType(_)
        )
    }
}

// ============================================================================
// Result Type Aliases
// ============================================================================

/// Result type for attribute operations.
pub type AttributeResult<T> = Result<T, AttributeError>;

/// Result type for event-level operations.
pub type CloudEventResult<T> = Result<T, CloudEventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_attribute_wraps_once() {
        let err = AttributeError::for_attribute("time", AttributeError::InvalidInteger("x".into()));
        assert!(matches!(&err, AttributeError::Invalid { name, .. } if name == "time"));

        let again = AttributeError::for_attribute("other", err);
        assert!(matches!(again, AttributeError::Invalid { name, .. } if name == "time"));
    }

    #[test]
    fn test_validation_message_joins_problems() {
        let err = CloudEventError::Validation {
            problems: vec!["missing 'id'".into(), "missing 'type'".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid CloudEvent: missing 'id'; missing 'type'"
        );
    }

    #[test]
    fn test_caller_errors() {
        assert!(CloudEventError::NotACloudEvent.is_caller_error());
        assert!(!CloudEventError::MissingSpecVersion.is_caller_error());
    }
}
