//! Spec version registry.
//!
//! Every supported CloudEvents version is a variant of [`SpecVersion`]. Each
//! version carries a fixed table mapping logical [`AttributeRole`]s to the
//! attribute names used on the wire, since older versions spelled several
//! of them differently:
//!
//! | role            | 0.1                  | 0.2         | 0.3               | 1.0               |
//! |-----------------|----------------------|-------------|-------------------|-------------------|
//! | id              | `eventID`            | `id`        | `id`              | `id`              |
//! | type            | `eventType`          | `type`      | `type`            | `type`            |
//! | time            | `eventTime`          | `time`      | `time`            | `time`            |
//! | dataschema      | `schemaURL`          | `schemaurl` | `schemaurl`       | `dataschema`      |
//! | datacontenttype | `contentType`        | `contenttype` | `datacontenttype` | `datacontenttype` |
//! | specversion     | `cloudEventsVersion` | `specversion` | `specversion`   | `specversion`     |
//!
//! `source`, `subject` and `data` are spelled the same in every version.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{CloudEventError, CloudEventResult};
use crate::foundation::value::AttributeType;

// ============================================================================
// Attribute Roles
// ============================================================================

/// Logical attribute roles with a version-specific wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Id,
    Type,
    Source,
    Subject,
    Time,
    DataSchema,
    DataContentType,
    SpecVersion,
    Data,
}

impl AttributeRole {
    /// Every role, in table order.
    pub const ALL: [AttributeRole; 9] = [
        AttributeRole::Id,
        AttributeRole::Type,
        AttributeRole::Source,
        AttributeRole::Subject,
        AttributeRole::Time,
        AttributeRole::DataSchema,
        AttributeRole::DataContentType,
        AttributeRole::SpecVersion,
        AttributeRole::Data,
    ];

    /// Returns the type every value assigned to this role must have.
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Id | Self::Type | Self::Subject | Self::SpecVersion => AttributeType::String,
            Self::Source | Self::DataSchema => AttributeType::Uri,
            Self::Time => AttributeType::Timestamp,
            Self::DataContentType => AttributeType::ContentType,
            Self::Data => AttributeType::Any,
        }
    }

    /// Returns `true` for roles a valid event must populate.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Id | Self::Type | Self::Source)
    }

    /// Returns `true` for roles that are derived from the event itself and
    /// never stored in the attribute map.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::SpecVersion | Self::Data)
    }
}

// ============================================================================
// Spec Version
// ============================================================================

/// A supported CloudEvents specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SpecVersion {
    V0_1,
    V0_2,
    V0_3,
    #[default]
    V1_0,
}

impl SpecVersion {
    /// Every supported version, oldest first.
    pub const ALL: [SpecVersion; 4] = [
        SpecVersion::V0_1,
        SpecVersion::V0_2,
        SpecVersion::V0_3,
        SpecVersion::V1_0,
    ];

    /// The identifier written as the value of the version attribute.
    pub fn version_id(&self) -> &'static str {
        match self {
            Self::V0_1 => "0.1",
            Self::V0_2 => "0.2",
            Self::V0_3 => "0.3",
            Self::V1_0 => "1.0",
        }
    }

    /// Looks up a version by its identifier.
    pub fn from_version_id(id: &str) -> Option<SpecVersion> {
        Self::ALL.into_iter().find(|v| v.version_id() == id)
    }

    /// Returns the wire name used for `role` by this version.
    pub fn attribute_name(&self, role: AttributeRole) -> &'static str {
        use AttributeRole as R;

        match (self, role) {
            (Self::V0_1, R::Id) => "eventID",
            (Self::V0_1, R::Type) => "eventType",
            (Self::V0_1, R::Time) => "eventTime",
            (Self::V0_1, R::DataSchema) => "schemaURL",
            (Self::V0_1, R::DataContentType) => "contentType",
            (Self::V0_1, R::SpecVersion) => "cloudEventsVersion",
            (Self::V0_2, R::DataSchema) | (Self::V0_3, R::DataSchema) => "schemaurl",
            (Self::V0_2, R::DataContentType) => "contenttype",
            (_, R::Id) => "id",
            (_, R::Type) => "type",
            (_, R::Source) => "source",
            (_, R::Subject) => "subject",
            (_, R::Time) => "time",
            (_, R::DataSchema) => "dataschema",
            (_, R::DataContentType) => "datacontenttype",
            (_, R::SpecVersion) => "specversion",
            (_, R::Data) => "data",
        }
    }

    /// Returns the lowercase key under which `role` is stored in an event of
    /// this version.
    pub fn attribute_key(&self, role: AttributeRole) -> String {
        self.attribute_name(role).to_ascii_lowercase()
    }

    /// Returns the role `name` plays in this version, comparing
    /// case-insensitively.
    pub fn role_of(&self, name: &str) -> Option<AttributeRole> {
        AttributeRole::ALL
            .into_iter()
            .find(|role| self.attribute_name(*role).eq_ignore_ascii_case(name))
    }

    /// Returns `true` if `name` is the version attribute of any supported
    /// version.
    pub fn is_spec_version_name(name: &str) -> bool {
        Self::ALL
            .iter()
            .any(|v| v.attribute_name(AttributeRole::SpecVersion).eq_ignore_ascii_case(name))
    }

    /// Determines the version of a parsed structured document.
    ///
    /// Every version's version member is inspected, oldest spelling first;
    /// the first one present decides.
    pub fn resolve_structured(document: &Map<String, Value>) -> VersionResolution {
        for version in Self::ALL {
            let member = version.attribute_name(AttributeRole::SpecVersion);
            let Some(value) = document.get(member) else {
                continue;
            };

            // Only 0.1 used this member name, so its value is not consulted.
            if version == Self::V0_1 {
                return VersionResolution::Resolved(Self::V0_1);
            }

            return match value.as_str().and_then(Self::from_version_id) {
                Some(resolved) => VersionResolution::Resolved(resolved),
                None => VersionResolution::Unknown(match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            };
        }
        VersionResolution::Missing
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_id())
    }
}

impl FromStr for SpecVersion {
    type Err = CloudEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_version_id(s).ok_or_else(|| CloudEventError::UnknownSpecVersion(s.to_string()))
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.version_id())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SpecVersionVisitor)
    }
}

/// Accepts the identifier as a string, or as a bare number the way
/// unquoted config values and environment variables arrive.
struct SpecVersionVisitor;

impl serde::de::Visitor<'_> for SpecVersionVisitor {
    type Value = SpecVersion;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a CloudEvents spec version such as \"1.0\"")
    }

    fn visit_str<E: serde::de::Error>(self, id: &str) -> Result<SpecVersion, E> {
        SpecVersion::from_version_id(id)
            .ok_or_else(|| E::custom(format!("unknown spec version '{id}'")))
    }

    fn visit_f64<E: serde::de::Error>(self, id: f64) -> Result<SpecVersion, E> {
        self.visit_str(&format!("{id:.1}"))
    }
}

// ============================================================================
// Version Resolution
// ============================================================================

/// Outcome of inspecting a document or property map for its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResolution {
    /// A known version was found.
    Resolved(SpecVersion),
    /// No version attribute was present.
    Missing,
    /// A version attribute was present with an unrecognized identifier.
    Unknown(String),
}

/// How a decoder reacts to a document without a version attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Fall back to the configured default version.
    #[default]
    Lenient,
    /// Fail with [`CloudEventError::MissingSpecVersion`].
    Strict,
}

impl VersionPolicy {
    /// Turns a resolution into a version, applying this policy.
    ///
    /// Unknown identifiers fail under both policies.
    pub fn apply(
        &self,
        resolution: VersionResolution,
        default: SpecVersion,
    ) -> CloudEventResult<SpecVersion> {
        match resolution {
            VersionResolution::Resolved(version) => Ok(version),
            VersionResolution::Unknown(id) => Err(CloudEventError::UnknownSpecVersion(id)),
            VersionResolution::Missing => match self {
                Self::Lenient => {
                    warn!(
                        default = %default,
                        "No spec version attribute found, falling back to default"
                    );
                    Ok(default)
                }
                Self::Strict => Err(CloudEventError::MissingSpecVersion),
            },
        }
    }
}
