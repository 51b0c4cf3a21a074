//! The CloudEvent attribute model.
//!
//! A [`CloudEvent`] is a spec version, a bag of named attribute values and
//! an optional payload. Attribute names are stored lowercase. Role
//! attributes (see [`AttributeRole`]) are stored under the wire name of the
//! event's version, so a 0.1 event keeps its id under `eventid`.
//!
//! # Assignment
//!
//! Every assignment goes through [`CloudEvent::set`]:
//!
//! 1. The name is validated (ASCII letters and digits) and lowercased.
//! 2. Version attributes and `data` are reserved and rejected.
//! 3. Role attributes are coerced to the role's type, so a string assigned
//!    to `source` is parsed as a URI.
//! 4. Anything else is offered to the attached extensions in order.
//!
//! Decoders use [`CloudEvent::set_decoded`] instead, which skips step 1
//! apart from lowercasing, so members with any spelling are kept.
//!
//! Presence of the required attributes is only checked by
//! [`CloudEvent::validate`], so decoders can build events incrementally.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{AttributeError, AttributeResult, CloudEventError, CloudEventResult};
use crate::foundation::content_type::ContentType;
use crate::foundation::data::Data;
use crate::foundation::uri::Uri;
use crate::foundation::value::{AttributeType, AttributeValue};
use crate::foundation::version::{AttributeRole, SpecVersion};
use crate::integration::extension::{BoxedExtension, Extension, ExtensionSet};

// ============================================================================
// CloudEvent
// ============================================================================

/// A CloudEvent of a specific spec version.
#[derive(Debug, Clone, Default)]
pub struct CloudEvent {
    spec_version: SpecVersion,
    attributes: BTreeMap<String, AttributeValue>,
    data: Option<Data>,
    extensions: ExtensionSet,
}

impl CloudEvent {
    /// Creates an empty event.
    pub fn new(spec_version: SpecVersion) -> Self {
        Self {
            spec_version,
            ..Default::default()
        }
    }

    /// Creates an empty event with `extensions` attached in order.
    ///
    /// Fails if a preset value of an extension is rejected.
    pub fn with_extensions(
        spec_version: SpecVersion,
        extensions: &[BoxedExtension],
    ) -> AttributeResult<Self> {
        let mut event = Self::new(spec_version);
        for ext in extensions {
            event.attach(ext.clone())?;
        }
        Ok(event)
    }

    /// Starts building an event.
    pub fn builder(spec_version: SpecVersion) -> CloudEventBuilder {
        CloudEventBuilder::new(spec_version)
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    /// Changes the spec version, moving role attributes to the new
    /// version's wire names.
    ///
    /// Fails with [`AttributeError::Conflict`] when a role would move onto
    /// the name of an extension attribute. The event is left unchanged.
    pub fn set_spec_version(&mut self, version: SpecVersion) -> AttributeResult<()> {
        if version == self.spec_version {
            return Ok(());
        }
        let mut moves = Vec::new();
        for role in AttributeRole::ALL {
            if role.is_reserved() {
                continue;
            }
            let from = self.spec_version.attribute_key(role);
            if !self.attributes.contains_key(&from) {
                continue;
            }
            let to = version.attribute_key(role);
            if to != from
                && self.attributes.contains_key(&to)
                && self.spec_version.role_of(&to).is_none()
            {
                return Err(AttributeError::Conflict(to));
            }
            moves.push((from, to));
        }

        let moved: Vec<_> = moves
            .into_iter()
            .filter_map(|(from, to)| self.attributes.remove(&from).map(|value| (to, value)))
            .collect();
        self.attributes.extend(moved);
        self.spec_version = version;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------------

    /// Attaches an extension.
    ///
    /// Preset values of the extension are assigned to attributes that are
    /// not yet set, and existing values of the names it owns are validated
    /// again. Attaching an extension whose names are already bound to an
    /// extension of the same name does nothing and returns `Ok(false)`.
    ///
    /// On error the event is left unchanged.
    pub fn attach(&mut self, extension: BoxedExtension) -> AttributeResult<bool> {
        let mut staged = self.extensions.clone();
        if !staged.register(extension.clone()) {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut self.extensions, staged);

        match self.revalidate_for(extension.as_ref()) {
            Ok(updates) => {
                debug!(
                    extension = extension.name(),
                    updated = updates.len(),
                    "Attached extension"
                );
                self.attributes.extend(updates);
                Ok(true)
            }
            Err(err) => {
                self.extensions = previous;
                Err(err)
            }
        }
    }

    fn revalidate_for(
        &self,
        extension: &dyn Extension,
    ) -> AttributeResult<Vec<(String, AttributeValue)>> {
        let mut updates = Vec::new();
        for (name, value) in extension.preset_values() {
            let key = normalize_name(&name)?;
            if !self.attributes.contains_key(&key) {
                updates.push((key.clone(), self.prepare(&key, value)?));
            }
        }
        for (key, value) in &self.attributes {
            if extension.owns(key) {
                updates.push((key.clone(), self.prepare(key, value.clone())?));
            }
        }
        Ok(updates)
    }

    /// The extensions attached to this event.
    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    // ------------------------------------------------------------------------
    // Attribute Access
    // ------------------------------------------------------------------------

    /// Returns an attribute by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    /// Assigns an attribute, applying role typing and extension validation.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> AttributeResult<()> {
        let key = normalize_name(name)?;
        let value = self.prepare(&key, value.into())?;
        self.attributes.insert(key, value);
        Ok(())
    }

    /// Assigns an attribute read from a wire format.
    ///
    /// Like [`set`](Self::set), but any non-empty name is accepted and only
    /// lowercased, so unknown members survive as extension attributes.
    pub fn set_decoded(&mut self, name: &str, value: impl Into<AttributeValue>) -> AttributeResult<()> {
        if name.is_empty() {
            return Err(AttributeError::InvalidName(String::new()));
        }
        let key = name.to_ascii_lowercase();
        let value = self.prepare(&key, value.into())?;
        self.attributes.insert(key, value);
        Ok(())
    }

    /// Assigns an attribute from its string form, parsed according to the
    /// type of the role or extension owning `name`.
    pub fn set_from_string(&mut self, name: &str, text: &str) -> AttributeResult<()> {
        self.set(name, AttributeValue::String(text.to_string()))
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(&name.to_ascii_lowercase())
    }

    /// Iterates over all attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over attributes that are not roles of this event's version.
    pub fn extension_attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes()
            .filter(|(name, _)| self.spec_version.role_of(name).is_none())
    }

    /// Returns the type values of `name` are coerced to, if constrained.
    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        match self.spec_version.role_of(name) {
            Some(role) => Some(role.attribute_type()),
            None => self.extensions.attribute_type(name),
        }
    }

    /// Returns a typed extension value stored by a
    /// [`TypedExtension`](crate::TypedExtension).
    pub fn extension_value<V: 'static>(&self, name: &str) -> Option<&V> {
        self.get(name)?.as_custom()?.downcast_ref()
    }

    fn prepare(&self, key: &str, value: AttributeValue) -> AttributeResult<AttributeValue> {
        if let Some(role) = self.spec_version.role_of(key) {
            if role.is_reserved() {
                return Err(AttributeError::Reserved(key.to_string()));
            }
            return value
                .coerce_to(role.attribute_type())
                .map_err(|e| AttributeError::for_attribute(key, e));
        }
        if SpecVersion::is_spec_version_name(key) {
            return Err(AttributeError::Reserved(key.to_string()));
        }

        let coerced = match self.extensions.attribute_type(key) {
            Some(ty) => value.clone().coerce_to(ty),
            None => Ok(value.clone()),
        };
        let candidate = coerced.as_ref().unwrap_or(&value);
        match self.extensions.normalize(key, candidate)? {
            Some(normalized) => Ok(normalized),
            None => coerced.map_err(|e| AttributeError::for_attribute(key, e)),
        }
    }

    // ------------------------------------------------------------------------
    // Role Attributes
    // ------------------------------------------------------------------------

    /// Returns the value stored for a role.
    pub fn role(&self, role: AttributeRole) -> Option<&AttributeValue> {
        self.attributes.get(&self.spec_version.attribute_key(role))
    }

    fn set_role(&mut self, role: AttributeRole, value: AttributeValue) {
        self.attributes
            .insert(self.spec_version.attribute_key(role), value);
    }

    pub fn id(&self) -> Option<&str> {
        self.role(AttributeRole::Id)?.as_str()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_role(AttributeRole::Id, AttributeValue::String(id.into()));
    }

    pub fn event_type(&self) -> Option<&str> {
        self.role(AttributeRole::Type)?.as_str()
    }

    pub fn set_event_type(&mut self, ty: impl Into<String>) {
        self.set_role(AttributeRole::Type, AttributeValue::String(ty.into()));
    }

    pub fn source(&self) -> Option<&Uri> {
        self.role(AttributeRole::Source)?.as_uri()
    }

    pub fn set_source(&mut self, source: Uri) {
        self.set_role(AttributeRole::Source, AttributeValue::Uri(source));
    }

    pub fn subject(&self) -> Option<&str> {
        self.role(AttributeRole::Subject)?.as_str()
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.set_role(AttributeRole::Subject, AttributeValue::String(subject.into()));
    }

    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.role(AttributeRole::Time)?.as_timestamp()
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.set_role(AttributeRole::Time, AttributeValue::Timestamp(time));
    }

    pub fn data_schema(&self) -> Option<&Uri> {
        self.role(AttributeRole::DataSchema)?.as_uri()
    }

    pub fn set_data_schema(&mut self, schema: Uri) {
        self.set_role(AttributeRole::DataSchema, AttributeValue::Uri(schema));
    }

    pub fn data_content_type(&self) -> Option<&ContentType> {
        self.role(AttributeRole::DataContentType)?.as_content_type()
    }

    pub fn set_data_content_type(&mut self, content_type: ContentType) {
        self.set_role(
            AttributeRole::DataContentType,
            AttributeValue::ContentType(content_type),
        );
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: impl Into<Data>) {
        self.data = Some(data.into());
    }

    /// Removes and returns the payload.
    pub fn take_data(&mut self) -> Option<Data> {
        self.data.take()
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Checks that the required attributes are present and every role holds
    /// a value of its type.
    ///
    /// All problems are collected into one [`CloudEventError::Validation`].
    pub fn validate(&self) -> CloudEventResult<()> {
        let mut problems = Vec::new();

        for role in AttributeRole::ALL {
            if role.is_reserved() {
                continue;
            }
            let name = self.spec_version.attribute_name(role);
            match self.role(role) {
                None if role.is_required() => {
                    problems.push(format!("missing required attribute '{name}'"));
                }
                None => {}
                Some(value) if value.attribute_type() != role.attribute_type() => {
                    problems.push(format!(
                        "attribute '{name}' must be a {}, found {}",
                        role.attribute_type(),
                        value.attribute_type()
                    ));
                }
                Some(AttributeValue::String(s)) if s.is_empty() && role.is_required() => {
                    problems.push(format!("attribute '{name}' must not be empty"));
                }
                Some(_) => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CloudEventError::Validation { problems })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl PartialEq for CloudEvent {
    fn eq(&self, other: &Self) -> bool {
        self.spec_version == other.spec_version
            && self.attributes == other.attributes
            && self.data == other.data
    }
}

/// Lowercases an attribute name, rejecting anything but ASCII letters and
/// digits.
pub fn normalize_name(name: &str) -> AttributeResult<String> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AttributeError::InvalidName(name.to_string()));
    }
    Ok(name.to_ascii_lowercase())
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`CloudEvent`].
///
/// Extensions are attached before any attribute is assigned, so every
/// assignment is validated by them. A UUID v4 id is generated when none is
/// given, and the result is validated.
///
/// ```rust,ignore
/// let event = CloudEvent::builder(SpecVersion::V1_0)
///     .event_type("com.example.test")
///     .source("https://example.com/src")
///     .data("<x/>")
///     .build()?;
/// ```
pub struct CloudEventBuilder {
    spec_version: SpecVersion,
    extensions: Vec<BoxedExtension>,
    attributes: Vec<(String, AttributeValue)>,
    data: Option<Data>,
}

impl fmt::Debug for CloudEventBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudEventBuilder")
            .field("spec_version", &self.spec_version)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("attributes", &self.attributes)
            .field("data", &self.data)
            .finish()
    }
}

impl CloudEventBuilder {
    pub fn new(spec_version: SpecVersion) -> Self {
        Self {
            spec_version,
            extensions: Vec::new(),
            attributes: Vec::new(),
            data: None,
        }
    }

    /// Attaches an extension.
    pub fn extension(self, extension: impl Extension + 'static) -> Self {
        self.boxed_extension(Arc::new(extension))
    }

    /// Attaches a shared extension.
    pub fn boxed_extension(mut self, extension: BoxedExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Sets an arbitrary attribute.
    pub fn attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    fn role(self, role: AttributeRole, value: impl Into<AttributeValue>) -> Self {
        let name = self.spec_version.attribute_name(role);
        self.attribute(name, value)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.role(AttributeRole::Id, id.into())
    }

    pub fn event_type(self, ty: impl Into<String>) -> Self {
        self.role(AttributeRole::Type, ty.into())
    }

    /// Sets the source; strings are parsed as URIs when the event is built.
    pub fn source(self, source: impl Into<AttributeValue>) -> Self {
        self.role(AttributeRole::Source, source)
    }

    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.role(AttributeRole::Subject, subject.into())
    }

    pub fn time(self, time: DateTime<Utc>) -> Self {
        self.role(AttributeRole::Time, time)
    }

    pub fn data_schema(self, schema: impl Into<AttributeValue>) -> Self {
        self.role(AttributeRole::DataSchema, schema)
    }

    pub fn data_content_type(self, content_type: impl Into<AttributeValue>) -> Self {
        self.role(AttributeRole::DataContentType, content_type)
    }

    pub fn data(mut self, data: impl Into<Data>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Builds and validates the event.
    pub fn build(self) -> CloudEventResult<CloudEvent> {
        let mut event = CloudEvent::with_extensions(self.spec_version, &self.extensions)?;
        for (name, value) in self.attributes {
            event.set(&name, value)?;
        }
        if event.id().is_none() {
            event.set_id(uuid::Uuid::new_v4().to_string());
        }
        event.data = self.data;
        event.validate()?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::extension::{SequenceExtension, StringExtension, TypedExtension};
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CustomData {
        #[serde(rename = "othervalue")]
        other_value: i32,
    }

    fn sample(version: SpecVersion) -> CloudEvent {
        CloudEvent::builder(version)
            .id("A1")
            .event_type("com.example.test")
            .source("https://example.com/src")
            .build()
            .unwrap()
    }

    #[test]
    fn test_role_typing_on_set() {
        let mut event = sample(SpecVersion::V1_0);
        event.set("TIME", "2018-04-05T17:31:00Z").unwrap();
        assert_eq!(
            event.time(),
            Some(&Utc.with_ymd_and_hms(2018, 4, 5, 17, 31, 0).unwrap())
        );

        event.set("datacontenttype", "text/xml").unwrap();
        assert_eq!(event.data_content_type().unwrap().media_type(), "text/xml");

        let err = event.set("source", "not a uri").unwrap_err();
        assert!(matches!(err, AttributeError::Invalid { name, .. } if name == "source"));
    }

    #[test]
    fn test_reserved_and_invalid_names() {
        let mut event = CloudEvent::new(SpecVersion::V1_0);
        assert!(matches!(event.set("specversion", "1.0"), Err(AttributeError::Reserved(_))));
        assert!(matches!(event.set("cloudEventsVersion", "0.1"), Err(AttributeError::Reserved(_))));
        assert!(matches!(event.set("data", "x"), Err(AttributeError::Reserved(_))));
        assert!(matches!(event.set("data_base64", "x"), Err(AttributeError::InvalidName(_))));
        assert!(matches!(event.set("", "x"), Err(AttributeError::InvalidName(_))));
    }

    #[test]
    fn test_version_specific_keys() {
        let event = sample(SpecVersion::V0_1);
        assert_eq!(event.get("eventID").and_then(|v| v.as_str()), Some("A1"));
        assert_eq!(event.id(), Some("A1"));
        assert!(event.get("id").is_none());
    }

    #[test]
    fn test_set_spec_version_renames_roles() {
        let mut event = sample(SpecVersion::V0_1);
        event.set("contentType", "application/json").unwrap();
        event.set_spec_version(SpecVersion::V1_0).unwrap();

        assert_eq!(event.get("id").and_then(|v| v.as_str()), Some("A1"));
        assert!(event.get("eventid").is_none());
        assert!(event.data_content_type().is_some());
        assert!(event.is_valid());
    }

    #[test]
    fn test_set_spec_version_conflict_keeps_event() {
        let mut event = sample(SpecVersion::V1_0);
        event.set("eventtype", "legacy").unwrap();
        let before = event.clone();

        let err = event.set_spec_version(SpecVersion::V0_1).unwrap_err();
        assert!(matches!(err, AttributeError::Conflict(name) if name == "eventtype"));
        assert_eq!(event, before);
        assert_eq!(event.get("eventtype").and_then(|v| v.as_str()), Some("legacy"));
    }

    #[test]
    fn test_set_decoded_keeps_any_spelling() {
        let mut event = sample(SpecVersion::V1_0);
        event.set_decoded("My_Ext-1", "x").unwrap();
        assert_eq!(event.get("my_ext-1").and_then(|v| v.as_str()), Some("x"));

        assert!(matches!(event.set_decoded("", "x"), Err(AttributeError::InvalidName(_))));
        assert!(matches!(event.set_decoded("Data", "x"), Err(AttributeError::Reserved(_))));
        assert!(event.set_decoded("source", "not a uri").is_err());
    }

    #[test]
    fn test_builder_debug_lists_extension_names() {
        let builder = CloudEvent::builder(SpecVersion::V1_0)
            .extension(StringExtension::new("comexampleextension1"))
            .id("A1");
        let rendered = format!("{builder:?}");
        assert!(rendered.contains("CloudEventBuilder"));
        assert!(rendered.contains("comexampleextension1"));
    }

    #[test]
    fn test_validate_aggregates_problems() {
        let mut event = CloudEvent::new(SpecVersion::V1_0);
        event.set_id("");
        let err = event.validate().unwrap_err();
        match err {
            CloudEventError::Validation { problems } => {
                assert_eq!(problems.len(), 3);
                assert!(problems[0].contains("'id' must not be empty"));
                assert!(problems[1].contains("'type'"));
                assert!(problems[2].contains("'source'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builder_generates_id() {
        let event = CloudEvent::builder(SpecVersion::V1_0)
            .event_type("t")
            .source("/relative")
            .build()
            .unwrap();
        assert_eq!(event.id().map(str::len), Some(36));
    }

    #[test]
    fn test_extension_validates_on_assignment() {
        let mut event = CloudEvent::builder(SpecVersion::V1_0)
            .extension(StringExtension::new("comexampleextension1"))
            .id("1")
            .event_type("t")
            .source("https://x/")
            .attribute("comexampleextension1", "value")
            .build()
            .unwrap();

        let err = event.set("comexampleextension1", json!({"a": 1})).unwrap_err();
        assert!(err.to_string().contains("value is missing or not a string"));
        assert_eq!(
            event.get("comexampleextension1"),
            Some(&AttributeValue::from("value"))
        );
    }

    #[test]
    fn test_typed_extension_value() {
        let mut event = sample(SpecVersion::V1_0);
        event
            .attach(Arc::new(TypedExtension::<CustomData>::new("comexampleextension2")))
            .unwrap();
        event
            .set("comexampleextension2", json!({"othervalue": 5}))
            .unwrap();
        assert_eq!(
            event.extension_value::<CustomData>("comexampleextension2"),
            Some(&CustomData { other_value: 5 })
        );
    }

    #[test]
    fn test_attach_presets_and_idempotence() {
        let mut event = sample(SpecVersion::V1_0);
        assert!(event.attach(Arc::new(SequenceExtension::integer())).unwrap());
        assert_eq!(event.get("sequencetype"), Some(&AttributeValue::from("Integer")));
        assert!(!event.attach(Arc::new(SequenceExtension::new())).unwrap());
        assert_eq!(event.extensions().len(), 1);
    }

    #[test]
    fn test_attach_revalidates_existing_values() {
        let mut event = sample(SpecVersion::V1_0);
        event.set("comexampleextension1", 5).unwrap();

        let err = event
            .attach(Arc::new(StringExtension::new("comexampleextension1")))
            .unwrap_err();
        assert!(matches!(err, AttributeError::Rejected { .. }));
        assert!(event.extensions().is_empty());
    }

    #[test]
    fn test_equality_ignores_extensions() {
        let mut a = sample(SpecVersion::V1_0);
        let b = a.clone();
        a.attach(Arc::new(StringExtension::new("x"))).unwrap();
        assert_eq!(a, b);
    }
}
