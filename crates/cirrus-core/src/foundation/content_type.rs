//! Parsed media types for the `datacontenttype` attribute.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AttributeError, AttributeResult};

/// A media type such as `application/json; charset=utf-8`.
///
/// Type, subtype and parameter names are compared case-insensitively and
/// stored lowercase. Parameter values keep their case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
    media_type: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// Parses a media type string.
    pub fn parse(text: &str) -> AttributeResult<Self> {
        let invalid = |reason| AttributeError::InvalidContentType {
            value: text.to_string(),
            reason,
        };

        let mut parts = text.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (ty, subtype) = essence
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' between type and subtype"))?;
        if !is_token(ty) || !is_token(subtype) {
            return Err(invalid("type and subtype must be non-empty tokens"));
        }

        let mut params = Vec::new();
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| invalid("parameter without '='"))?;
            let name = name.trim();
            if !is_token(name) {
                return Err(invalid("parameter name must be a token"));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            params.push((name.to_ascii_lowercase(), value.to_string()));
        }

        Ok(Self {
            media_type: essence.to_ascii_lowercase(),
            params,
        })
    }

    /// Creates a content type from a constant `type/subtype` without
    /// validating it.
    pub fn from_static(media_type: &'static str) -> Self {
        Self {
            media_type: media_type.to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    /// Creates a content type without parameters.
    pub fn new(media_type: &str) -> AttributeResult<Self> {
        Self::parse(media_type)
    }

    /// Adds a parameter, replacing an existing one with the same name.
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.params.retain(|(n, _)| *n != name);
        self.params.push((name, value.to_string()));
        self
    }

    /// Returns the `type/subtype` part, lowercase.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the subtype suffix after `+`, e.g. `json` for
    /// `application/cloudevents+json`.
    pub fn suffix(&self) -> Option<&str> {
        self.media_type.rsplit_once('+').map(|(_, suffix)| suffix)
    }

    /// Returns a parameter value by (case-insensitive) name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the `charset` parameter.
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns `true` for `application/json` and any `+json` subtype.
    pub fn is_json(&self) -> bool {
        self.media_type == "application/json" || self.suffix() == Some("json")
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
        })
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.media_type)?;
        for (name, value) in &self.params {
            if !value.is_empty() && is_token(value) {
                write!(f, "; {name}={value}")?;
            } else {
                write!(f, "; {name}=\"{value}\"")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ContentType {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_charset() {
        let ct = ContentType::parse("Application/CloudEvents+JSON; Charset=utf-8").unwrap();
        assert_eq!(ct.media_type(), "application/cloudevents+json");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.suffix(), Some("json"));
        assert!(ct.is_json());
        assert_eq!(ct.to_string(), "application/cloudevents+json; charset=utf-8");
    }

    #[test]
    fn test_quoted_parameter() {
        let ct = ContentType::parse("multipart/form-data; boundary=\"a b\"").unwrap();
        assert_eq!(ct.parameter("BOUNDARY"), Some("a b"));
        assert_eq!(ct.to_string(), "multipart/form-data; boundary=\"a b\"");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
        assert!(ContentType::parse("text/xml; charset").is_err());
    }

    #[test]
    fn test_plain_types() {
        let xml = ContentType::new("text/xml").unwrap();
        assert!(!xml.is_json());
        assert_eq!(xml.to_string(), "text/xml");
        let json = ContentType::new("application/json").unwrap();
        assert!(json.is_json());
        assert_eq!(json.with_parameter("charset", "utf-8").charset(), Some("utf-8"));
    }
}
