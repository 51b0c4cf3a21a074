//! Validated URI references.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AttributeError, AttributeResult};

/// A URI reference: either an absolute URI (`scheme:...`) or a relative
/// reference such as `/orders/1` or `#frag`.
///
/// The text is kept exactly as given, so a parsed value always renders back
/// to the same string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(Arc<str>);

impl Uri {
    /// Parses and validates a URI reference.
    pub fn parse(text: &str) -> AttributeResult<Self> {
        validate(text).map_err(|reason| AttributeError::InvalidUri {
            value: text.to_string(),
            reason,
        })?;
        Ok(Self(Arc::from(text)))
    }

    /// Returns the URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the scheme for absolute URIs.
    pub fn scheme(&self) -> Option<&str> {
        let (head, _) = self.0.split_once(':')?;
        if head.contains(['/', '?', '#']) {
            return None;
        }
        Some(head)
    }

    /// Returns `true` if the URI has a scheme.
    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some()
    }
}

fn validate(text: &str) -> Result<(), &'static str> {
    if text.is_empty() {
        return Err("empty URI");
    }
    if text.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("contains whitespace or control characters");
    }

    // A colon before any '/', '?' or '#' starts a scheme.
    let first_segment = text.split(['/', '?', '#']).next().unwrap_or_default();
    if let Some((scheme, _)) = first_segment.split_once(':') {
        let mut chars = scheme.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_alpha
            || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err("malformed scheme");
        }
    }

    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' {
            let escaped = bytes.get(i + 1..i + 3);
            if !escaped.is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit)) {
                return Err("malformed percent-encoding");
            }
        }
    }
    Ok(())
}

impl Deref for Uri {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uri({:?})", &*self.0)
    }
}

impl FromStr for Uri {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = AttributeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_and_relative() {
        let abs = Uri::parse("https://example.com/src").unwrap();
        assert_eq!(abs.scheme(), Some("https"));
        assert_eq!(abs.to_string(), "https://example.com/src");

        let urn = Uri::parse("urn:uuid:6e8bc430-9c3a-11d9-9669-0800200c9a66").unwrap();
        assert_eq!(urn.scheme(), Some("urn"));

        let rel = Uri::parse("/cloudevents/spec/pull/123").unwrap();
        assert!(!rel.is_absolute());
        assert!(Uri::parse("a/b:c").unwrap().scheme().is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Uri::parse("").is_err());
        assert!(Uri::parse("has space").is_err());
        assert!(Uri::parse("1http://x").is_err());
        assert!(Uri::parse(":nothing").is_err());
        assert!(Uri::parse("http://x/%zz").is_err());
        assert!(Uri::parse("http://x/%2F").is_ok());
    }

    #[test]
    fn test_serde() {
        let uri: Uri = serde_json::from_str("\"mailto:a@b.c\"").unwrap();
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"mailto:a@b.c\"");
        assert!(serde_json::from_str::<Uri>("\"bad uri\"").is_err());
    }
}
