//! Value objects: equality by value, not identity.
//!
//! `Uri` and `ContentType` are the two attribute values that carry more
//! structure than a plain string. Both keep the original text so that a
//! decode/encode cycle never rewrites what the producer sent.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. The trait
/// requires `Clone`, `PartialEq` and `Debug` so they behave like primitives.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A URI reference (absolute or relative), as used by `source` and `dataschema`.
///
/// Only the shape checks that hold for every URI reference are applied: the
/// value is non-empty and contains no whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri(String);

impl Uri {
    pub fn parse(value: impl Into<String>) -> Result<Self, EnvelopeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EnvelopeError::validation("URI must not be empty"));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(EnvelopeError::validation(format!(
                "'{value}' is not a valid URI reference"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme, when this is an absolute URI.
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once(':')?;
        let mut chars = scheme.chars();
        let first = chars.next()?;
        let valid = first.is_ascii_alphabetic()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(scheme)
    }

    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some()
    }
}

impl ValueObject for Uri {}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uri {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Uri {
    type Error = EnvelopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for Uri {
    type Error = EnvelopeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Uri> for String {
    fn from(value: Uri) -> Self {
        value.0
    }
}

/// A content type (`type/subtype` plus optional `; param=value` list).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentType(String);

impl ContentType {
    pub fn parse(value: impl Into<String>) -> Result<Self, EnvelopeError> {
        let value = value.into();
        let media_type = value.split(';').next().unwrap_or_default().trim();
        match media_type.split_once('/') {
            Some((ty, sub)) if !ty.is_empty() && !sub.is_empty() && !sub.contains('/') => {
                Ok(Self(value))
            }
            _ => Err(EnvelopeError::validation(format!(
                "'{value}' is not a valid content type"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part, without parameters, lowercased.
    pub fn media_type(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Value of a `; name=value` parameter (name matched case-insensitively).
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.0.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().trim_matches('"'))
        })
    }

    /// Whether the media type uses the `+json` structured syntax suffix or is
    /// plain `application/json`.
    pub fn is_json(&self) -> bool {
        let media_type = self.media_type();
        media_type == "application/json" || media_type.ends_with("+json")
    }

    /// `application/xml`, `text/xml` or any `+xml` media type.
    pub fn is_xml(&self) -> bool {
        let media_type = self.media_type();
        matches!(media_type.as_str(), "application/xml" | "text/xml")
            || media_type.ends_with("+xml")
    }
}

impl ValueObject for ContentType {}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentType {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentType {
    type Error = EnvelopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for ContentType {
    type Error = EnvelopeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_accepts_absolute_and_relative_references() {
        let absolute = Uri::parse("http://example.com/orders").unwrap();
        assert_eq!(absolute.scheme(), Some("http"));
        assert!(absolute.is_absolute());

        let relative = Uri::parse("/orders/42").unwrap();
        assert!(!relative.is_absolute());
        assert_eq!(relative.as_str(), "/orders/42");
    }

    #[test]
    fn uri_rejects_empty_and_whitespace() {
        assert!(Uri::parse("").unwrap_err().is_validation());
        assert!(Uri::parse("http://a b").is_err());
    }

    #[test]
    fn content_type_exposes_media_type_and_parameters() {
        let ct = ContentType::parse("Application/CloudEvents+JSON; charset=utf-8").unwrap();
        assert_eq!(ct.media_type(), "application/cloudevents+json");
        assert_eq!(ct.parameter("Charset"), Some("utf-8"));
        assert!(ct.is_json());
        assert_eq!(ct.as_str(), "Application/CloudEvents+JSON; charset=utf-8");
    }

    #[test]
    fn content_type_requires_type_and_subtype() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("/plain").is_err());
        assert!(!ContentType::parse("text/plain").unwrap().is_json());
    }

    #[test]
    fn xml_media_types() {
        for xml in ["application/xml", "Text/XML; charset=utf-8", "application/atom+xml"] {
            assert!(ContentType::parse(xml).unwrap().is_xml(), "{xml}");
        }
        assert!(!ContentType::parse("application/json").unwrap().is_xml());
        assert!(!ContentType::parse("application/xml-dtd").unwrap().is_xml());
    }
}
