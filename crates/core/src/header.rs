//! Transport header values.
//!
//! Transports accept a restricted set of header value types: strings,
//! primitives, instants and unique ids. Envelope attributes that carry more
//! structure (`Uri`, `ContentType`) travel as strings and are parsed back on
//! receipt through [`FromHeaderValue`].

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::{format_round_trip, parse_instant};
use crate::value_object::{ContentType, Uri};

/// A single transport header value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    String(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
    Uuid(Uuid),
}

impl HeaderValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read this header as `T`: exact typed match first, then string parse.
    pub fn get<T: FromHeaderValue>(&self) -> Option<T> {
        T::from_typed(self).or_else(|| self.as_str().and_then(T::from_text))
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => f.write_str(s),
            HeaderValue::Int(i) => write!(f, "{i}"),
            HeaderValue::Bool(b) => write!(f, "{b}"),
            HeaderValue::Time(t) => f.write_str(&format_round_trip(t)),
            HeaderValue::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for HeaderValue {
    fn from(value: DateTime<Utc>) -> Self {
        HeaderValue::Time(value)
    }
}

impl From<Uuid> for HeaderValue {
    fn from(value: Uuid) -> Self {
        HeaderValue::Uuid(value)
    }
}

/// Conversion from a header value: typed match, with a textual fallback.
pub trait FromHeaderValue: Sized {
    /// Exact type match (no parsing).
    fn from_typed(value: &HeaderValue) -> Option<Self>;

    /// Parse from the string form of a header.
    fn from_text(text: &str) -> Option<Self>;
}

impl FromHeaderValue for String {
    fn from_typed(value: &HeaderValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FromHeaderValue for DateTime<Utc> {
    fn from_typed(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        parse_instant(text)
    }
}

impl FromHeaderValue for Uuid {
    fn from_typed(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok()
    }
}

impl FromHeaderValue for i64 {
    fn from_typed(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromHeaderValue for bool {
    fn from_typed(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromHeaderValue for Uri {
    fn from_typed(_value: &HeaderValue) -> Option<Self> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        Uri::parse(text).ok()
    }
}

impl FromHeaderValue for ContentType {
    fn from_typed(_value: &HeaderValue) -> Option<Self> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        ContentType::parse(text).ok()
    }
}
