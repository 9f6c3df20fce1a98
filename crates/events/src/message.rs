//! Transport message boundary.
//!
//! The transport itself (network I/O, acknowledgement) lives outside this
//! crate. What the codecs need from it is modelled here: a sendable message
//! with a payload and a restricted header map, and a received message with
//! typed header lookup and string/binary payload views.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

use courier_core::HeaderValue;
use courier_core::header::FromHeaderValue;

/// Header announcing the payload's content type.
pub const CONTENT_TYPE: &str = "content-type";

/// Transport header map (name → typed value).
///
/// Names are case-sensitive; use [`Headers::get_ignore_case`] for transports
/// with case-insensitive header names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, HeaderValue>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(name)
    }

    /// Typed lookup: exact type match first, then string parse.
    pub fn get_as<T: FromHeaderValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(HeaderValue::get)
    }

    pub fn get_ignore_case(&self, name: &str) -> Option<(&str, &HeaderValue)> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Message payload as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// String view (binary payloads are decoded as lossy UTF-8).
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Payload::Text(s) => Cow::Borrowed(s),
            Payload::Binary(b) => String::from_utf8_lossy(b),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Text(String::new())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(value)
    }
}

/// Anything with a transport header map (validation works on both sides).
pub trait Message {
    fn headers(&self) -> &Headers;
    fn headers_mut(&mut self) -> &mut Headers;
}

/// A message ready to hand to a transport sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutgoingMessage {
    payload: Payload,
    headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    compress: bool,
}

impl OutgoingMessage {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn priority(&self) -> Option<u8> {
        self.priority
    }

    pub fn compress(&self) -> bool {
        self.compress
    }
}

impl Message for OutgoingMessage {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

/// A message handed over by a transport receiver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedMessage {
    payload: Payload,
    headers: Headers,
}

impl ReceivedMessage {
    pub fn new(payload: impl Into<Payload>, headers: Headers) -> Self {
        Self {
            payload: payload.into(),
            headers,
        }
    }

    /// Typed header lookup: exact type match first, then string parse.
    pub fn header<T: FromHeaderValue>(&self, name: &str) -> Option<T> {
        self.headers.get_as(name)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.payload.as_text()
    }

    pub fn bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }
}

impl Message for ReceivedMessage {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

/// Loopback conversion: what a receiver would see for a sent message.
impl From<OutgoingMessage> for ReceivedMessage {
    fn from(message: OutgoingMessage) -> Self {
        Self {
            payload: message.payload,
            headers: message.headers,
        }
    }
}
