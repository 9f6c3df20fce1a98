//! Protocol bindings: attribute name ⇄ transport header name.
//!
//! A binding is a pure strategy. The built-in set is closed ([`Binding`]) and
//! each variant dispatches to a strategy type implementing [`ProtocolBinding`].
//! Kafka additionally remaps a few headers on the way in and out; that hook is
//! the separate [`MessageRewrite`] trait, implemented only by [`KafkaBinding`].
//!
//! ## Default binding
//!
//! The process-wide default is **set once, read many**: call
//! [`set_default_binding`] during startup, before any envelope is created or
//! decoded. The first read fixes the value (to [`Binding::Default`] when
//! nothing was set); later `set_default_binding` calls fail.

use std::borrow::Cow;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use courier_core::{EnvelopeError, EnvelopeResult};

use crate::attributes::{self, DATACONTENTTYPE};
use crate::codec::ContentMode;
use crate::envelope::CloudEvent;
use crate::extensions::partition::PARTITION_KEY;
use crate::message::{CONTENT_TYPE, Message, OutgoingMessage, ReceivedMessage};

/// Maps abstract attribute names onto a transport's header convention.
pub trait ProtocolBinding: Send + Sync + core::fmt::Debug {
    /// Short, stable binding name (used in configuration).
    fn name(&self) -> &'static str;

    /// Header carrying `attribute` on this transport.
    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str>;

    /// Attribute carried by `header`, plus whether the header is an envelope
    /// attribute under this binding's naming scheme.
    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool);

    /// Whether the transport has a native timestamp header type.
    fn native_time_headers(&self) -> bool {
        false
    }

    /// Backend-specific rewrite hooks, if any.
    fn rewriter(&self) -> Option<&dyn MessageRewrite> {
        None
    }
}

/// Backend-specific header remapping applied around the codecs.
pub trait MessageRewrite: Send + Sync {
    /// Applied to a freshly encoded message before it is handed to the transport.
    fn rewrite_outgoing(&self, event: &CloudEvent, message: &mut OutgoingMessage);

    /// Applied to a received message before decoding. Returns the framing the
    /// message uses.
    fn rewrite_incoming(&self, message: &mut ReceivedMessage) -> EnvelopeResult<ContentMode>;

    /// Header an extension attribute is moved to on outgoing messages.
    fn header_alias(&self, attribute: &str) -> Option<&'static str>;
}

fn prefixed(prefix: &str, attribute: &str) -> String {
    let mut header = String::with_capacity(prefix.len() + attribute.len());
    header.push_str(prefix);
    header.push_str(attribute);
    header
}

fn strip_prefix<'a>(prefix: &str, header: &'a str) -> (&'a str, bool) {
    match header.strip_prefix(prefix) {
        Some(attribute) => (attribute, true),
        None => (header, false),
    }
}

/// Identity mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinding;

impl ProtocolBinding for DefaultBinding {
    fn name(&self) -> &'static str {
        "default"
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(attribute)
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        (header, attributes::is_well_known(header))
    }
}

/// AMQP application properties: `cloudEvents:<attr>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpBinding;

impl AmqpBinding {
    pub const PREFIX: &'static str = "cloudEvents:";
}

impl ProtocolBinding for AmqpBinding {
    fn name(&self) -> &'static str {
        "amqp"
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        Cow::Owned(prefixed(Self::PREFIX, attribute))
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        strip_prefix(Self::PREFIX, header)
    }

    fn native_time_headers(&self) -> bool {
        true
    }
}

/// HTTP headers: `ce_<attr>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpBinding;

impl HttpBinding {
    pub const PREFIX: &'static str = "ce_";
}

impl ProtocolBinding for HttpBinding {
    fn name(&self) -> &'static str {
        "http"
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        Cow::Owned(prefixed(Self::PREFIX, attribute))
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        strip_prefix(Self::PREFIX, header)
    }
}

/// Kafka record headers: `ce_<attr>`, with the partition key carried as the
/// record key and the data content type as `content-type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaBinding;

impl KafkaBinding {
    pub const PREFIX: &'static str = "ce_";
    pub const KEY_HEADER: &'static str = "Kafka.Key";
}

impl ProtocolBinding for KafkaBinding {
    fn name(&self) -> &'static str {
        "kafka"
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        Cow::Owned(prefixed(Self::PREFIX, attribute))
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        strip_prefix(Self::PREFIX, header)
    }

    fn rewriter(&self) -> Option<&dyn MessageRewrite> {
        Some(self)
    }
}

impl MessageRewrite for KafkaBinding {
    fn rewrite_outgoing(&self, event: &CloudEvent, message: &mut OutgoingMessage) {
        let headers = message.headers_mut();

        headers.remove(PARTITION_KEY);
        if let Some(key) = event.attribute(PARTITION_KEY) {
            headers.insert(Self::KEY_HEADER, key);
        }

        let content_type_header = self.header_name(DATACONTENTTYPE);
        if let Some(content_type) = headers.remove(&content_type_header) {
            headers.insert(CONTENT_TYPE, content_type);
        }
    }

    fn rewrite_incoming(&self, message: &mut ReceivedMessage) -> EnvelopeResult<ContentMode> {
        let headers = message.headers_mut();

        if let Some(key) = headers.remove(Self::KEY_HEADER) {
            headers.insert(PARTITION_KEY, key.to_string());
        }

        let Some(content_type) = headers.get(CONTENT_TYPE).map(ToString::to_string) else {
            return Ok(ContentMode::Binary);
        };

        if is_structured_content_type(&content_type)? {
            debug!(%content_type, "kafka record uses structured mode");
            return Ok(ContentMode::Structured);
        }

        headers.remove(CONTENT_TYPE);
        headers.insert(self.header_name(DATACONTENTTYPE).into_owned(), content_type);
        Ok(ContentMode::Binary)
    }

    fn header_alias(&self, attribute: &str) -> Option<&'static str> {
        (attribute == PARTITION_KEY).then_some(Self::KEY_HEADER)
    }
}

/// Whether a content type announces a structured-mode CloudEvent.
///
/// Fails for `application/cloudevents` media types without a `+json` suffix:
/// no other structured format is supported.
pub fn is_structured_content_type(content_type: &str) -> EnvelopeResult<bool> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !media_type.starts_with("application/cloudevents") {
        return Ok(false);
    }
    if !media_type.ends_with("+json") {
        return Err(EnvelopeError::unsupported_media_type(content_type));
    }
    // Batch framing shares the prefix but is not a single envelope.
    if media_type.starts_with("application/cloudevents-batch") {
        return Err(EnvelopeError::unsupported_media_type(content_type));
    }
    Ok(true)
}

/// MQTT user properties: identity mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqttBinding;

impl ProtocolBinding for MqttBinding {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(attribute)
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        (header, attributes::is_well_known(header))
    }
}

/// The closed set of built-in bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    #[default]
    Default,
    Amqp,
    Http,
    Kafka,
    Mqtt,
}

impl Binding {
    pub const ALL: [Binding; 5] = [
        Binding::Default,
        Binding::Amqp,
        Binding::Http,
        Binding::Kafka,
        Binding::Mqtt,
    ];

    /// The strategy object behind this variant.
    pub fn strategy(self) -> &'static dyn ProtocolBinding {
        match self {
            Binding::Default => &DefaultBinding,
            Binding::Amqp => &AmqpBinding,
            Binding::Http => &HttpBinding,
            Binding::Kafka => &KafkaBinding,
            Binding::Mqtt => &MqttBinding,
        }
    }
}

impl ProtocolBinding for Binding {
    fn name(&self) -> &'static str {
        self.strategy().name()
    }

    fn header_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        self.strategy().header_name(attribute)
    }

    fn attribute_name<'a>(&self, header: &'a str) -> (&'a str, bool) {
        self.strategy().attribute_name(header)
    }

    fn native_time_headers(&self) -> bool {
        self.strategy().native_time_headers()
    }

    fn rewriter(&self) -> Option<&dyn MessageRewrite> {
        self.strategy().rewriter()
    }
}

impl core::fmt::Display for Binding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Binding {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Binding::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnvelopeError::UnknownBinding(s.to_string()))
    }
}

static DEFAULT_BINDING: OnceLock<Binding> = OnceLock::new();

/// The process-wide default binding (fixed on first read).
pub fn default_binding() -> Binding {
    *DEFAULT_BINDING.get_or_init(Binding::default)
}

/// Fix the process-wide default binding. Allowed once, before the first read.
pub fn set_default_binding(binding: Binding) -> EnvelopeResult<()> {
    DEFAULT_BINDING
        .set(binding)
        .map_err(|_| EnvelopeError::DefaultBindingAlreadySet)
}

/// Resolve an optional binding against the process default.
pub fn resolve(binding: Option<Binding>) -> Binding {
    binding.unwrap_or_else(default_binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Headers;

    #[test]
    fn header_name_table() {
        assert_eq!(Binding::Kafka.header_name("source"), "ce_source");
        assert_eq!(Binding::Http.header_name("source"), "ce_source");
        assert_eq!(Binding::Amqp.header_name("source"), "cloudEvents:source");
        assert_eq!(Binding::Mqtt.header_name("source"), "source");
        assert_eq!(Binding::Default.header_name("source"), "source");
    }

    #[test]
    fn identity_bindings_return_the_same_string() {
        let attribute: &str = "x";
        for binding in [Binding::Default, Binding::Mqtt] {
            match binding.header_name(attribute) {
                Cow::Borrowed(header) => assert!(core::ptr::eq(header, attribute)),
                Cow::Owned(_) => panic!("{binding} allocated a new header name"),
            }
        }
    }

    #[test]
    fn attribute_name_strips_prefixes() {
        assert_eq!(Binding::Amqp.attribute_name("cloudEvents:type"), ("type", true));
        assert_eq!(Binding::Http.attribute_name("ce_correlationid"), ("correlationid", true));
        assert_eq!(Binding::Kafka.attribute_name("traceparent"), ("traceparent", false));
        assert_eq!(Binding::Default.attribute_name("type"), ("type", true));
        assert_eq!(Binding::Default.attribute_name("custom"), ("custom", false));
    }

    #[test]
    fn prefixes_are_case_sensitive() {
        assert_eq!(Binding::Amqp.attribute_name("cloudevents:type"), ("cloudevents:type", false));
        assert_eq!(Binding::Http.attribute_name("CE_type"), ("CE_type", false));
    }

    #[test]
    fn only_kafka_rewrites() {
        for binding in Binding::ALL {
            assert_eq!(binding.rewriter().is_some(), binding == Binding::Kafka);
        }
        assert!(Binding::Amqp.native_time_headers());
        assert!(!Binding::Kafka.native_time_headers());
    }

    #[test]
    fn binding_names_parse() {
        assert_eq!("Kafka".parse::<Binding>().unwrap(), Binding::Kafka);
        assert_eq!(" amqp ".parse::<Binding>().unwrap(), Binding::Amqp);
        assert!(matches!(
            "nats".parse::<Binding>(),
            Err(EnvelopeError::UnknownBinding(name)) if name == "nats"
        ));
    }

    #[test]
    fn kafka_incoming_rewrite_restores_attributes() {
        let mut message = ReceivedMessage::new(
            "hello",
            Headers::from_iter([
                (KafkaBinding::KEY_HEADER, "customer-42"),
                (CONTENT_TYPE, "text/plain"),
            ]),
        );

        let mode = KafkaBinding.rewrite_incoming(&mut message).unwrap();
        assert_eq!(mode, ContentMode::Binary);
        assert_eq!(message.header::<String>(PARTITION_KEY).as_deref(), Some("customer-42"));
        assert_eq!(message.header::<String>("ce_datacontenttype").as_deref(), Some("text/plain"));
        assert!(message.headers().get(CONTENT_TYPE).is_none());
        assert!(message.headers().get(KafkaBinding::KEY_HEADER).is_none());
    }

    #[test]
    fn kafka_detects_structured_mode() {
        let mut message = ReceivedMessage::new(
            "{}",
            Headers::from_iter([(CONTENT_TYPE, "application/cloudevents+json; charset=utf-8")]),
        );
        assert_eq!(
            KafkaBinding.rewrite_incoming(&mut message).unwrap(),
            ContentMode::Structured
        );
        assert!(message.headers().get(CONTENT_TYPE).is_some());
    }

    #[test]
    fn kafka_rejects_non_json_structured_mode() {
        let mut message = ReceivedMessage::new(
            "",
            Headers::from_iter([(CONTENT_TYPE, "application/cloudevents+avro")]),
        );
        assert!(matches!(
            KafkaBinding.rewrite_incoming(&mut message),
            Err(EnvelopeError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn default_binding_is_fixed_after_first_read() {
        let first = default_binding();
        assert_eq!(default_binding(), first);
        assert!(matches!(
            set_default_binding(Binding::Kafka),
            Err(EnvelopeError::DefaultBindingAlreadySet)
        ));
        assert_eq!(resolve(Some(Binding::Http)), Binding::Http);
        assert_eq!(resolve(None), first);
    }
}
