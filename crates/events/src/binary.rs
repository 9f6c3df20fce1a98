//! Binary-mode codec: attributes as transport headers, data as the payload.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use courier_core::header::FromHeaderValue;
use courier_core::{
    ContentType, EnvelopeError, EnvelopeResult, HeaderValue, Uri, format_round_trip,
};

use crate::attributes::{
    self, DATACONTENTTYPE, DATASCHEMA, ID, SOURCE, SPEC_VERSION, SPECVERSION, SUBJECT, TIME, TYPE,
};
use crate::binding::{Binding, ProtocolBinding, default_binding};
use crate::envelope::{CloudEvent, Data};
use crate::message::{Message, OutgoingMessage, Payload, ReceivedMessage};

/// Projects envelopes onto transport headers + raw payload and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryCodec {
    binding: Binding,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new(default_binding())
    }
}

impl BinaryCodec {
    pub fn new(binding: Binding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// Render `event` as a transport message.
    ///
    /// Unset optional attributes are omitted; `specversion` is always written
    /// and `id`/`time` are defaulted if they were never read or set. Extension
    /// attributes keep their own names (they are not re-bound) and never
    /// replace a header already written for a well-known attribute. An absent
    /// payload becomes the empty string.
    pub fn encode(&self, event: &CloudEvent) -> OutgoingMessage {
        let binding = self.binding;
        let header = |attribute: &str| binding.header_name(attribute).into_owned();

        let payload = match event.data() {
            Some(Data::String(s)) => Payload::Text(s.clone()),
            Some(Data::Binary(b)) => Payload::Binary(b.clone()),
            None => Payload::default(),
        };

        let mut message = OutgoingMessage::new(payload);
        let headers = message.headers_mut();

        headers.insert(header(ID), event.id());
        if let Some(source) = event.source() {
            headers.insert(header(SOURCE), source.as_str());
        }
        headers.insert(header(SPECVERSION), SPEC_VERSION);
        if let Some(event_type) = event.event_type() {
            headers.insert(header(TYPE), event_type);
        }
        if let Some(content_type) = event.data_content_type() {
            headers.insert(header(DATACONTENTTYPE), content_type.as_str());
        }
        if let Some(schema) = event.data_schema() {
            headers.insert(header(DATASCHEMA), schema.as_str());
        }
        if let Some(subject) = event.subject() {
            headers.insert(header(SUBJECT), subject);
        }

        let time = event.time();
        let time = if binding.native_time_headers() {
            HeaderValue::Time(time)
        } else {
            HeaderValue::String(format_round_trip(&time))
        };
        headers.insert(header(TIME), time);

        for (name, value) in event.attributes() {
            if headers.contains(name) {
                warn!(header = %name, "extension attribute shadows an envelope header; skipped");
                continue;
            }
            headers.insert(name.as_str(), value.as_str());
        }

        debug!(
            binding = %binding,
            headers = message.headers().len(),
            "encoded binary-mode message"
        );
        message
    }

    /// Rebuild an envelope from a binary-mode message.
    ///
    /// Well-known attributes are looked up under the binding's header names
    /// (typed value first, then string parse); a present but unparsable value
    /// is a validation error. Text attributes (`id`, `type`, `subject`) also
    /// accept non-string headers through their display form.
    ///
    /// Every other header is copied verbatim into the extension attributes,
    /// except headers whose own name is a reserved attribute name. Under a
    /// prefixing binding a bare `id` or `type` header is not the envelope's
    /// attribute and cannot be an extension either, so it is dropped.
    pub fn decode(&self, message: &ReceivedMessage) -> EnvelopeResult<CloudEvent> {
        let binding = self.binding;
        let headers = message.headers();
        let mut event = CloudEvent::with_binding(binding);

        if let Some(version) = headers.get(&binding.header_name(SPECVERSION)) {
            let version = version.to_string();
            if version != SPEC_VERSION {
                return Err(EnvelopeError::validation(format!(
                    "unsupported specversion '{version}' (expected '{SPEC_VERSION}')"
                )));
            }
        }

        if let Some(id) = self.text_attribute(message, ID) {
            event
                .set_id(id)
                .map_err(|_| EnvelopeError::validation("'id' header must not be empty"))?;
        }
        if let Some(source) = self.attribute::<Uri>(message, SOURCE)? {
            event.set_source(source);
        }
        if let Some(event_type) = self.text_attribute(message, TYPE) {
            event.set_event_type(event_type);
        }
        if let Some(content_type) = self.attribute::<ContentType>(message, DATACONTENTTYPE)? {
            event.set_data_content_type(Some(content_type));
        }
        if let Some(schema) = self.attribute::<Uri>(message, DATASCHEMA)? {
            event.set_data_schema(Some(schema));
        }
        if let Some(subject) = self.text_attribute(message, SUBJECT) {
            event.set_subject(Some(subject));
        }
        if let Some(time) = self.attribute::<DateTime<Utc>>(message, TIME)? {
            event.set_time(time);
        }

        for (name, value) in headers.iter() {
            let (attribute, is_envelope_attribute) = binding.attribute_name(name);
            if is_envelope_attribute && attributes::is_well_known(attribute) {
                continue;
            }
            if attributes::is_reserved(name) {
                debug!(header = name, "skipping reserved header name");
                continue;
            }
            event.set_attribute(name, value.to_string())?;
        }

        match message.payload() {
            Payload::Text(s) => event.set_data(s.as_str()),
            Payload::Binary(b) => event.set_data(b.as_slice()),
        }

        debug!(
            binding = %binding,
            attributes = event.attributes().len(),
            "decoded binary-mode message"
        );
        Ok(event)
    }

    fn text_attribute(&self, message: &ReceivedMessage, attribute: &str) -> Option<String> {
        let header = self.binding.header_name(attribute);
        message.headers().get(&header).map(ToString::to_string)
    }

    fn attribute<T: FromHeaderValue>(
        &self,
        message: &ReceivedMessage,
        attribute: &str,
    ) -> EnvelopeResult<Option<T>> {
        let header = self.binding.header_name(attribute);
        match message.headers().get(&header) {
            None => Ok(None),
            Some(value) => value.get::<T>().map(Some).ok_or_else(|| {
                EnvelopeError::validation(format!("invalid value '{value}' for '{header}' header"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Headers;
    use chrono::TimeZone;

    fn event() -> CloudEvent {
        let mut event = CloudEvent::with_binding(Binding::Default)
            .with_source(Uri::parse("http://s").unwrap())
            .with_type("T");
        event.set_id("MyId").unwrap();
        event
    }

    #[test]
    fn encodes_empty_payload_and_spec_version() {
        let message = BinaryCodec::new(Binding::Default).encode(&event());

        assert_eq!(message.payload(), &Payload::Text(String::new()));
        let headers = message.headers();
        assert_eq!(headers.get("specversion"), Some(&HeaderValue::from("1.0")));
        assert_eq!(headers.get("id"), Some(&HeaderValue::from("MyId")));
        assert_eq!(headers.get("source"), Some(&HeaderValue::from("http://s")));
        assert!(headers.get("subject").is_none());
        assert!(headers.get("time").is_some());

        let decoded = BinaryCodec::new(Binding::Default)
            .decode(&ReceivedMessage::from(message))
            .unwrap();
        assert_eq!(decoded.source().map(Uri::as_str), Some("http://s"));
        assert_eq!(decoded.id(), "MyId");
    }

    #[test]
    fn headers_follow_the_binding() {
        let message = BinaryCodec::new(Binding::Amqp).encode(&event());
        assert!(message.headers().contains("cloudEvents:source"));
        assert!(matches!(
            message.headers().get("cloudEvents:time"),
            Some(HeaderValue::Time(_))
        ));

        let message = BinaryCodec::new(Binding::Http).encode(&event());
        assert!(message.headers().contains("ce_type"));
        assert!(matches!(
            message.headers().get("ce_time"),
            Some(HeaderValue::String(_))
        ));
    }

    #[test]
    fn extension_attributes_are_written_verbatim() {
        let mut event = event();
        event.set_attribute("correlationid", "c-1").unwrap();

        let message = BinaryCodec::new(Binding::Http).encode(&event);
        assert_eq!(message.headers().get_as::<String>("correlationid").as_deref(), Some("c-1"));
        assert!(!message.headers().contains("ce_correlationid"));

        let decoded = BinaryCodec::new(Binding::Http)
            .decode(&ReceivedMessage::from(message))
            .unwrap();
        assert_eq!(decoded.attribute("correlationid"), Some("c-1"));
        assert_eq!(decoded.attributes().len(), 1);
    }

    #[test]
    fn binary_payload_round_trips() {
        let codec = BinaryCodec::new(Binding::Mqtt);
        let message = codec.encode(&event().with_data(vec![0u8, 159, 146, 150]));
        assert!(message.payload().is_binary());

        let decoded = codec.decode(&ReceivedMessage::from(message)).unwrap();
        assert_eq!(decoded.data(), Some(&Data::Binary(vec![0, 159, 146, 150])));
    }

    #[test]
    fn decode_reads_typed_and_string_headers() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let headers = Headers::from_iter([
            ("cloudEvents:id", HeaderValue::from("abc")),
            ("cloudEvents:source", HeaderValue::from("/sensors/1")),
            ("cloudEvents:type", HeaderValue::from("reading")),
            ("cloudEvents:time", HeaderValue::Time(instant)),
            ("cloudEvents:datacontenttype", HeaderValue::from("application/json")),
            ("x-retry", HeaderValue::Int(3)),
        ]);
        let event = BinaryCodec::new(Binding::Amqp)
            .decode(&ReceivedMessage::new("{}", headers))
            .unwrap();

        assert_eq!(event.time(), instant);
        assert_eq!(event.source().map(Uri::as_str), Some("/sensors/1"));
        assert_eq!(
            event.data_content_type().map(ContentType::as_str),
            Some("application/json")
        );
        assert_eq!(event.attribute("x-retry"), Some("3"));
        assert!(!event.attributes().contains_key("cloudEvents:type"));
    }

    #[test]
    fn absent_attributes_stay_unset() {
        let event = BinaryCodec::new(Binding::Default)
            .decode(&ReceivedMessage::new("", Headers::new()))
            .unwrap();
        assert!(event.source().is_none());
        assert!(event.event_type().is_none());
        assert!(!event.has_id());
        assert!(!event.has_time());
    }

    #[test]
    fn wrong_spec_version_fails() {
        let headers = Headers::from_iter([("specversion", "0.3")]);
        let err = BinaryCodec::new(Binding::Default)
            .decode(&ReceivedMessage::new("", headers))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("0.3"));
    }

    #[test]
    fn unparsable_well_known_values_fail() {
        let headers = Headers::from_iter([("time", "last tuesday")]);
        let err = BinaryCodec::new(Binding::Default)
            .decode(&ReceivedMessage::new("", headers))
            .unwrap_err();
        assert!(err.to_string().contains("'time' header"));
    }

    #[test]
    fn extensions_cannot_replace_binding_headers() {
        let mut http = event();
        http.set_attribute("ce_type", "Hijacked").unwrap();
        let codec = BinaryCodec::new(Binding::Http);
        let message = codec.encode(&http);
        assert_eq!(message.headers().get("ce_type"), Some(&HeaderValue::from("T")));
        let decoded = codec.decode(&ReceivedMessage::from(message)).unwrap();
        assert_eq!(decoded.event_type(), Some("T"));

        let mut amqp = event();
        amqp.set_attribute("cloudEvents:source", "http://elsewhere").unwrap();
        let codec = BinaryCodec::new(Binding::Amqp);
        let decoded = codec.decode(&ReceivedMessage::from(codec.encode(&amqp))).unwrap();
        assert_eq!(decoded.source().map(Uri::as_str), Some("http://s"));
    }

    #[test]
    fn text_attributes_accept_non_string_headers() {
        let id = uuid::Uuid::nil();
        let mut headers = Headers::from_iter([
            ("id", HeaderValue::Uuid(id)),
            ("source", HeaderValue::from("http://s")),
            ("type", HeaderValue::from("T")),
            ("subject", HeaderValue::Int(42)),
        ]);
        crate::validator::validate_headers(&mut headers, Binding::Default).unwrap();

        let event = BinaryCodec::new(Binding::Default)
            .decode(&ReceivedMessage::new("", headers))
            .unwrap();
        assert_eq!(event.id(), id.to_string());
        assert_eq!(event.subject(), Some("42"));
    }

    #[test]
    fn bare_reserved_headers_are_dropped_under_prefixing_bindings() {
        let headers = Headers::from_iter([
            ("ce_source", "http://s"),
            ("ce_type", "T"),
            ("type", "stray"),
        ]);
        let event = BinaryCodec::new(Binding::Http)
            .decode(&ReceivedMessage::new("", headers))
            .unwrap();
        assert_eq!(event.event_type(), Some("T"));
        assert!(event.attributes().is_empty());
    }
}
