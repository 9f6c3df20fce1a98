//! Required-attribute rules for envelopes about to be sent or just received.
//!
//! Validation never drops a requirement silently: computable attributes
//! (`id`, `time`) are filled in, the rest (`source`, `type`) must already be
//! present. Extensions layer their own rules on top, see
//! [`crate::extensions::Extension`].

use chrono::{DateTime, Utc};
use tracing::warn;

use courier_core::{EnvelopeError, EnvelopeResult, HeaderValue, format_round_trip, new_event_id};

use crate::attributes::{ID, SOURCE, SPEC_VERSION, SPECVERSION, TIME, TYPE};
use crate::binding::{self, Binding, ProtocolBinding};
use crate::envelope::CloudEvent;
use crate::message::{Headers, Message};

/// Validate a transport message's envelope headers.
///
/// `binding` resolves to the process default when `None`. Validating an
/// already valid message leaves its headers unchanged.
pub fn validate<M>(message: &mut M, binding: Option<Binding>) -> EnvelopeResult<()>
where
    M: Message + ?Sized,
{
    validate_headers(message.headers_mut(), binding::resolve(binding))
}

/// Base rules over a header map.
pub fn validate_headers(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
    let header = |attribute: &str| binding.header_name(attribute).into_owned();

    let name = header(SPECVERSION);
    if let Some(version) = headers.get(&name) {
        if version.as_str() != Some(SPEC_VERSION) {
            return Err(EnvelopeError::validation(format!(
                "invalid '{name}' header value '{version}' (expected '{SPEC_VERSION}')"
            )));
        }
    }

    let name = header(ID);
    if !headers.contains(&name) {
        warn!(header = %name, "message has no id; generating one");
        headers.insert(name, new_event_id());
    }

    let name = header(SOURCE);
    if headers.get_as::<String>(&name).is_none() {
        return Err(EnvelopeError::validation(format!(
            "missing required '{name}' header"
        )));
    }

    let name = header(TYPE);
    if headers.get(&name).is_none_or(|value| value.to_string().is_empty()) {
        return Err(EnvelopeError::validation(format!(
            "missing required '{name}' header"
        )));
    }

    let name = header(TIME);
    if headers.get_as::<DateTime<Utc>>(&name).is_none() {
        warn!(header = %name, "message has no valid time; using the current time");
        let now = Utc::now();
        let value = if binding.native_time_headers() {
            HeaderValue::Time(now)
        } else {
            HeaderValue::String(format_round_trip(&now))
        };
        headers.insert(name, value);
    }

    Ok(())
}

/// Base rules over an envelope: `source` and `type` cannot be computed.
pub fn check_event(event: &CloudEvent) -> EnvelopeResult<()> {
    if event.source().is_none() {
        return Err(EnvelopeError::validation("missing required 'source' attribute"));
    }
    if event.event_type().is_none_or(str::is_empty) {
        return Err(EnvelopeError::validation("missing required 'type' attribute"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryCodec;
    use crate::message::{OutgoingMessage, ReceivedMessage};
    use courier_core::Uri;

    fn valid_headers() -> Headers {
        Headers::from_iter([("source", "http://s"), ("type", "T")])
    }

    #[test]
    fn fills_in_id_and_time() {
        let mut message = OutgoingMessage::new("");
        *message.headers_mut() = valid_headers();

        validate(&mut message, Some(Binding::Default)).unwrap();
        assert!(message.headers().get_as::<String>("id").is_some());
        assert!(message.headers().get_as::<DateTime<Utc>>("time").is_some());
    }

    #[test]
    fn validation_is_idempotent() {
        let mut message = ReceivedMessage::new("", valid_headers());
        validate(&mut message, Some(Binding::Default)).unwrap();
        let first = message.headers().clone();

        validate(&mut message, Some(Binding::Default)).unwrap();
        assert_eq!(message.headers(), &first);
    }

    #[test]
    fn missing_source_or_type_fails() {
        let mut headers = Headers::from_iter([("type", "T")]);
        let err = validate_headers(&mut headers, Binding::Default).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'source'"));

        let mut headers = Headers::from_iter([("ce_source", "http://s")]);
        let err = validate_headers(&mut headers, Binding::Http).unwrap_err();
        assert!(err.to_string().contains("'ce_type'"));
    }

    #[test]
    fn wrong_spec_version_fails() {
        let mut headers = valid_headers();
        headers.insert("specversion", "0.3");
        let err = validate_headers(&mut headers, Binding::Default).unwrap_err();
        assert!(err.to_string().contains("'0.3'"));
    }

    #[test]
    fn amqp_time_is_written_as_an_instant() {
        let mut headers =
            Headers::from_iter([("cloudEvents:source", "http://s"), ("cloudEvents:type", "T")]);
        validate_headers(&mut headers, Binding::Amqp).unwrap();
        assert!(matches!(headers.get("cloudEvents:time"), Some(HeaderValue::Time(_))));
        assert!(headers.contains("cloudEvents:id"));
    }

    #[test]
    fn encoded_envelopes_are_valid() {
        let event = CloudEvent::with_binding(Binding::Kafka)
            .with_source(Uri::parse("http://s").unwrap())
            .with_type("T");
        let mut message = BinaryCodec::new(Binding::Kafka).encode(&event);
        let before = message.headers().clone();

        validate(&mut message, Some(Binding::Kafka)).unwrap();
        assert_eq!(message.headers(), &before);
    }

    #[test]
    fn check_event_requires_source_and_type() {
        let event = CloudEvent::new().with_type("T");
        assert!(check_event(&event).unwrap_err().is_validation());

        let event = event.with_source(Uri::parse("/s").unwrap());
        assert!(check_event(&event).is_ok());
    }
}
