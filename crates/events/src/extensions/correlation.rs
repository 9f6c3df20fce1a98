//! Correlation id: ties related events together across services.

use tracing::warn;

use courier_core::{EnvelopeError, EnvelopeResult, new_event_id};

use super::{Extension, extension_header};
use crate::binding::Binding;
use crate::envelope::CloudEvent;
use crate::message::Headers;

pub const CORRELATION_ID: &str = "correlationid";

/// Typed access to the `correlationid` attribute.
pub trait CorrelationExt {
    /// Current correlation id; a fresh one is generated and kept if unset.
    fn correlation_id(&mut self) -> &str;

    fn set_correlation_id(&mut self, id: impl Into<String>) -> EnvelopeResult<()>;
}

impl CorrelationExt for CloudEvent {
    fn correlation_id(&mut self) -> &str {
        self.attribute_or_insert_with(CORRELATION_ID, new_event_id)
    }

    fn set_correlation_id(&mut self, id: impl Into<String>) -> EnvelopeResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(EnvelopeError::InvalidArgument("correlation id"));
        }
        self.set_attribute(CORRELATION_ID, id)
    }
}

/// Correlated envelopes. A missing correlation id is generated, never fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Correlation;

impl Extension for Correlation {
    const KIND: &'static str = "correlated";

    fn validate(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
        let present = extension_header(headers, binding, CORRELATION_ID)
            .is_some_and(|value| !value.to_string().is_empty());
        if !present {
            warn!("message has no correlation id; generating one");
            headers.insert(CORRELATION_ID, new_event_id());
        }
        Ok(())
    }

    fn check(event: &mut CloudEvent) -> EnvelopeResult<()> {
        if event.attribute(CORRELATION_ID).is_some_and(str::is_empty) {
            event.remove_attribute(CORRELATION_ID);
        }
        event.correlation_id();
        Ok(())
    }
}
