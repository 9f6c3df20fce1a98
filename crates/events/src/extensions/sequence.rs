//! Sequence: position of an event within a producer-defined ordering.

use courier_core::{EnvelopeError, EnvelopeResult};

use super::{Extension, extension_header};
use crate::binding::Binding;
use crate::envelope::CloudEvent;
use crate::message::Headers;

pub const SEQUENCE: &str = "sequence";
pub const SEQUENCE_TYPE: &str = "sequencetype";

/// `sequencetype` value for signed 32-bit integer sequences.
pub const INTEGER_SEQUENCE: &str = "Integer";

/// Typed access to the `sequence` / `sequencetype` attributes.
pub trait SequenceExt {
    fn sequence(&self) -> Option<&str>;

    fn set_sequence(&mut self, sequence: impl Into<String>) -> EnvelopeResult<()>;

    fn sequence_type(&self) -> Option<&str>;

    fn set_sequence_type(&mut self, sequence_type: impl Into<String>) -> EnvelopeResult<()>;

    /// Set an `Integer` sequence.
    fn set_integer_sequence(&mut self, sequence: i32) -> EnvelopeResult<()> {
        self.set_sequence_type(INTEGER_SEQUENCE)?;
        self.set_sequence(sequence.to_string())
    }
}

impl SequenceExt for CloudEvent {
    fn sequence(&self) -> Option<&str> {
        self.attribute(SEQUENCE)
    }

    fn set_sequence(&mut self, sequence: impl Into<String>) -> EnvelopeResult<()> {
        self.set_attribute(SEQUENCE, sequence)
    }

    fn sequence_type(&self) -> Option<&str> {
        self.attribute(SEQUENCE_TYPE)
    }

    fn set_sequence_type(&mut self, sequence_type: impl Into<String>) -> EnvelopeResult<()> {
        self.set_attribute(SEQUENCE_TYPE, sequence_type)
    }
}

fn require_sequence(sequence: Option<&str>, sequence_type: Option<&str>) -> EnvelopeResult<()> {
    let sequence = match sequence {
        Some(sequence) if !sequence.is_empty() => sequence,
        _ => {
            return Err(EnvelopeError::validation(format!(
                "missing required '{SEQUENCE}' attribute"
            )));
        }
    };
    if sequence_type == Some(INTEGER_SEQUENCE) && sequence.parse::<i32>().is_err() {
        return Err(EnvelopeError::validation(format!(
            "'{SEQUENCE}' value '{sequence}' is not a 32-bit integer"
        )));
    }
    Ok(())
}

/// Sequenced envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequence;

impl Extension for Sequence {
    const KIND: &'static str = "sequenced";

    fn validate(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
        let sequence = extension_header(headers, binding, SEQUENCE).map(ToString::to_string);
        let sequence_type =
            extension_header(headers, binding, SEQUENCE_TYPE).map(ToString::to_string);
        require_sequence(sequence.as_deref(), sequence_type.as_deref())
    }

    fn check(event: &mut CloudEvent) -> EnvelopeResult<()> {
        require_sequence(event.sequence(), event.sequence_type())
    }

    /// `Integer` sequences advance by one (wrapping at `i32::MAX`); any other
    /// sequence type leaves the derived envelope without a sequence.
    fn derive(source: &CloudEvent, target: &mut CloudEvent) {
        let next = match (source.sequence_type(), source.sequence()) {
            (Some(INTEGER_SEQUENCE), Some(current)) => current
                .parse::<i32>()
                .ok()
                .map(|current| current.wrapping_add(1)),
            _ => None,
        };
        match next {
            Some(next) => target.insert_attribute(SEQUENCE, next.to_string()),
            None => {
                target.remove_attribute(SEQUENCE);
            }
        }
    }
}
