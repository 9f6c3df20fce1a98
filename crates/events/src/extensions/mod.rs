//! Extension attributes layered on top of the base envelope.
//!
//! Each extension contributes well-known extension attribute(s), a rule that
//! runs after base validation, and optionally an adjustment applied when an
//! envelope is derived from another one.

pub mod correlation;
pub mod partition;
pub mod sequence;

pub use correlation::{CORRELATION_ID, Correlation, CorrelationExt};
pub use partition::{PARTITION_KEY, Partition, PartitionExt};
pub use sequence::{INTEGER_SEQUENCE, SEQUENCE, SEQUENCE_TYPE, Sequence, SequenceExt};

use courier_core::{EnvelopeResult, HeaderValue};

use crate::binding::{Binding, ProtocolBinding};
use crate::envelope::CloudEvent;
use crate::message::Headers;

/// An envelope flavour: extension attribute rules plus a registry tag.
pub trait Extension {
    /// Tag under which the flavour is registered.
    const KIND: &'static str;

    /// Message-level rule, run after the base header rules.
    fn validate(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()>;

    /// Envelope-level rule, run after the base envelope rules.
    fn check(event: &mut CloudEvent) -> EnvelopeResult<()>;

    /// Adjust an envelope derived from `source`.
    fn derive(_source: &CloudEvent, _target: &mut CloudEvent) {}
}

/// The plain envelope (no extension).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base;

impl Extension for Base {
    const KIND: &'static str = "cloudevent";

    fn validate(_headers: &mut Headers, _binding: Binding) -> EnvelopeResult<()> {
        Ok(())
    }

    fn check(_event: &mut CloudEvent) -> EnvelopeResult<()> {
        Ok(())
    }
}

/// Header holding an extension attribute: its own name, or the name the
/// binding's rewrite hook moved it to.
pub(crate) fn extension_header<'h>(
    headers: &'h Headers,
    binding: Binding,
    attribute: &str,
) -> Option<&'h HeaderValue> {
    headers.get(attribute).or_else(|| {
        binding
            .rewriter()
            .and_then(|rewriter| rewriter.header_alias(attribute))
            .and_then(|alias| headers.get(alias))
    })
}
