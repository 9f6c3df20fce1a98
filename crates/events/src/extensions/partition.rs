//! Partition key: routes related events to the same consumer partition.

use courier_core::{EnvelopeError, EnvelopeResult};

use super::{Extension, extension_header};
use crate::binding::Binding;
use crate::envelope::CloudEvent;
use crate::message::Headers;

pub const PARTITION_KEY: &str = "partitionkey";

/// Typed access to the `partitionkey` attribute.
pub trait PartitionExt {
    fn partition_key(&self) -> Option<&str>;

    fn set_partition_key(&mut self, key: impl Into<String>) -> EnvelopeResult<()>;
}

impl PartitionExt for CloudEvent {
    fn partition_key(&self) -> Option<&str> {
        self.attribute(PARTITION_KEY)
    }

    fn set_partition_key(&mut self, key: impl Into<String>) -> EnvelopeResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(EnvelopeError::InvalidArgument("partition key"));
        }
        self.set_attribute(PARTITION_KEY, key)
    }
}

fn require_key(key: Option<&str>) -> EnvelopeResult<()> {
    match key {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(EnvelopeError::validation(format!(
            "missing required '{PARTITION_KEY}' attribute"
        ))),
    }
}

/// Partitioned envelopes. The key cannot be generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Partition;

impl Extension for Partition {
    const KIND: &'static str = "partitioned";

    fn validate(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
        let key = extension_header(headers, binding, PARTITION_KEY).map(ToString::to_string);
        require_key(key.as_deref())
    }

    fn check(event: &mut CloudEvent) -> EnvelopeResult<()> {
        require_key(event.partition_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::KafkaBinding;

    #[test]
    fn missing_or_empty_key_fails_validation() {
        let mut headers = Headers::new();
        assert!(Partition::validate(&mut headers, Binding::Default)
            .unwrap_err()
            .is_validation());

        headers.insert(PARTITION_KEY, "");
        assert!(Partition::validate(&mut headers, Binding::Default).is_err());

        headers.insert(PARTITION_KEY, "customer-1");
        assert!(Partition::validate(&mut headers, Binding::Default).is_ok());
    }

    #[test]
    fn kafka_key_header_counts_as_the_partition_key() {
        let mut headers = Headers::from_iter([(KafkaBinding::KEY_HEADER, "customer-1")]);
        assert!(Partition::validate(&mut headers, Binding::Kafka).is_ok());
        assert!(Partition::validate(&mut headers, Binding::Http).is_err());
    }

    #[test]
    fn envelope_accessors() {
        let mut event = CloudEvent::new();
        assert!(Partition::check(&mut event).is_err());
        assert!(event.set_partition_key("").is_err());

        event.set_partition_key("customer-1").unwrap();
        assert_eq!(event.partition_key(), Some("customer-1"));
        assert!(Partition::check(&mut event).is_ok());
    }
}
