//! Envelope-kind registry.
//!
//! Each kind (plain, correlated, partitioned, sequenced, or an application
//! defined one) is a tag plus three functions: decode a received message,
//! validate a message's headers, and derive a new envelope from an existing
//! one. Kinds are registered explicitly at startup; looking up a tag that was
//! never registered is an error.
//!
//! The process-wide registry ([`global`]) is pre-populated with the built-in
//! kinds. Registration is idempotent: the first registration of a tag wins.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::debug;

use courier_core::{EnvelopeError, EnvelopeResult};

use crate::binding::{self, Binding};
use crate::codec::decode_message;
use crate::envelope::CloudEvent;
use crate::extensions::{Base, Correlation, Extension, Partition, Sequence};
use crate::message::{Headers, Message, ReceivedMessage};
use crate::validator::{check_event, validate_headers};

pub type DecodeFn = fn(ReceivedMessage, Binding) -> EnvelopeResult<CloudEvent>;
pub type ValidateFn = fn(&mut Headers, Binding) -> EnvelopeResult<()>;
pub type DeriveFn = fn(&CloudEvent) -> CloudEvent;

/// Construction and validation strategy for one envelope kind.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeKind {
    tag: &'static str,
    decode: DecodeFn,
    validate: ValidateFn,
    derive: DeriveFn,
}

impl EnvelopeKind {
    pub fn new(
        tag: &'static str,
        decode: DecodeFn,
        validate: ValidateFn,
        derive: DeriveFn,
    ) -> Self {
        Self {
            tag,
            decode,
            validate,
            derive,
        }
    }

    /// The kind for extension `E`, layered on the base rules.
    pub fn of<E: Extension>() -> Self {
        Self::new(E::KIND, decode_as::<E>, validate_as::<E>, derive_as::<E>)
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn decode(&self, message: ReceivedMessage, binding: Binding) -> EnvelopeResult<CloudEvent> {
        (self.decode)(message, binding)
    }

    pub fn validate(&self, headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
        (self.validate)(headers, binding)
    }

    pub fn derive(&self, source: &CloudEvent) -> CloudEvent {
        (self.derive)(source)
    }
}

/// Decode, then enforce the base and `E`'s envelope rules.
pub fn decode_as<E: Extension>(
    message: ReceivedMessage,
    binding: Binding,
) -> EnvelopeResult<CloudEvent> {
    let mut event = decode_message(message, binding)?;
    check_event(&event)?;
    E::check(&mut event)?;
    Ok(event)
}

/// Base header rules, then `E`'s.
pub fn validate_as<E: Extension>(headers: &mut Headers, binding: Binding) -> EnvelopeResult<()> {
    validate_headers(headers, binding)?;
    E::validate(headers, binding)
}

/// Derive from `source`, then let `E` adjust the copy.
pub fn derive_as<E: Extension>(source: &CloudEvent) -> CloudEvent {
    let mut target = CloudEvent::derive_from(source);
    E::derive(source, &mut target);
    target
}

/// Tag → kind map.
#[derive(Debug, Default)]
pub struct Registry {
    kinds: RwLock<HashMap<&'static str, EnvelopeKind>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the plain, correlated, partitioned and sequenced kinds.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(EnvelopeKind::of::<Base>());
        registry.register(EnvelopeKind::of::<Correlation>());
        registry.register(EnvelopeKind::of::<Partition>());
        registry.register(EnvelopeKind::of::<Sequence>());
        registry
    }

    /// Register `kind`. Returns `false` (and keeps the existing entry) when
    /// the tag is already registered.
    pub fn register(&self, kind: EnvelopeKind) -> bool {
        let mut kinds = self.kinds.write().unwrap_or_else(PoisonError::into_inner);
        if kinds.contains_key(kind.tag) {
            debug!(tag = kind.tag, "envelope kind already registered");
            return false;
        }
        kinds.insert(kind.tag, kind);
        true
    }

    pub fn get(&self, tag: &str) -> EnvelopeResult<EnvelopeKind> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .copied()
            .ok_or_else(|| EnvelopeError::UnknownKind(tag.to_string()))
    }

    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self
            .kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        tags.sort_unstable();
        tags
    }

    pub fn decode(
        &self,
        tag: &str,
        message: ReceivedMessage,
        binding: Option<Binding>,
    ) -> EnvelopeResult<CloudEvent> {
        self.get(tag)?.decode(message, binding::resolve(binding))
    }

    pub fn validate<M>(
        &self,
        tag: &str,
        message: &mut M,
        binding: Option<Binding>,
    ) -> EnvelopeResult<()>
    where
        M: Message + ?Sized,
    {
        self.get(tag)?
            .validate(message.headers_mut(), binding::resolve(binding))
    }

    pub fn derive(&self, tag: &str, source: &CloudEvent) -> EnvelopeResult<CloudEvent> {
        Ok(self.get(tag)?.derive(source))
    }
}

/// The process-wide registry (built-in kinds pre-registered).
pub fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::with_builtins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryCodec;
    use crate::extensions::{CORRELATION_ID, PartitionExt, SequenceExt};
    use courier_core::Uri;

    fn event() -> CloudEvent {
        CloudEvent::with_binding(Binding::Default)
            .with_source(Uri::parse("http://s").unwrap())
            .with_type("T")
    }

    #[test]
    fn builtins_are_registered() {
        assert_eq!(
            Registry::with_builtins().tags(),
            vec!["cloudevent", "correlated", "partitioned", "sequenced"]
        );
        assert!(global().get("partitioned").is_ok());
    }

    #[test]
    fn unknown_tags_are_errors() {
        let err = Registry::new().get("audited").unwrap_err();
        assert!(matches!(err, EnvelopeError::UnknownKind(tag) if tag == "audited"));
    }

    #[test]
    fn first_registration_wins() {
        fn reject(_: &mut Headers, _: Binding) -> EnvelopeResult<()> {
            Err(EnvelopeError::validation("always"))
        }

        let registry = Registry::with_builtins();
        let custom = EnvelopeKind::new("cloudevent", decode_as::<Base>, reject, derive_as::<Base>);
        assert!(!registry.register(custom));

        let mut headers = Headers::from_iter([("source", "http://s"), ("type", "T")]);
        assert!(registry
            .get("cloudevent")
            .unwrap()
            .validate(&mut headers, Binding::Default)
            .is_ok());

        let audited = EnvelopeKind::new("audited", decode_as::<Base>, reject, derive_as::<Base>);
        assert!(registry.register(audited));
        assert!(registry
            .get("audited")
            .unwrap()
            .validate(&mut headers, Binding::Default)
            .is_err());
    }

    #[test]
    fn kinds_layer_extension_rules_on_base_rules() {
        let registry = Registry::with_builtins();

        let mut message = BinaryCodec::new(Binding::Default).encode(&event());
        registry
            .validate("correlated", &mut message, Some(Binding::Default))
            .unwrap();
        assert!(message.headers().contains(CORRELATION_ID));

        let err = registry
            .validate("partitioned", &mut message, Some(Binding::Default))
            .unwrap_err();
        assert!(err.to_string().contains("partitionkey"));
    }

    #[test]
    fn decode_checks_kind_rules() {
        let registry = Registry::with_builtins();
        let message = BinaryCodec::new(Binding::Default).encode(&event());
        assert!(registry
            .decode("partitioned", message.clone().into(), Some(Binding::Default))
            .is_err());

        let decoded = registry
            .decode("correlated", message.into(), Some(Binding::Default))
            .unwrap();
        assert!(decoded.attribute(CORRELATION_ID).is_some());

        let mut keyed = event();
        keyed.set_partition_key("k").unwrap();
        let message = BinaryCodec::new(Binding::Default).encode(&keyed);
        let decoded = registry
            .decode("partitioned", message.into(), Some(Binding::Default))
            .unwrap();
        assert_eq!(decoded.partition_key(), Some("k"));
    }

    #[test]
    fn derive_uses_the_kind() {
        let registry = Registry::with_builtins();
        let mut source = event();
        source.set_integer_sequence(i32::MAX).unwrap();

        let plain = registry.derive("cloudevent", &source).unwrap();
        assert_eq!(plain.sequence(), Some("2147483647"));

        let sequenced = registry.derive("sequenced", &source).unwrap();
        assert_eq!(sequenced.sequence(), Some("-2147483648"));
    }
}
