//! `courier-events`: transport-agnostic CloudEvents envelopes.
//!
//! - [`CloudEvent`]: the envelope (attributes + data)
//! - [`BinaryCodec`] / [`StructuredCodec`]: the two wire encodings
//! - [`Binding`]: per-transport header naming (default, AMQP, HTTP, Kafka, MQTT)
//! - [`validator`]: required-attribute rules
//! - [`extensions`]: correlation id, partition key, sequence
//! - [`registry`]: envelope kinds (decode / validate / derive strategies)

pub mod attributes;
pub mod binary;
pub mod binding;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod extensions;
pub mod in_memory_transport;
pub mod message;
pub mod registry;
pub mod structured;
pub mod transport;
pub mod validator;

pub use binary::BinaryCodec;
pub use binding::{
    Binding, MessageRewrite, ProtocolBinding, default_binding, set_default_binding,
};
pub use codec::{Codec, ContentMode, decode_message, encode_message};
pub use config::CodecConfig;
pub use envelope::{CloudEvent, Data};
pub use extensions::{CorrelationExt, Extension, PartitionExt, SequenceExt};
pub use in_memory_transport::InMemoryTransport;
pub use message::{Headers, Message, OutgoingMessage, Payload, ReceivedMessage};
pub use registry::{EnvelopeKind, Registry};
pub use structured::StructuredCodec;
pub use transport::{EventChannel, EventSubscription, PublishError, ReceiveError, Transport};
pub use validator::validate;

pub use courier_core::{ContentType, EnvelopeError, EnvelopeResult, HeaderValue, Uri};
