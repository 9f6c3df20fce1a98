//! Content-mode dispatch: picks the binary or structured codec and applies
//! the binding's rewrite hooks around it.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use courier_core::{EnvelopeError, EnvelopeResult};

use crate::binary::BinaryCodec;
use crate::binding::{Binding, ProtocolBinding, is_structured_content_type};
use crate::config::CodecConfig;
use crate::envelope::CloudEvent;
use crate::message::{CONTENT_TYPE, Headers, Message, OutgoingMessage, ReceivedMessage};
use crate::structured::{STRUCTURED_CONTENT_TYPE, StructuredCodec};

/// How an envelope is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Attributes as headers, data as the payload.
    #[default]
    Binary,
    /// The whole envelope as one JSON document.
    Structured,
}

impl core::fmt::Display for ContentMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ContentMode::Binary => f.write_str("binary"),
            ContentMode::Structured => f.write_str("structured"),
        }
    }
}

impl core::str::FromStr for ContentMode {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(ContentMode::Binary),
            "structured" => Ok(ContentMode::Structured),
            other => Err(EnvelopeError::config(format!("unknown content mode '{other}'"))),
        }
    }
}

/// Framing announced by a message's `content-type` header.
pub fn detect_mode(headers: &Headers) -> EnvelopeResult<ContentMode> {
    let Some((_, content_type)) = headers.get_ignore_case(CONTENT_TYPE) else {
        return Ok(ContentMode::Binary);
    };
    if is_structured_content_type(&content_type.to_string())? {
        Ok(ContentMode::Structured)
    } else {
        Ok(ContentMode::Binary)
    }
}

/// Render `event` as a transport message according to `config`.
#[instrument(skip_all, fields(binding = %config.binding, mode = %config.mode), err)]
pub fn encode_message(event: &CloudEvent, config: &CodecConfig) -> EnvelopeResult<OutgoingMessage> {
    let binding = config.binding;
    let mut message = match config.mode {
        ContentMode::Binary => BinaryCodec::new(binding).encode(event),
        ContentMode::Structured => {
            let json = StructuredCodec::new(binding)
                .pretty(config.pretty)
                .encode(event)?;
            OutgoingMessage::new(json).with_header(CONTENT_TYPE, STRUCTURED_CONTENT_TYPE)
        }
    };

    if let Some(rewriter) = binding.rewriter() {
        rewriter.rewrite_outgoing(event, &mut message);
    }
    Ok(message)
}

/// Rebuild an envelope from a received message.
///
/// The binding's incoming rewrite hook (or, without one, the `content-type`
/// header) decides between the binary and structured codec.
#[instrument(skip_all, fields(binding = %binding), err)]
pub fn decode_message(
    mut message: ReceivedMessage,
    binding: Binding,
) -> EnvelopeResult<CloudEvent> {
    let mode = match binding.rewriter() {
        Some(rewriter) => rewriter.rewrite_incoming(&mut message)?,
        None => detect_mode(message.headers())?,
    };

    match mode {
        ContentMode::Binary => BinaryCodec::new(binding).decode(&message),
        ContentMode::Structured => StructuredCodec::new(binding).decode(&message.text()),
    }
}

/// Encoder/decoder pair bound to one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, event: &CloudEvent) -> EnvelopeResult<OutgoingMessage> {
        encode_message(event, &self.config)
    }

    pub fn decode(&self, message: ReceivedMessage) -> EnvelopeResult<CloudEvent> {
        decode_message(message, self.config.binding)
    }
}
