//! Envelope-level messaging over a transport.
//!
//! A [`Transport`] moves raw messages. An [`EventChannel`] puts envelopes on
//! it through a [`Codec`] and hands decoded envelopes back to its
//! subscribers. Delivery guarantees, acknowledgement and connection lifecycle
//! stay with the transport; consumers must tolerate duplicates.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use courier_core::{EnvelopeError, EnvelopeResult};

use crate::codec::{Codec, ContentMode};
use crate::envelope::CloudEvent;
use crate::message::{OutgoingMessage, ReceivedMessage};
use crate::registry::{self, EnvelopeKind};
use crate::validator::{check_event, validate};

/// Raw send/subscribe contract of a message transport.
///
/// Implementations must be safe to share across threads; several producers
/// may send concurrently.
pub trait Transport: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn send(&self, message: OutgoingMessage) -> Result<(), Self::Error>;

    /// Every message sent after this call, in send order.
    fn subscribe(&self) -> Receiver<ReceivedMessage>;
}

#[derive(Debug, Error)]
pub enum PublishError<E: core::fmt::Debug> {
    /// The envelope is incomplete or could not be encoded.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("transport rejected the message: {0:?}")]
    Transport(E),
}

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("no message within {0:?}")]
    Timeout(Duration),

    /// The transport went away; no further messages will arrive.
    #[error("transport closed")]
    Closed,

    /// A message arrived but is not a valid envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// A transport paired with the codec used on both ends.
#[derive(Debug)]
pub struct EventChannel<T> {
    transport: T,
    codec: Codec,
}

impl<T: Transport> EventChannel<T> {
    pub fn new(transport: T, codec: Codec) -> Self {
        Self { transport, codec }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Encode `event` and send it.
    ///
    /// `source` and `type` must be set. Binary-mode messages also pass the
    /// header validator for the channel's binding before they are sent.
    pub fn publish(&self, event: &CloudEvent) -> Result<(), PublishError<T::Error>> {
        check_event(event)?;
        let config = self.codec.config();
        let mut message = self.codec.encode(event)?;
        if config.mode == ContentMode::Binary {
            validate(&mut message, Some(config.binding))?;
        }

        debug!(id = event.id(), binding = %config.binding, mode = %config.mode, "publishing event");
        self.transport.send(message).map_err(PublishError::Transport)
    }

    /// Envelopes published after this call, decoded with the channel's codec.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.transport.subscribe(),
            codec: self.codec,
            kind: None,
        }
    }

    /// Like [`EventChannel::subscribe`], but every envelope must also satisfy
    /// the rules of the registered kind `tag`.
    pub fn subscribe_kind(&self, tag: &str) -> EnvelopeResult<EventSubscription> {
        let kind = registry::global().get(tag)?;
        Ok(EventSubscription {
            kind: Some(kind),
            ..self.subscribe()
        })
    }
}

/// Decoding end of an [`EventChannel`]. Meant for a single consuming thread.
///
/// A message that fails to decode is consumed and reported as
/// [`ReceiveError::Envelope`]; the next call moves on to the next message.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: Receiver<ReceivedMessage>,
    codec: Codec,
    kind: Option<EnvelopeKind>,
}

impl EventSubscription {
    /// The next envelope if one is already waiting.
    pub fn try_next(&self) -> Result<Option<CloudEvent>, ReceiveError> {
        match self.receiver.try_recv() {
            Ok(message) => self.decode(message).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ReceiveError::Closed),
        }
    }

    /// Block for up to `timeout` waiting for the next envelope.
    pub fn next_timeout(&self, timeout: Duration) -> Result<CloudEvent, ReceiveError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => self.decode(message),
            Err(RecvTimeoutError::Timeout) => Err(ReceiveError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ReceiveError::Closed),
        }
    }

    fn decode(&self, message: ReceivedMessage) -> Result<CloudEvent, ReceiveError> {
        let event = match self.kind {
            Some(kind) => kind.decode(message, self.codec.config().binding)?,
            None => self.codec.decode(message)?,
        };
        Ok(event)
    }
}
