//! In-memory loopback transport for tests and local tooling.

use std::sync::{Mutex, mpsc};

use thiserror::Error;
use tracing::trace;

use crate::message::{OutgoingMessage, ReceivedMessage};
use crate::transport::Transport;

#[derive(Debug, Error)]
pub enum InMemoryTransportError {
    /// Send failed due to internal lock poisoning.
    #[error("transport lock poisoned")]
    Poisoned,
}

/// In-memory fan-out transport.
///
/// - No IO / no async
/// - Every subscriber receives what a real receiver would see for each sent
///   message (payload and headers, no transport-only options)
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    subscribers: Mutex<Vec<mpsc::Sender<ReceivedMessage>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for InMemoryTransport {
    type Error = InMemoryTransportError;

    fn send(&self, message: OutgoingMessage) -> Result<(), Self::Error> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| InMemoryTransportError::Poisoned)?;

        let received = ReceivedMessage::from(message);
        // Drop any dead subscribers while sending.
        subs.retain(|tx| tx.send(received.clone()).is_ok());
        trace!(subscribers = subs.len(), "delivered message");

        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<ReceivedMessage> {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still yields a receiver; it never gets messages.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        rx
    }
}
