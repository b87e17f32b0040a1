//! Actor Mailbox
//!
//! One unbounded FIFO per actor. Any number of [`ActorRef`] clones may enqueue
//! concurrently; only the owning [`Mailbox`] dequeues.

use crate::error::{ActorError, Result};
use crate::messages::{Envelope, Message};
use crate::registry::ActorId;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

/// Cloneable address of an actor's mailbox
#[derive(Clone)]
pub struct ActorRef {
    id: ActorId,
    name: Arc<str>,
    sender: mpsc::UnboundedSender<Envelope>,
}

impl ActorRef {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a prepared envelope. Never blocks.
    pub fn put(&self, envelope: Envelope) -> Result<()> {
        trace!(actor = %self.name, kind = %envelope.kind(), "Enqueue envelope");
        self.sender
            .send(envelope)
            .map_err(|_| ActorError::mailbox_closed(self.name.as_ref()))
    }

    /// Send `message` to this actor on behalf of `from`
    pub fn tell(&self, from: &ActorRef, message: Message) -> Result<()> {
        self.put(Envelope::new(from.clone(), message))
    }

    pub fn tell_pill(&self, from: &ActorRef) -> Result<()> {
        self.tell(from, Message::poison_pill())
    }

    /// True once the owning actor has stopped accepting envelopes
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActorRef {}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Owning end of an actor's message queue
pub struct Mailbox {
    address: ActorRef,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl Mailbox {
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let name: String = name.into();
        let address = ActorRef {
            id: ActorId::new(),
            name: Arc::from(name),
            sender,
        };

        Self { address, receiver }
    }

    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    /// Append an envelope from `sender`
    pub fn put(&self, sender: &ActorRef, message: Message) -> Result<()> {
        self.address.tell(sender, message)
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of envelopes currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Remove the oldest envelope without waiting
    pub fn get(&mut self) -> Result<Envelope> {
        match self.receiver.try_recv() {
            Ok(envelope) => Ok(envelope),
            Err(TryRecvError::Empty) => Err(ActorError::empty_mailbox(self.name())),
            Err(TryRecvError::Disconnected) => Err(ActorError::mailbox_closed(self.name())),
        }
    }

    /// Wait until an envelope arrives and remove it.
    ///
    /// Returns `None` only after [`Mailbox::close`] once the queue is drained.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }

    /// Refuse all further `put`s. Already queued envelopes stay readable.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("address", &self.address)
            .field("pending", &self.len())
            .finish()
    }
}
