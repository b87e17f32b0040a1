//! Actor Messages
//!
//! A [`Message`] is a type-erased, reference-counted payload tagged with its
//! [`MessageKind`]. The kind is only ever used to pick a handler; delivery
//! order is decided by the mailbox alone.

use crate::mailbox::ActorRef;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shutdown signal. Dispatched like any other message, in queue position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoisonPill;

/// Lookup key for the fallback handler.
///
/// It has no public constructor, so it can never travel through a mailbox.
#[derive(Debug)]
pub struct UnregisteredMessage {
    _private: (),
}

/// Runtime identity of a message payload type
#[derive(Clone, Copy)]
pub struct MessageKind {
    id: TypeId,
    name: &'static str,
}

impl MessageKind {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn poison_pill() -> Self {
        Self::of::<PoisonPill>()
    }

    pub fn unregistered() -> Self {
        Self::of::<UnregisteredMessage>()
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for logs
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageKind {}

impl Hash for MessageKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageKind").field(&self.name).finish()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased message payload
#[derive(Clone)]
pub struct Message {
    kind: MessageKind,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Message {
    /// Wrap a payload of any shareable type
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            kind: MessageKind::of::<T>(),
            payload: Arc::new(payload),
        }
    }

    /// Wrap an already shared payload without copying it
    pub fn from_arc<T: Any + Send + Sync>(payload: Arc<T>) -> Self {
        Self {
            kind: MessageKind::of::<T>(),
            payload,
        }
    }

    pub fn poison_pill() -> Self {
        Self::new(PoisonPill)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is<T: Any>(&self) -> bool {
        self.kind.id == TypeId::of::<T>()
    }

    pub fn is_poison_pill(&self) -> bool {
        self.is::<PoisonPill>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Take a shared handle to the payload, or get the message back on mismatch
    pub fn downcast<T: Any + Send + Sync>(self) -> std::result::Result<Arc<T>, Self> {
        let kind = self.kind;
        self.payload
            .downcast::<T>()
            .map_err(|payload| Self { kind, payload })
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").field("kind", &self.kind).finish()
    }
}

/// A message paired with the address of whoever sent it
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: ActorRef,
    pub message: Message,
}

impl Envelope {
    pub fn new(sender: ActorRef, message: Message) -> Self {
        Self { sender, message }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}
