//! Handler Registry
//!
//! Maps a [`MessageKind`] to the function that handles it for one actor type.
//! A registry is built once per actor type, cached process-wide, and shared
//! read-only by every instance of that type. Handlers receive the actor
//! instance explicitly, so nothing instance-specific lives in the table.

use crate::error::{ActorError, Result};
use crate::mailbox::ActorRef;
use crate::messages::{Envelope, Message, MessageKind, PoisonPill, UnregisteredMessage};
use crate::system::{propagate_poison_pill, Actor, ActorContext};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Type-erased handler: `(actor, context, sender, message)`
pub type Handler<A> =
    Box<dyn Fn(&mut A, &mut ActorContext, &ActorRef, &Message) -> Result<()> + Send + Sync>;

/// Outcome of dispatching one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran (directly registered or the fallback)
    Handled,
    /// No handler and no fallback; the message was dropped
    Discarded,
}

/// Immutable `kind -> handler` table for actor type `A`
pub struct HandlerRegistry<A> {
    handlers: HashMap<MessageKind, Handler<A>>,
}

/// One registry per actor type, keyed by the actor's `TypeId`
static SHARED_REGISTRIES: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

impl<A: 'static> HandlerRegistry<A> {
    pub fn builder() -> HandlerRegistryBuilder<A> {
        HandlerRegistryBuilder {
            handlers: HashMap::new(),
        }
    }

    /// Direct handler for `kind`, else the `UnregisteredMessage` fallback
    pub fn resolve(&self, kind: MessageKind) -> Option<&Handler<A>> {
        self.handlers
            .get(&kind)
            .or_else(|| self.handlers.get(&MessageKind::unregistered()))
    }

    /// True when `kind` has its own entry (the fallback does not count)
    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn has_fallback(&self) -> bool {
        self.handles(MessageKind::unregistered())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the resolved handler for `envelope`, or drop it when none resolves
    pub fn dispatch(
        &self,
        actor: &mut A,
        ctx: &mut ActorContext,
        envelope: &Envelope,
    ) -> Result<Dispatch> {
        let kind = envelope.kind();
        match self.resolve(kind) {
            Some(handler) => {
                trace!(
                    actor = %ctx.address(),
                    kind = %kind,
                    sender = %envelope.sender,
                    "Dispatching"
                );
                handler(actor, ctx, &envelope.sender, &envelope.message)?;
                Ok(Dispatch::Handled)
            }
            None => {
                trace!(actor = %ctx.address(), kind = %kind, "No handler registered, discarding");
                Ok(Dispatch::Discarded)
            }
        }
    }
}

impl<A: Actor> HandlerRegistry<A> {
    /// The table for actor type `A`, built on first use.
    ///
    /// Starts from the runtime defaults (poison pill propagation), then applies
    /// [`Actor::register_handlers`], so an actor type may replace the default.
    pub fn shared() -> Arc<Self> {
        let key = TypeId::of::<A>();

        if let Some(existing) = SHARED_REGISTRIES.read().get(&key) {
            if let Ok(registry) = Arc::clone(existing).downcast::<Self>() {
                return registry;
            }
        }

        // Built outside the lock: registration code may touch other types' tables
        let built: Arc<dyn Any + Send + Sync> = Arc::new(Self::for_actor());
        let stored = Arc::clone(SHARED_REGISTRIES.write().entry(key).or_insert(built));

        match stored.downcast::<Self>() {
            Ok(registry) => registry,
            Err(_) => Arc::new(Self::for_actor()),
        }
    }

    fn for_actor() -> Self {
        let mut builder = Self::builder();
        builder.on::<PoisonPill, _>(|actor, ctx, sender, _| {
            propagate_poison_pill(actor, ctx, sender)
        });
        A::register_handlers(&mut builder);
        builder.build()
    }
}

impl<A> fmt::Debug for HandlerRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registrations for a [`HandlerRegistry`]
pub struct HandlerRegistryBuilder<A> {
    handlers: HashMap<MessageKind, Handler<A>>,
}

impl<A: 'static> HandlerRegistryBuilder<A> {
    /// Register an untyped handler for `kind`. Last write wins.
    pub fn register<F>(&mut self, kind: MessageKind, handler: F) -> &mut Self
    where
        F: Fn(&mut A, &mut ActorContext, &ActorRef, &Message) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    /// Register a handler for payloads of type `T`
    pub fn on<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut A, &mut ActorContext, &ActorRef, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.register(MessageKind::of::<T>(), move |actor, ctx, sender, message| {
            match message.downcast_ref::<T>() {
                Some(payload) => handler(actor, ctx, sender, payload),
                None => Err(ActorError::message_type(
                    std::any::type_name::<T>(),
                    message.kind().name(),
                )),
            }
        })
    }

    /// Register the fallback for kinds without their own handler
    pub fn on_unregistered<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut A, &mut ActorContext, &ActorRef, &Message) -> Result<()> + Send + Sync + 'static,
    {
        self.register(MessageKind::of::<UnregisteredMessage>(), handler)
    }

    pub fn build(self) -> HandlerRegistry<A> {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}
