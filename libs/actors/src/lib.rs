//! Actor Substrate
//!
//! Mailbox-per-actor message passing for in-process simulations. Every actor
//! owns one unbounded FIFO, runs its receive loop on its own tokio task, and
//! dispatches envelopes through a handler table shared by all actors of its
//! type.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  tell()   ┌─────────────────────────────────────────┐
//! │   ActorRef   │──────────▶│ Mailbox (FIFO of Envelope)              │
//! │  (cloneable) │           │   recv().await                          │
//! └──────────────┘           │        │                                │
//!                            │        ▼                                │
//!                            │ HandlerRegistry<A>  kind ──▶ handler    │
//!                            │        │            (fallback: Unreg.)  │
//!                            │        ▼                                │
//!                            │ handler(&mut A, ctx, sender, message)   │
//!                            └─────────────────────────────────────────┘
//! ```
//!
//! Shutdown is a message like any other: a [`PoisonPill`] is dispatched in
//! queue position, forwarded once to each of the actor's downstream actors, and
//! ends the loop.
//!
//! # Example
//!
//! ```rust
//! use actors::{spawn, Actor, HandlerRegistryBuilder, Mailbox, Message};
//!
//! struct Greeting(String);
//!
//! struct Greeter {
//!     mailbox: Option<Mailbox>,
//! }
//!
//! impl Actor for Greeter {
//!     fn take_mailbox(&mut self) -> Option<Mailbox> {
//!         self.mailbox.take()
//!     }
//!
//!     fn register_handlers(handlers: &mut HandlerRegistryBuilder<Self>) {
//!         handlers.on::<Greeting, _>(|_, ctx, _, greeting| {
//!             tracing::info!(actor = %ctx.address(), "{}", greeting.0);
//!             Ok(())
//!         });
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> actors::Result<()> {
//! let outside = Mailbox::new("main");
//! let handle = spawn(Greeter { mailbox: Some(Mailbox::new("greeter")) })?;
//! handle.address().tell(outside.address(), Message::new(Greeting("hello".into())))?;
//! handle.address().tell_pill(outside.address())?;
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod mailbox;
pub mod messages;
pub mod registry;
pub mod system;

pub use error::{ActorError, Result};
pub use handlers::{Dispatch, Handler, HandlerRegistry, HandlerRegistryBuilder};
pub use mailbox::{ActorRef, Mailbox};
pub use messages::{Envelope, Message, MessageKind, PoisonPill, UnregisteredMessage};
pub use registry::{ActorDirectory, ActorId};
pub use system::{
    propagate_poison_pill, spawn, Actor, ActorContext, ActorHandle, ActorState, ActorStats,
};
