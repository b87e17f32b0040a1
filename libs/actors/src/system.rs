//! Actor Runtime
//!
//! Lifecycle, receive loop and shutdown protocol shared by every actor type.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──spawn()──▶ Running ──PoisonPill / error──▶ Terminating ──▶ Terminated
//! ```
//!
//! Each spawned actor runs its receive loop on its own tokio task. The loop
//! suspends on the mailbox until an envelope arrives, dispatches it through the
//! actor type's [`HandlerRegistry`], then checks the context's termination flag.
//!
//! # Poison pill
//!
//! The default `PoisonPill` handler sends one pill to every actor returned by
//! [`Actor::downstream`] and raises the termination flag. Envelopes queued
//! behind the pill are never dispatched: the mailbox is closed and dropped.
//!
//! # Failures
//!
//! A handler error is never caught. The loop stops, the actor goes straight to
//! `Terminated`, and the error comes back out of [`ActorHandle::join`].
//! Before the task ends, every downstream actor still gets one poison pill so
//! nothing waits on a parent that is gone.

use crate::error::{ActorError, Result};
use crate::handlers::{Dispatch, HandlerRegistry, HandlerRegistryBuilder};
use crate::mailbox::{ActorRef, Mailbox};
use crate::messages::Message;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Created,
    Running,
    Terminating,
    Terminated,
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorState::Created => "created",
            ActorState::Running => "running",
            ActorState::Terminating => "terminating",
            ActorState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Behaviour the runtime needs from a concrete actor type
pub trait Actor: Send + Sized + 'static {
    /// Hand over the mailbox created with the actor. Called once by [`spawn`].
    fn take_mailbox(&mut self) -> Option<Mailbox>;

    /// Add this type's handlers on top of the runtime defaults
    fn register_handlers(_handlers: &mut HandlerRegistryBuilder<Self>) {}

    /// Actors that receive a poison pill when this one accepts one
    fn downstream(&self) -> Vec<ActorRef> {
        Vec::new()
    }

    /// Most envelopes allowed to be pending at once; `None` disables the check
    fn mailbox_limit(&self) -> Option<usize> {
        None
    }

    /// Called on the actor's task before the first envelope
    fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Called after a clean shutdown
    fn on_stop(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }
}

/// Delivery counters for one actor
#[derive(Debug, Default)]
pub struct ActorStats {
    pub messages_processed: AtomicU64,
    pub messages_discarded: AtomicU64,
    pub total_processing_time_ns: AtomicU64,
}

impl ActorStats {
    pub fn record_message_handled(&self, duration: Duration) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_message_discarded(&self) {
        self.messages_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.messages_discarded.load(Ordering::Relaxed)
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.processed();
        if count == 0 {
            return 0.0;
        }
        self.total_processing_time_ns.load(Ordering::Relaxed) as f64 / count as f64
    }
}

/// What a handler can see of the running actor besides its own state
pub struct ActorContext {
    address: ActorRef,
    stopping: bool,
    stats: Arc<ActorStats>,
}

impl ActorContext {
    pub fn new(address: ActorRef) -> Self {
        Self {
            address,
            stopping: false,
            stats: Arc::new(ActorStats::default()),
        }
    }

    fn with_stats(address: ActorRef, stats: Arc<ActorStats>) -> Self {
        Self {
            address,
            stopping: false,
            stats,
        }
    }

    /// Address of the actor being run, used as the sender of outgoing mail
    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    /// Send `message` to `target` with this actor as the sender
    pub fn tell(&self, target: &ActorRef, message: Message) -> Result<()> {
        target.tell(&self.address, message)
    }

    /// Leave the receive loop after the current handler returns
    pub fn stop(&mut self) {
        self.stopping = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }
}

/// Default `PoisonPill` handler: forward one pill downstream, then stop.
///
/// A downstream actor whose mailbox is already closed has terminated on its
/// own (for example via another arena) and is skipped.
pub fn propagate_poison_pill<A: Actor>(
    actor: &mut A,
    ctx: &mut ActorContext,
    sender: &ActorRef,
) -> Result<()> {
    let downstream = unique_downstream(actor);

    debug!(
        actor = %ctx.address(),
        from = %sender,
        downstream = downstream.len(),
        "Poison pill accepted, propagating"
    );

    send_pills(ctx, &downstream)?;
    ctx.stop();
    Ok(())
}

fn unique_downstream<A: Actor>(actor: &A) -> Vec<ActorRef> {
    let mut seen = HashSet::new();
    actor
        .downstream()
        .into_iter()
        .filter(|target| seen.insert(target.id().clone()))
        .collect()
}

/// One pill to each target, skipping targets that already terminated
fn send_pills(ctx: &ActorContext, targets: &[ActorRef]) -> Result<()> {
    for target in targets {
        match ctx.tell(target, Message::poison_pill()) {
            Ok(()) => {}
            Err(ActorError::MailboxClosed { .. }) => {
                debug!(actor = %ctx.address(), target = %target, "Downstream already terminated");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Sets `Terminated` however the task ends, unwinding included
struct StateGuard {
    state: watch::Sender<ActorState>,
}

impl StateGuard {
    fn set(&self, state: ActorState) {
        self.state.send_replace(state);
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        self.state.send_replace(ActorState::Terminated);
    }
}

/// Handle to a spawned actor
pub struct ActorHandle {
    address: ActorRef,
    state: watch::Receiver<ActorState>,
    stats: Arc<ActorStats>,
    task: JoinHandle<Result<()>>,
}

impl ActorHandle {
    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    pub fn state(&self) -> ActorState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the actor reaches `Terminated`
    pub async fn terminated(&self) {
        let mut state = self.state.clone();
        // The guard publishes Terminated before the sender drops
        let _ = state.wait_for(|s| *s == ActorState::Terminated).await;
    }

    /// Wait for the receive loop to finish and return how it ended
    pub async fn join(self) -> Result<()> {
        let name = self.address.name().to_string();
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ActorError::panicked(name, e.to_string())),
        }
    }
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("address", &self.address)
            .field("state", &self.state())
            .finish()
    }
}

/// Start `actor` on its own task.
///
/// Fails when the actor's mailbox was already taken or when called outside a
/// tokio runtime.
pub fn spawn<A: Actor>(mut actor: A) -> Result<ActorHandle> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
        ActorError::configuration(format!("spawn requires a tokio runtime: {}", e), None)
    })?;
    let mailbox = actor.take_mailbox().ok_or_else(|| {
        ActorError::configuration("actor has no mailbox (already spawned?)", Some("mailbox"))
    })?;

    let address = mailbox.address().clone();
    let stats = Arc::new(ActorStats::default());
    let (state_tx, state_rx) = watch::channel(ActorState::Created);
    state_tx.send_replace(ActorState::Running);

    info!(
        actor = %address,
        actor_id = %address.id(),
        actor_type = std::any::type_name::<A>(),
        "Spawning actor"
    );

    let ctx = ActorContext::with_stats(address.clone(), Arc::clone(&stats));
    let task = runtime.spawn(run(actor, mailbox, ctx, StateGuard { state: state_tx }));

    Ok(ActorHandle {
        address,
        state: state_rx,
        stats,
        task,
    })
}

async fn run<A: Actor>(
    mut actor: A,
    mut mailbox: Mailbox,
    mut ctx: ActorContext,
    guard: StateGuard,
) -> Result<()> {
    let task_start = Instant::now();
    let registry = HandlerRegistry::<A>::shared();

    let outcome = receive_loop(&mut actor, &mut mailbox, &mut ctx, &registry).await;

    guard.set(ActorState::Terminating);
    mailbox.close();
    let dropped = mailbox.len();
    drop(mailbox);

    let outcome = match outcome {
        Ok(()) => actor.on_stop(&mut ctx),
        Err(e) => Err(e),
    };

    match &outcome {
        Ok(()) => info!(
            actor = %ctx.address(),
            processed = ctx.stats().processed(),
            dropped_envelopes = dropped,
            total_runtime_ms = task_start.elapsed().as_millis() as u64,
            "Actor terminated"
        ),
        Err(e) => {
            error!(
                actor = %ctx.address(),
                error = %e,
                error_category = e.category(),
                processed = ctx.stats().processed(),
                dropped_envelopes = dropped,
                "Actor terminated abnormally"
            );
            notify_downstream(&actor, &ctx);
        }
    }

    drop(guard);
    outcome
}

/// Stop every downstream actor of an actor that failed
fn notify_downstream<A: Actor>(actor: &A, ctx: &ActorContext) {
    let downstream = unique_downstream(actor);
    if downstream.is_empty() {
        return;
    }
    warn!(
        actor = %ctx.address(),
        downstream = downstream.len(),
        "Stopping downstream of failed actor"
    );
    if let Err(e) = send_pills(ctx, &downstream) {
        warn!(actor = %ctx.address(), error = %e, "Could not stop every downstream actor");
    }
}

async fn receive_loop<A: Actor>(
    actor: &mut A,
    mailbox: &mut Mailbox,
    ctx: &mut ActorContext,
    registry: &HandlerRegistry<A>,
) -> Result<()> {
    actor.on_start(ctx)?;
    debug!(actor = %ctx.address(), "Actor started, entering receive loop");

    while let Some(envelope) = mailbox.recv().await {
        if let Some(limit) = actor.mailbox_limit() {
            let pending = mailbox.len() + 1;
            if pending > limit {
                return Err(ActorError::mailbox_overflow(ctx.name(), pending, limit));
            }
        }

        let start = Instant::now();
        match registry.dispatch(actor, ctx, &envelope)? {
            Dispatch::Handled => ctx.stats().record_message_handled(start.elapsed()),
            Dispatch::Discarded => ctx.stats().record_message_discarded(),
        }

        if ctx.is_stopping() {
            mailbox.close();
            break;
        }
    }

    Ok(())
}
