//! Agent actor
//!
//! A single decision maker. It turns arena state into its own representation,
//! picks an action from that representation, and publishes the action back to
//! the arenas it plays in.

use actors::{
    Actor, ActorContext, ActorDirectory, ActorError, ActorRef, HandlerRegistryBuilder, Mailbox,
    Message, Result,
};
use std::fmt;
use tracing::debug;

/// Cloneable view of an agent: its address and the arenas it belongs to.
///
/// The arena set is shared, so arenas registering the agent after this value
/// was cloned are visible through every clone.
#[derive(Clone)]
pub struct AgentRef {
    address: ActorRef,
    arenas: ActorDirectory,
}

impl AgentRef {
    /// Wrap an address that is not backed by an [`Agent`] value
    pub fn new(address: ActorRef) -> Self {
        Self {
            address,
            arenas: ActorDirectory::new("arenas"),
        }
    }

    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    /// Arenas this agent has been registered with
    pub fn arenas(&self) -> &ActorDirectory {
        &self.arenas
    }
}

impl PartialEq for AgentRef {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl fmt::Debug for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRef")
            .field("name", &self.name())
            .field("arenas", &self.arenas.names())
            .finish()
    }
}

/// Domain behaviour of an agent. Every hook fails with `NotImplemented` until
/// overridden.
pub trait AgentLogic: Send + Sized + 'static {
    /// What the agent is shown by an arena
    type State;
    /// The agent's private reading of a state
    type Representation;
    /// What the agent sends back
    type Action;

    /// Handle any message without a typed handler
    fn receive(
        &mut self,
        _agent: &AgentRef,
        _sender: &ActorRef,
        _message: &Message,
    ) -> Result<()> {
        Err(ActorError::not_implemented("Agent::receive"))
    }

    /// Update the agent's model from a reward signal
    fn learn(&mut self, _agent: &AgentRef, _signal: &Message) -> Result<()> {
        Err(ActorError::not_implemented("Agent::learn"))
    }

    fn perceive(
        &mut self,
        _agent: &AgentRef,
        _state: &Self::State,
    ) -> Result<Self::Representation> {
        Err(ActorError::not_implemented("Agent::perceive"))
    }

    fn policy(
        &mut self,
        _agent: &AgentRef,
        _representation: &Self::Representation,
    ) -> Result<Self::Action> {
        Err(ActorError::not_implemented("Agent::policy"))
    }

    fn publish(&mut self, _agent: &AgentRef, _action: Self::Action) -> Result<()> {
        Err(ActorError::not_implemented("Agent::publish"))
    }

    /// Typed handlers for this agent type, applied after the defaults
    fn handlers(_handlers: &mut HandlerRegistryBuilder<Agent<Self>>) {}
}

/// Agent actor: substrate state plus domain logic
pub struct Agent<L: AgentLogic> {
    core: AgentRef,
    logic: L,
    mailbox: Option<Mailbox>,
}

impl<L: AgentLogic> Agent<L> {
    pub fn new(name: impl Into<String>, logic: L) -> Self {
        let mailbox = Mailbox::new(name);
        Self {
            core: AgentRef::new(mailbox.address().clone()),
            logic,
            mailbox: Some(mailbox),
        }
    }

    /// Handle to pass to arenas and games
    pub fn reference(&self) -> AgentRef {
        self.core.clone()
    }

    pub fn address(&self) -> &ActorRef {
        self.core.address()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn arenas(&self) -> &ActorDirectory {
        self.core.arenas()
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }

    /// Core and logic borrowed together, for typed handlers
    pub fn parts(&mut self) -> (&AgentRef, &mut L) {
        (&self.core, &mut self.logic)
    }

    pub fn receive(&mut self, sender: &ActorRef, message: &Message) -> Result<()> {
        self.logic.receive(&self.core, sender, message)
    }

    pub fn learn(&mut self, signal: &Message) -> Result<()> {
        self.logic.learn(&self.core, signal)
    }

    pub fn perceive(&mut self, state: &L::State) -> Result<L::Representation> {
        self.logic.perceive(&self.core, state)
    }

    pub fn policy(&mut self, representation: &L::Representation) -> Result<L::Action> {
        self.logic.policy(&self.core, representation)
    }

    pub fn publish(&mut self, action: L::Action) -> Result<()> {
        self.logic.publish(&self.core, action)
    }
}

impl<L: AgentLogic> Actor for Agent<L> {
    fn take_mailbox(&mut self) -> Option<Mailbox> {
        self.mailbox.take()
    }

    fn register_handlers(handlers: &mut HandlerRegistryBuilder<Self>) {
        handlers.on_unregistered(|agent, _, sender, message| agent.receive(sender, message));
        L::handlers(handlers);
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        debug!(agent = %ctx.address(), arenas = self.core.arenas().len(), "Agent ready");
        Ok(())
    }
}

impl<L: AgentLogic> fmt::Debug for Agent<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent").field("core", &self.core).finish()
    }
}
