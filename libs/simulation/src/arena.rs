//! Arena actor
//!
//! An arena owns environment state and drives the cycle
//!
//! ```text
//! publish state ──▶ receive actions ──▶ prime agents ──▶ step ──▶ publish state
//! ```
//!
//! The cycle itself lives in [`ArenaLogic`]. The arena actor keeps the agent
//! and game directories, routes mail to the logic, and on shutdown forwards a
//! poison pill to every agent and game it knows.

use crate::agent::AgentRef;
use actors::{
    Actor, ActorContext, ActorDirectory, ActorError, ActorRef, HandlerRegistryBuilder, Mailbox,
    Message, Result,
};
use arena_config::RuntimeSettings;
use std::fmt;
use tracing::{debug, info};

/// Substrate half of an arena, visible to every [`ArenaLogic`] hook
pub struct ArenaCore {
    address: ActorRef,
    agents: ActorDirectory,
    games: ActorDirectory,
    settings: RuntimeSettings,
}

impl ArenaCore {
    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    /// Registered agents by name
    pub fn agents(&self) -> &ActorDirectory {
        &self.agents
    }

    /// Games this arena reports to, by name
    pub fn games(&self) -> &ActorDirectory {
        &self.games
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Actors expected to send into this arena's mailbox
    pub fn senders(&self) -> usize {
        self.agents.len() + self.games.len()
    }
}

/// Environment dynamics. Every hook fails with `NotImplemented` until
/// overridden.
pub trait ArenaLogic: Send + Sized + 'static {
    /// Start the environment; runs on the arena's task before any mail
    fn begin(&mut self, _arena: &ArenaCore) -> Result<()> {
        Err(ActorError::not_implemented("Arena::begin"))
    }

    /// Return to a starting state at the end of an episode
    fn reset(&mut self, _arena: &ArenaCore) -> Result<()> {
        Err(ActorError::not_implemented("Arena::reset"))
    }

    fn close(&mut self, _arena: &ArenaCore) -> Result<()> {
        Err(ActorError::not_implemented("Arena::close"))
    }

    /// Fold a newly registered agent into the environment
    fn register(&mut self, _arena: &ArenaCore, _agent: &AgentRef) -> Result<()> {
        Err(ActorError::not_implemented("Arena::register"))
    }

    /// Handle any message without a typed handler
    fn receive(
        &mut self,
        _arena: &ArenaCore,
        _sender: &ActorRef,
        _message: &Message,
    ) -> Result<()> {
        Err(ActorError::not_implemented("Arena::receive"))
    }

    /// Record `agent`'s chosen action ahead of the next step
    fn prime(&mut self, _arena: &ArenaCore, _agent: &ActorRef, _action: &Message) -> Result<()> {
        Err(ActorError::not_implemented("Arena::prime"))
    }

    /// Advance the environment using every primed action
    fn step(&mut self, _arena: &ArenaCore) -> Result<()> {
        Err(ActorError::not_implemented("Arena::step"))
    }

    /// Send the latest state and reward to `agent`
    fn publish(&mut self, _arena: &ArenaCore, _agent: &ActorRef) -> Result<()> {
        Err(ActorError::not_implemented("Arena::publish"))
    }

    fn seed(&mut self, _arena: &ArenaCore, _seed: Option<u64>) -> Result<()> {
        Err(ActorError::not_implemented("Arena::seed"))
    }

    /// Typed handlers for this arena type, applied after the defaults
    fn handlers(_handlers: &mut HandlerRegistryBuilder<Arena<Self>>) {}
}

/// Arena actor: substrate core plus environment logic
pub struct Arena<L: ArenaLogic> {
    core: ArenaCore,
    logic: L,
    mailbox: Option<Mailbox>,
}

impl<L: ArenaLogic> Arena<L> {
    pub fn new(name: impl Into<String>, logic: L) -> Self {
        Self::with_settings(name, logic, RuntimeSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, logic: L, settings: RuntimeSettings) -> Self {
        let mailbox = Mailbox::new(name);
        Self {
            core: ArenaCore {
                address: mailbox.address().clone(),
                agents: ActorDirectory::new("agents"),
                games: ActorDirectory::new("games"),
                settings,
            },
            logic,
            mailbox: Some(mailbox),
        }
    }

    pub fn address(&self) -> &ActorRef {
        self.core.address()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn agents(&self) -> &ActorDirectory {
        self.core.agents()
    }

    pub fn games(&self) -> &ActorDirectory {
        self.core.games()
    }

    pub fn core(&self) -> &ArenaCore {
        &self.core
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }

    /// Core and logic borrowed together, for typed handlers
    pub fn parts(&mut self) -> (&ArenaCore, &mut L) {
        (&self.core, &mut self.logic)
    }

    pub fn begin(&mut self) -> Result<()> {
        self.logic.begin(&self.core)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.logic.reset(&self.core)
    }

    pub fn close(&mut self) -> Result<()> {
        self.logic.close(&self.core)
    }

    /// Add `agent` to this arena and this arena to the agent, then run the
    /// `register` hook. A second agent with the same name replaces the first.
    pub fn register(&mut self, agent: &AgentRef) -> Result<()> {
        self.core.agents.register(agent.address().clone());
        agent.arenas().register(self.core.address.clone());
        debug!(arena = %self.core.address, agent = %agent.address(), "Agent registered");
        self.logic.register(&self.core, agent)
    }

    pub fn receive(&mut self, sender: &ActorRef, message: &Message) -> Result<()> {
        self.logic.receive(&self.core, sender, message)
    }

    pub fn prime(&mut self, agent: &ActorRef, action: &Message) -> Result<()> {
        self.logic.prime(&self.core, agent, action)
    }

    pub fn step(&mut self) -> Result<()> {
        self.logic.step(&self.core)
    }

    pub fn publish(&mut self, agent: &ActorRef) -> Result<()> {
        self.logic.publish(&self.core, agent)
    }

    pub fn seed(&mut self, seed: Option<u64>) -> Result<()> {
        self.logic.seed(&self.core, seed)
    }
}

impl<L: ArenaLogic> Actor for Arena<L> {
    fn take_mailbox(&mut self) -> Option<Mailbox> {
        self.mailbox.take()
    }

    fn register_handlers(handlers: &mut HandlerRegistryBuilder<Self>) {
        handlers.on_unregistered(|arena, _, sender, message| arena.receive(sender, message));
        L::handlers(handlers);
    }

    fn downstream(&self) -> Vec<ActorRef> {
        let mut downstream = self.core.agents.snapshot();
        downstream.extend(self.core.games.snapshot());
        downstream
    }

    fn mailbox_limit(&self) -> Option<usize> {
        self.core.settings.mailbox_limit(self.core.senders())
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        info!(
            arena = %ctx.address(),
            agents = self.core.agents.len(),
            games = self.core.games.len(),
            "Arena beginning"
        );
        self.begin()
    }
}

impl<L: ArenaLogic> fmt::Debug for Arena<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("name", &self.name())
            .field("agents", &self.core.agents.names())
            .field("games", &self.core.games.names())
            .finish()
    }
}
