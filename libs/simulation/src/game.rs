//! Game actor
//!
//! A game places a fixed group of agents in a fixed group of arenas and plays
//! them for a number of episodes. Construction does all of the wiring; running
//! starts the arenas and the game itself and hands back a [`GameHandle`].

use crate::agent::AgentRef;
use crate::arena::{Arena, ArenaLogic};
use actors::{
    spawn, Actor, ActorContext, ActorError, ActorHandle, ActorRef, HandlerRegistryBuilder,
    Mailbox, Message, Result,
};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use tracing::{debug, info, warn};

/// Substrate half of a game, visible to every [`GameLogic`] hook
pub struct GameCore {
    address: ActorRef,
    arenas: Vec<ActorRef>,
    agents: Vec<AgentRef>,
    episodes: u32,
}

impl GameCore {
    pub fn address(&self) -> &ActorRef {
        &self.address
    }

    pub fn name(&self) -> &str {
        self.address.name()
    }

    pub fn arenas(&self) -> &[ActorRef] {
        &self.arenas
    }

    pub fn agents(&self) -> &[AgentRef] {
        &self.agents
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }
}

/// Episode control. Every hook fails with `NotImplemented` until overridden.
pub trait GameLogic: Send + Sized + 'static {
    /// Whatever the game inspects to decide an episode is over
    type State;

    /// Handle any message without a typed handler
    fn receive(
        &mut self,
        _game: &GameCore,
        _sender: &ActorRef,
        _message: &Message,
    ) -> Result<()> {
        Err(ActorError::not_implemented("Game::receive"))
    }

    /// Send `message` to `arena`, most often a stop signal
    fn publish(&mut self, _game: &GameCore, _arena: &ActorRef, _message: Message) -> Result<()> {
        Err(ActorError::not_implemented("Game::publish"))
    }

    fn reset_condition(&mut self, _game: &GameCore, _state: &Self::State) -> Result<bool> {
        Err(ActorError::not_implemented("Game::reset_condition"))
    }

    /// Typed handlers for this game type, applied after the defaults
    fn handlers<A: ArenaLogic>(_handlers: &mut HandlerRegistryBuilder<Game<Self, A>>) {}
}

/// Game actor over arenas running logic `A`
pub struct Game<G: GameLogic, A: ArenaLogic> {
    core: GameCore,
    logic: G,
    mailbox: Option<Mailbox>,
    pending_arenas: Vec<Arena<A>>,
}

impl<G: GameLogic, A: ArenaLogic> Game<G, A> {
    /// Record the game in every arena and register every agent with every
    /// arena. Fails with the first arena `register` hook error, after taking
    /// these arenas back out of every agent's arena set.
    pub fn new(
        name: impl Into<String>,
        logic: G,
        mut arenas: Vec<Arena<A>>,
        agents: Vec<AgentRef>,
    ) -> Result<Self> {
        let mailbox = Mailbox::new(name);
        let address = mailbox.address().clone();

        if let Err(e) = wire(&address, &mut arenas, &agents) {
            for agent in &agents {
                for arena in &arenas {
                    agent.arenas().remove(arena.address());
                }
            }
            warn!(game = %address, error = %e, "Game assembly failed, registrations rolled back");
            return Err(e);
        }

        info!(
            game = %address,
            arenas = arenas.len(),
            agents = agents.len(),
            "Game assembled"
        );

        Ok(Self {
            core: GameCore {
                address,
                arenas: arenas.iter().map(|a| a.address().clone()).collect(),
                agents,
                episodes: 0,
            },
            logic,
            mailbox: Some(mailbox),
            pending_arenas: arenas,
        })
    }

    pub fn address(&self) -> &ActorRef {
        self.core.address()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn core(&self) -> &GameCore {
        &self.core
    }

    pub fn logic(&self) -> &G {
        &self.logic
    }

    /// Arenas not yet started
    pub fn arenas(&self) -> &[Arena<A>] {
        &self.pending_arenas
    }

    pub fn agents(&self) -> &[AgentRef] {
        self.core.agents()
    }

    pub fn episodes(&self) -> u32 {
        self.core.episodes
    }

    /// Core and logic borrowed together, for typed handlers
    pub fn parts(&mut self) -> (&GameCore, &mut G) {
        (&self.core, &mut self.logic)
    }

    pub fn receive(&mut self, sender: &ActorRef, message: &Message) -> Result<()> {
        self.logic.receive(&self.core, sender, message)
    }

    pub fn publish(&mut self, arena: &ActorRef, message: Message) -> Result<()> {
        self.logic.publish(&self.core, arena, message)
    }

    pub fn reset_condition(&mut self, state: &G::State) -> Result<bool> {
        self.logic.reset_condition(&self.core, state)
    }

    /// Set the episode count, start every arena, then start the game.
    ///
    /// Agents are not started here; their owner spawns them.
    pub fn run(mut self, episodes: u32) -> Result<GameHandle> {
        self.core.episodes = episodes;
        info!(game = %self.core.address, episodes, "Playing episodes");

        let arenas = std::mem::take(&mut self.pending_arenas);
        let mut arena_handles = Vec::with_capacity(arenas.len());
        for arena in arenas {
            arena_handles.push(spawn(arena)?);
        }

        let agents = self.core.agents.clone();
        let game = spawn(self)?;

        Ok(GameHandle {
            game,
            arenas: arena_handles,
            agents,
            episodes,
        })
    }

    /// Same as [`Game::run`]
    pub fn begin(self, episodes: u32) -> Result<GameHandle> {
        self.run(episodes)
    }
}

fn wire<A: ArenaLogic>(
    game: &ActorRef,
    arenas: &mut [Arena<A>],
    agents: &[AgentRef],
) -> Result<()> {
    for arena in arenas {
        arena.games().register(game.clone());
        for agent in agents {
            arena.register(agent)?;
        }
    }
    Ok(())
}

impl<G: GameLogic, A: ArenaLogic> Actor for Game<G, A> {
    fn take_mailbox(&mut self) -> Option<Mailbox> {
        self.mailbox.take()
    }

    fn register_handlers(handlers: &mut HandlerRegistryBuilder<Self>) {
        handlers.on_unregistered(|game, _, sender, message| game.receive(sender, message));
        G::handlers::<A>(handlers);
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        debug!(
            game = %ctx.address(),
            episodes = self.core.episodes,
            arenas = self.core.arenas.len(),
            "Game started"
        );
        Ok(())
    }
}

impl<G: GameLogic, A: ArenaLogic> fmt::Debug for Game<G, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("name", &self.name())
            .field("episodes", &self.core.episodes)
            .field("arenas", &self.core.arenas)
            .field("agents", &self.core.agents)
            .finish()
    }
}

/// How one actor of a game ended
#[derive(Debug)]
pub struct ActorOutcome {
    pub actor: String,
    pub result: Result<()>,
}

/// Running game: the game actor and the arenas it started
pub struct GameHandle {
    game: ActorHandle,
    arenas: Vec<ActorHandle>,
    agents: Vec<AgentRef>,
    episodes: u32,
}

impl GameHandle {
    pub fn address(&self) -> &ActorRef {
        self.game.address()
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    pub fn game(&self) -> &ActorHandle {
        &self.game
    }

    pub fn arenas(&self) -> &[ActorHandle] {
        &self.arenas
    }

    pub fn agents(&self) -> &[AgentRef] {
        &self.agents
    }

    /// Send a poison pill from the game to every arena it started.
    ///
    /// Arenas forward it to their agents and games, so the whole tree stops.
    /// Arenas that already terminated are skipped.
    pub fn shutdown(&self) -> Result<()> {
        for arena in &self.arenas {
            match arena.address().tell_pill(self.game.address()) {
                Ok(()) => {}
                Err(ActorError::MailboxClosed { .. }) => {
                    debug!(arena = %arena.address(), "Arena already terminated");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Wait for every arena and the game to terminate, arenas first
    pub async fn join(self) -> Vec<ActorOutcome> {
        let handles = self.arenas.into_iter().chain(std::iter::once(self.game));
        join_all(handles.map(|handle| async move {
            let actor = handle.name().to_string();
            let result = handle.join().await;
            if let Err(e) = &result {
                warn!(actor = %actor, error = %e, "Game actor failed");
            }
            ActorOutcome { actor, result }
        }))
        .await
    }

    /// Wait for every arena and the game, returning the first failure.
    ///
    /// Once any of them fails, the rest are sent a poison pill from the game
    /// so the wait cannot outlive the failure.
    pub async fn wait(self) -> Result<()> {
        let from = self.game.address().clone();
        let mut stop_targets: Vec<ActorRef> =
            self.arenas.iter().map(|a| a.address().clone()).collect();
        stop_targets.push(from.clone());

        let mut running: FuturesUnordered<_> = self
            .arenas
            .into_iter()
            .chain(std::iter::once(self.game))
            .map(|handle| async move {
                let actor = handle.name().to_string();
                (actor, handle.join().await)
            })
            .collect();

        let mut first_failure = None;
        while let Some((actor, result)) = running.next().await {
            if let Err(e) = result {
                warn!(actor = %actor, error = %e, "Game actor failed");
                if first_failure.is_none() {
                    stop_all(&stop_targets, &from);
                    first_failure = Some(e);
                }
            }
        }

        first_failure.map_or(Ok(()), Err)
    }
}

/// Pill every target from `from`, ignoring targets that already stopped
fn stop_all(targets: &[ActorRef], from: &ActorRef) {
    for target in targets {
        if let Err(e) = target.tell_pill(from) {
            debug!(actor = %target, error = %e, "Not stopped after failure");
        }
    }
}

impl fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameHandle")
            .field("game", &self.game)
            .field("arenas", &self.arenas)
            .field("episodes", &self.episodes)
            .finish()
    }
}
