//! # Simulation Actors
//!
//! Arenas, agents and games built on the `actors` substrate. Each is a thin
//! actor that owns its mailbox and directories and forwards every domain
//! decision to a logic value supplied by the caller:
//!
//! | Actor | Logic trait | Hooks |
//! |---|---|---|
//! | [`Arena`] | [`ArenaLogic`] | `begin, reset, close, register, receive, prime, step, publish, seed` |
//! | [`Agent`] | [`AgentLogic`] | `receive, learn, perceive, policy, publish` |
//! | [`Game`] | [`GameLogic`] | `receive, publish, reset_condition` |
//!
//! Unoverridden hooks fail with [`actors::ActorError::NotImplemented`].
//!
//! ## Wiring
//!
//! ```text
//!            Game ──────────── shutdown (PoisonPill) ─────────┐
//!          /      \                                           ▼
//!     Arena 1    Arena 2   ── PoisonPill ──▶ every agent + every game
//!       │  \      /  │
//!       │   \    /   │
//!    Agent 1  Agent 2
//! ```
//!
//! [`Game::new`] registers every agent with every arena and records the game in
//! every arena. [`Game::run`] starts the arenas (each calls its `begin` hook)
//! and the game, returning a [`GameHandle`].

pub mod agent;
pub mod arena;
pub mod game;

pub use agent::{Agent, AgentLogic, AgentRef};
pub use arena::{Arena, ArenaCore, ArenaLogic};
pub use game::{ActorOutcome, Game, GameCore, GameHandle, GameLogic};

pub use actors::{spawn, ActorError, ActorRef, Message, PoisonPill, Result};
pub use arena_config::RuntimeSettings;
