//! Arena shutdown, overflow and registration behaviour with real actor tasks.

use actors::{ActorError, ActorState, Mailbox, Message, PoisonPill};
use parking_lot::Mutex;
use simulation::{
    spawn, Agent, AgentLogic, AgentRef, Arena, ArenaCore, ArenaLogic, Game, GameLogic, Result,
    RuntimeSettings,
};
use std::sync::Arc;
use std::time::Duration;

/// Messages an arena's `receive` hook saw, by sender name
type Inbox = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct Recording {
    inbox: Inbox,
    registered: Arc<Mutex<Vec<String>>>,
}

impl ArenaLogic for Recording {
    fn begin(&mut self, _arena: &ArenaCore) -> Result<()> {
        Ok(())
    }

    fn register(&mut self, _arena: &ArenaCore, agent: &AgentRef) -> Result<()> {
        self.registered.lock().push(agent.name().to_string());
        Ok(())
    }

    fn receive(
        &mut self,
        _arena: &ArenaCore,
        sender: &actors::ActorRef,
        _message: &Message,
    ) -> Result<()> {
        self.inbox.lock().push(sender.name().to_string());
        Ok(())
    }
}

struct Idle;

impl GameLogic for Idle {
    type State = ();
}

struct Mute;

impl AgentLogic for Mute {
    type State = ();
    type Representation = ();
    type Action = ();
}

fn pills_from(mailbox: &mut Mailbox, sender: &str) -> usize {
    let mut count = 0;
    while let Ok(envelope) = mailbox.get() {
        assert!(envelope.message.is::<PoisonPill>());
        assert_eq!(envelope.sender.name(), sender);
        count += 1;
    }
    count
}

#[tokio::test]
async fn test_pill_propagates_to_agents_and_games_once() {
    let logic = Recording::default();
    let inbox = Arc::clone(&logic.inbox);
    let mut arena = Arena::new("arena", logic);

    let mut a1 = Mailbox::new("a1");
    let mut a2 = Mailbox::new("a2");
    let mut g1 = Mailbox::new("g1");
    arena.register(&AgentRef::new(a1.address().clone())).unwrap();
    arena.register(&AgentRef::new(a2.address().clone())).unwrap();
    arena.games().register(g1.address().clone());

    let address = arena.address().clone();
    let outside = Mailbox::new("supervisor");
    address.tell_pill(outside.address()).unwrap();
    address.tell(outside.address(), Message::new("after the pill")).unwrap();

    let handle = spawn(arena).unwrap();
    handle.terminated().await;
    assert_eq!(handle.state(), ActorState::Terminated);
    handle.join().await.unwrap();

    assert_eq!(pills_from(&mut a1, "arena"), 1);
    assert_eq!(pills_from(&mut a2, "arena"), 1);
    assert_eq!(pills_from(&mut g1, "arena"), 1);
    assert!(inbox.lock().is_empty());
    assert!(address.tell_pill(outside.address()).is_err());
}

#[tokio::test]
async fn test_overflow_detected_before_processing() {
    let logic = Recording::default();
    let inbox = Arc::clone(&logic.inbox);
    let mut arena = Arena::new("arena", logic);

    let agents: Vec<Mailbox> = vec![Mailbox::new("a1"), Mailbox::new("a2")];
    for agent in &agents {
        arena.register(&AgentRef::new(agent.address().clone())).unwrap();
    }

    let address = arena.address().clone();
    for agent in agents.iter().chain(std::iter::once(&agents[0])) {
        address.tell(agent.address(), Message::new(1u32)).unwrap();
    }

    let handle = spawn(arena).unwrap();
    match handle.join().await {
        Err(ActorError::MailboxOverflow { actor, pending, limit }) => {
            assert_eq!(actor, "arena");
            assert_eq!(pending, 3);
            assert_eq!(limit, 2);
        }
        other => panic!("expected overflow, got {other:?}"),
    }
    assert!(inbox.lock().is_empty());
}

#[tokio::test]
async fn test_overflow_check_disabled_by_settings() {
    let logic = Recording::default();
    let inbox = Arc::clone(&logic.inbox);
    let settings = RuntimeSettings {
        overflow_check: false,
        ..RuntimeSettings::default()
    };
    let arena = Arena::with_settings("arena", logic, settings);

    let address = arena.address().clone();
    let sender = Mailbox::new("sender");
    for i in 0..5u32 {
        address.tell(sender.address(), Message::new(i)).unwrap();
    }
    address.tell_pill(sender.address()).unwrap();

    let handle = spawn(arena).unwrap();
    handle.join().await.unwrap();
    assert_eq!(inbox.lock().len(), 5);
}

#[tokio::test]
async fn test_begin_failure_terminates_arena() {
    struct NoBegin;
    impl ArenaLogic for NoBegin {}

    let handle = spawn(Arena::new("arena", NoBegin)).unwrap();
    let err = handle.join().await.unwrap_err();
    assert!(err.is_not_implemented());
    assert_eq!(err.to_string(), "Hook 'Arena::begin' is not implemented");
}

/// Starts only when `opens` is set
struct Gate {
    opens: bool,
}

impl ArenaLogic for Gate {
    fn begin(&mut self, arena: &ArenaCore) -> Result<()> {
        if self.opens {
            Ok(())
        } else {
            Err(ActorError::not_implemented(format!("{}::begin", arena.name())))
        }
    }

    fn register(&mut self, _arena: &ArenaCore, _agent: &AgentRef) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_arena_ends_game_wait() {
    let agent = Agent::new("Ag1", Mute);
    let reference = agent.reference();
    let agent_handle = spawn(agent).unwrap();

    let arenas = vec![
        Arena::new("closed", Gate { opens: false }),
        Arena::new("open", Gate { opens: true }),
    ];
    let game = Game::new("G", Idle, arenas, vec![reference]).unwrap();
    let handle = game.run(1).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("wait should finish once an arena fails");
    let err = outcome.unwrap_err();
    assert!(err.is_not_implemented());
    assert_eq!(err.to_string(), "Hook 'closed::begin' is not implemented");

    // The failed arena stopped its agent on the way out
    tokio::time::timeout(Duration::from_secs(5), agent_handle.join())
        .await
        .expect("agent should be stopped by the failed arena")
        .unwrap();
}

#[tokio::test]
async fn test_failed_arena_stops_its_game() {
    let arena = Arena::new("closed", Gate { opens: false });
    let game = Game::new("G", Idle, vec![arena], vec![]).unwrap();
    let handle = game.run(1).unwrap();

    let outcomes = tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("join should finish once the arena fails");
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].result.as_ref().unwrap_err().is_not_implemented());
    assert_eq!(outcomes[1].actor, "G");
    assert!(outcomes[1].result.is_ok());
}

#[test]
fn test_game_wires_every_agent_into_every_arena() {
    let first = Recording::default();
    let second = Recording::default();
    let registered = [Arc::clone(&first.registered), Arc::clone(&second.registered)];
    let arenas = vec![Arena::new("A1", first), Arena::new("A2", second)];

    let ag1 = Agent::new("Ag1", Mute);
    let ag2 = Agent::new("Ag2", Mute);
    let game = Game::new("G", Idle, arenas, vec![ag1.reference(), ag2.reference()]).unwrap();

    for arena in game.arenas() {
        assert_eq!(arena.agents().names(), vec!["Ag1", "Ag2"]);
        assert_eq!(arena.games().names(), vec!["G"]);
        assert_eq!(arena.games().get("G").as_ref(), Some(game.address()));
    }
    for agent in [&ag1, &ag2] {
        assert_eq!(agent.arenas().names(), vec!["A1", "A2"]);
    }
    for log in registered {
        assert_eq!(*log.lock(), vec!["Ag1", "Ag2"]);
    }
    assert_eq!(game.episodes(), 0);
}
