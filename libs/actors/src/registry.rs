//! Actor Registry
//!
//! Name-keyed directory of actor addresses, safe to mutate from any thread
//! while the owning actor's receive loop reads it.

use crate::mailbox::ActorRef;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Get UUID
    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, lock-guarded map from actor name to address.
///
/// Clones share the same underlying map. Registering a name twice keeps the
/// newer address.
#[derive(Clone, Default)]
pub struct ActorDirectory {
    label: &'static str,
    entries: Arc<RwLock<BTreeMap<String, ActorRef>>>,
}

impl ActorDirectory {
    /// `label` names the directory in logs ("agents", "games", ...)
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Insert `actor` under its name, returning the address it replaced
    pub fn register(&self, actor: ActorRef) -> Option<ActorRef> {
        let name = actor.name().to_string();
        let replaced = self.entries.write().insert(name, actor);

        match &replaced {
            Some(previous) => warn!(
                directory = self.label,
                actor = %previous,
                "Duplicate registration replaced an existing entry"
            ),
            None => debug!(directory = self.label, "Registered actor"),
        }
        replaced
    }

    /// Drop the entry for `actor`'s name if it still points at `actor`.
    ///
    /// An entry that was replaced by a newer address under the same name is
    /// left alone.
    pub fn remove(&self, actor: &ActorRef) -> bool {
        let mut entries = self.entries.write();
        match entries.get(actor.name()) {
            Some(current) if current == actor => {
                entries.remove(actor.name());
                debug!(directory = self.label, actor = %actor, "Removed actor");
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<ActorRef> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Point-in-time copy of every registered address
    pub fn snapshot(&self) -> Vec<ActorRef> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ActorDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorDirectory")
            .field("label", &self.label)
            .field("names", &self.names())
            .finish()
    }
}
