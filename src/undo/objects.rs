// Automatic object remapping
//
// Domain objects referenced by actions can be destroyed and recreated between the
// moment an action is recorded and the moment it is replayed (an effect removed and
// added back is a brand new object). Actions keep the id they were created with and
// resolve it through the registry at execute/undo time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Stable logical identifier of a domain object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Allocate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form is enough to tell objects apart in logs
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Indirection table from superseded object ids to their live replacement
///
/// Entries are never removed, only redirected, so the table grows with the number
/// of recreations in a session. Each document owns its own registry.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    updates: HashMap<ObjectId, ObjectId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `old` has been replaced by `new`
    ///
    /// Every entry that pointed at `old` is redirected to `new`, so chains stay one
    /// hop long.
    pub fn supersede(&mut self, old: ObjectId, new: ObjectId) {
        if old == new {
            return;
        }

        for target in self.updates.values_mut() {
            if *target == old {
                *target = new;
            }
        }
        // A live object is never redirected
        self.updates.retain(|from, to| from != to);
        self.updates.remove(&new);
        self.updates.insert(old, new);

        log::debug!("Object {} superseded by {}", old, new);
    }

    /// Return the live id for `id`, following redirections transitively
    pub fn resolve(&self, id: ObjectId) -> ObjectId {
        let mut current = id;
        // Bounded walk: a chain can never be longer than the table
        for _ in 0..=self.updates.len() {
            match self.updates.get(&current) {
                Some(next) if *next != current => current = *next,
                _ => break,
            }
        }
        current
    }

    /// Whether `id` has been replaced by another object
    pub fn is_superseded(&self, id: ObjectId) -> bool {
        self.updates.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}
