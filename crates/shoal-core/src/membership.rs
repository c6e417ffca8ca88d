use crate::entity::{Entity, EntityId};
use indexmap::IndexMap;

/// Read-only view of a collection's members, in insertion order.
pub type Members = IndexMap<EntityId, Entity>;

/// What a store mutation did, for the owning collection to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    MembershipChanged { before: usize, after: usize },
    AttributesChanged { ids: Vec<EntityId> },
}

impl MembershipEvent {
    pub fn count_changed(&self) -> bool {
        matches!(self, MembershipEvent::MembershipChanged { before, after } if before != after)
    }
}

/// Id-keyed snapshot set of the entities belonging to one collection.
#[derive(Debug, Clone, Default)]
pub struct MembershipStore {
    members: Members,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or overwrites) every entity.
    pub fn add(&mut self, entities: impl IntoIterator<Item = Entity>) -> MembershipEvent {
        let before = self.members.len();
        for e in entities {
            self.members.insert(e.id.clone(), e);
        }
        MembershipEvent::MembershipChanged {
            before,
            after: self.members.len(),
        }
    }

    /// Removes every id. Absent ids are ignored but the event is produced regardless.
    pub fn remove<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) -> MembershipEvent {
        let before = self.members.len();
        for id in ids {
            self.members.shift_remove(id);
        }
        MembershipEvent::MembershipChanged {
            before,
            after: self.members.len(),
        }
    }

    /// Replaces the snapshots of ids already present. Returns `None` when none were.
    pub fn update(&mut self, entities: impl IntoIterator<Item = Entity>) -> Option<MembershipEvent> {
        let mut ids = Vec::new();
        for e in entities {
            if let Some(slot) = self.members.get_mut(&e.id) {
                ids.push(e.id.clone());
                *slot = e;
            }
        }
        if ids.is_empty() {
            return None;
        }
        Some(MembershipEvent::AttributesChanged { ids })
    }

    pub fn clear(&mut self) -> MembershipEvent {
        let before = self.members.len();
        self.members.clear();
        MembershipEvent::MembershipChanged { before, after: 0 }
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
