//! In-memory [`Host`] for headless embedding and tests.

use crate::entity::{Entity, EntityId, Geometry};
use crate::geometry::Point;
use crate::host::{FrameToken, Host, HostChange, Transition};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeSet;

/// A position write issued through [`Host::set_position`].
#[derive(Debug, Clone, PartialEq)]
pub struct PositionWrite {
    pub id: EntityId,
    pub anchor: Point,
    pub transition: Option<Transition>,
}

/// Entities, measured sizes, selection and a frame queue held in memory.
///
/// Position writes apply immediately (transitions are recorded, not animated). Mutators that a
/// real editor would broadcast return the [`HostChange`] to hand to the registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    entities: IndexMap<EntityId, Entity>,
    geometry: FxHashMap<EntityId, Geometry>,
    selection: IndexSet<EntityId>,
    pending_frames: BTreeSet<FrameToken>,
    next_frame: u64,
    writes: Vec<PositionWrite>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity with an optional measured size. Replacing an existing entity yields
    /// an update notification.
    pub fn insert(&mut self, entity: Entity, geometry: Option<Geometry>) -> Option<HostChange> {
        match geometry {
            Some(g) => {
                self.geometry.insert(entity.id.clone(), g);
            }
            None => {
                self.geometry.remove(&entity.id);
            }
        }
        let prev = self.entities.insert(entity.id.clone(), entity.clone())?;
        Some(HostChange::Updated { prev, next: entity })
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Applies `f` to the entity and reports the change.
    pub fn modify(&mut self, id: &EntityId, f: impl FnOnce(&mut Entity)) -> Option<HostChange> {
        let slot = self.entities.get_mut(id)?;
        let prev = slot.clone();
        f(slot);
        Some(HostChange::Updated {
            prev,
            next: slot.clone(),
        })
    }

    pub fn set_attribute(
        &mut self,
        id: &EntityId,
        key: &str,
        value: impl Into<Value>,
    ) -> Option<HostChange> {
        let value = value.into();
        self.modify(id, |e| {
            e.attributes.insert(key.to_string(), value);
        })
    }

    /// User-driven move (e.g. a drag step). Does not go through the write log.
    pub fn move_to(&mut self, id: &EntityId, anchor: Point) -> Option<HostChange> {
        self.modify(id, |e| {
            e.x = anchor.x;
            e.y = anchor.y;
        })
    }

    pub fn delete(&mut self, id: &EntityId) -> Option<HostChange> {
        self.geometry.remove(id);
        self.selection.shift_remove(id);
        let prev = self.entities.shift_remove(id)?;
        Some(HostChange::Deleted { prev })
    }

    pub fn set_geometry(&mut self, id: &EntityId, geometry: Option<Geometry>) {
        match geometry {
            Some(g) => {
                self.geometry.insert(id.clone(), g);
            }
            None => {
                self.geometry.remove(id);
            }
        }
    }

    pub fn select(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.selection = ids
            .into_iter()
            .filter(|id| self.entities.contains_key(id))
            .collect();
    }

    pub fn selection(&self) -> &IndexSet<EntityId> {
        &self.selection
    }

    pub fn writes(&self) -> &[PositionWrite] {
        &self.writes
    }

    pub fn take_writes(&mut self) -> Vec<PositionWrite> {
        std::mem::take(&mut self.writes)
    }

    pub fn pending_frames(&self) -> impl Iterator<Item = FrameToken> + '_ {
        self.pending_frames.iter().copied()
    }

    /// Hands out every pending frame, emptying the queue; the caller delivers them.
    pub fn take_due_frames(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.pending_frames).into_iter().collect()
    }
}

impl Host for MemoryDocument {
    fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.get(id).cloned()
    }

    fn geometry(&self, id: &EntityId) -> Option<Geometry> {
        self.geometry.get(id).copied()
    }

    fn selected_ids(&self) -> Vec<EntityId> {
        self.selection.iter().cloned().collect()
    }

    fn surface_entities(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }

    fn set_position(&mut self, id: &EntityId, anchor: Point, transition: Option<Transition>) {
        let Some(e) = self.entities.get_mut(id) else {
            return;
        };
        e.x = anchor.x;
        e.y = anchor.y;
        self.writes.push(PositionWrite {
            id: id.clone(),
            anchor,
            transition,
        });
    }

    fn select_none(&mut self) {
        self.selection.clear();
    }

    fn request_frame(&mut self) -> FrameToken {
        self.next_frame += 1;
        let token = FrameToken(self.next_frame);
        self.pending_frames.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending_frames.remove(&token);
    }
}
