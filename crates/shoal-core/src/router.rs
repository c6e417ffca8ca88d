//! Routes host notifications and frames to registered collections.

use crate::collection::{Collection, Lifecycle};
use crate::entity::{Entity, EntityId};
use crate::error::{Error, Result};
use crate::host::{FrameToken, Host, HostChange};
use indexmap::IndexMap;
use std::any::Any;

/// Object-safe view of a [`Collection`] used by the registry.
pub trait AnyCollection<H>: Any {
    fn id(&self) -> &str;
    fn contains(&self, id: &EntityId) -> bool;
    fn update(&mut self, host: &mut H, entity: Entity);
    fn remove(&mut self, host: &mut H, id: &EntityId);
    fn run_frame(&mut self, host: &mut H, token: FrameToken) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<H, L> AnyCollection<H> for Collection<H, L>
where
    H: Host + 'static,
    L: Lifecycle<H> + 'static,
{
    fn id(&self) -> &str {
        Collection::id(self)
    }

    fn contains(&self, id: &EntityId) -> bool {
        Collection::contains(self, id)
    }

    fn update(&mut self, host: &mut H, entity: Entity) {
        Collection::update(self, host, [entity]);
    }

    fn remove(&mut self, host: &mut H, id: &EntityId) {
        Collection::remove(self, host, [id]);
    }

    fn run_frame(&mut self, host: &mut H, token: FrameToken) -> bool {
        Collection::run_frame(self, host, token)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every collection of a document and fans host notifications out to them.
pub struct CollectionRegistry<H> {
    collections: IndexMap<String, Box<dyn AnyCollection<H>>>,
}

impl<H> Default for CollectionRegistry<H> {
    fn default() -> Self {
        Self {
            collections: IndexMap::new(),
        }
    }
}

impl<H> std::fmt::Debug for CollectionRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRegistry")
            .field("collections", &self.collections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<H: Host + 'static> CollectionRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<L>(&mut self, collection: Collection<H, L>) -> Result<()>
    where
        L: Lifecycle<H> + 'static,
    {
        let id = collection.id().to_string();
        if self.collections.contains_key(&id) {
            return Err(Error::DuplicateCollection { id });
        }
        tracing::debug!(collection = %id, "register collection");
        self.collections.insert(id, Box::new(collection));
        Ok(())
    }

    /// Removes and drops a collection. Callers should stop any running loop first.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.collections.shift_remove(id).is_some()
    }

    pub fn get<L>(&self, id: &str) -> Option<&Collection<H, L>>
    where
        L: Lifecycle<H> + 'static,
    {
        self.collections
            .get(id)?
            .as_any()
            .downcast_ref::<Collection<H, L>>()
    }

    pub fn get_mut<L>(&mut self, id: &str) -> Option<&mut Collection<H, L>>
    where
        L: Lifecycle<H> + 'static,
    {
        self.collections
            .get_mut(id)?
            .as_any_mut()
            .downcast_mut::<Collection<H, L>>()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Host entity changed. Only content changes reach the collections holding it.
    pub fn after_change(&mut self, host: &mut H, prev: &Entity, next: &Entity) {
        if !prev.content_differs(next) {
            return;
        }
        for c in self.collections.values_mut() {
            if c.contains(&next.id) {
                c.update(host, next.clone());
            }
        }
    }

    /// Host entity deleted. Every collection drops it.
    pub fn after_delete(&mut self, host: &mut H, prev: &Entity) {
        for c in self.collections.values_mut() {
            c.remove(host, &prev.id);
        }
    }

    pub fn route(&mut self, host: &mut H, change: &HostChange) {
        match change {
            HostChange::Updated { prev, next } => self.after_change(host, prev, next),
            HostChange::Deleted { prev } => self.after_delete(host, prev),
        }
    }

    /// Delivers a host frame to the collection that scheduled it. Returns `false` for stale or
    /// unknown tokens.
    pub fn run_frame(&mut self, host: &mut H, token: FrameToken) -> bool {
        for c in self.collections.values_mut() {
            if c.run_frame(host, token) {
                return true;
            }
        }
        tracing::trace!(?token, "frame not claimed by any collection");
        false
    }
}
