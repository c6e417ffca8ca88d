//! A named membership set driving a [`Lifecycle`].

use crate::entity::{Entity, EntityId};
use crate::host::{FrameToken, Host};
use crate::membership::{MembershipEvent, MembershipStore, Members};
use std::marker::PhantomData;

/// Behaviour attached to a collection. Every hook receives the host and the members as they are
/// after the mutation.
pub trait Lifecycle<H: Host> {
    fn on_membership_changed(&mut self, host: &mut H, members: &Members);

    fn on_attributes_changed(&mut self, host: &mut H, members: &Members, ids: &[EntityId]);

    fn on_cleared(&mut self, host: &mut H, members: &Members) {
        self.on_membership_changed(host, members);
    }

    /// Runs the frame identified by `token`. Returns `false` when the token is not one this
    /// lifecycle is waiting for.
    fn on_frame(&mut self, host: &mut H, members: &Members, token: FrameToken) -> bool {
        let _ = (host, members, token);
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type CountListener = Box<dyn FnMut(usize)>;

pub struct Collection<H, L> {
    id: String,
    store: MembershipStore,
    lifecycle: L,
    listeners: Vec<(SubscriptionId, CountListener)>,
    next_subscription: u64,
    _host: PhantomData<fn(&mut H)>,
}

impl<H, L> std::fmt::Debug for Collection<H, L>
where
    L: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("members", &self.store.len())
            .field("lifecycle", &self.lifecycle)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<H: Host, L: Lifecycle<H>> Collection<H, L> {
    pub fn new(id: impl Into<String>, lifecycle: L) -> Self {
        Self {
            id: id.into(),
            store: MembershipStore::new(),
            lifecycle,
            listeners: Vec::new(),
            next_subscription: 0,
            _host: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add(&mut self, host: &mut H, entities: impl IntoIterator<Item = Entity>) {
        let event = self.store.add(entities);
        tracing::debug!(collection = %self.id, ?event, "add");
        self.dispatch(host, event);
    }

    pub fn remove<'a>(&mut self, host: &mut H, ids: impl IntoIterator<Item = &'a EntityId>) {
        let event = self.store.remove(ids);
        tracing::debug!(collection = %self.id, ?event, "remove");
        self.dispatch(host, event);
    }

    pub fn update(&mut self, host: &mut H, entities: impl IntoIterator<Item = Entity>) {
        if let Some(event) = self.store.update(entities) {
            self.dispatch(host, event);
        }
    }

    pub fn clear(&mut self, host: &mut H) {
        let event = self.store.clear();
        tracing::debug!(collection = %self.id, ?event, "clear");
        self.lifecycle.on_cleared(host, self.store.members());
        if event.count_changed() {
            self.notify_count();
        }
    }

    /// Forwards a host frame to the lifecycle.
    pub fn run_frame(&mut self, host: &mut H, token: FrameToken) -> bool {
        self.lifecycle.on_frame(host, self.store.members(), token)
    }

    pub fn members(&self) -> &Members {
        self.store.members()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.store.contains(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Members and lifecycle borrowed together, for lifecycle calls that need the membership.
    pub fn parts_mut(&mut self) -> (&Members, &mut L) {
        (self.store.members(), &mut self.lifecycle)
    }

    /// Registers a listener called with the new member count whenever the count changes.
    pub fn subscribe(&mut self, listener: impl FnMut(usize) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn dispatch(&mut self, host: &mut H, event: MembershipEvent) {
        match &event {
            MembershipEvent::MembershipChanged { .. } => {
                self.lifecycle
                    .on_membership_changed(host, self.store.members());
            }
            MembershipEvent::AttributesChanged { ids } => {
                self.lifecycle
                    .on_attributes_changed(host, self.store.members(), ids);
            }
        }
        if event.count_changed() {
            self.notify_count();
        }
    }

    fn notify_count(&mut self) {
        let count = self.store.len();
        for (_, listener) in &mut self.listeners {
            listener(count);
        }
    }
}
