use shoal_core::{
    Collection, CollectionRegistry, Entity, EntityId, Error, FrameToken, Host, Lifecycle,
    MemoryDocument, Members,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<String>,
    waiting: Option<FrameToken>,
}

impl Lifecycle<MemoryDocument> for Recorder {
    fn on_membership_changed(&mut self, _host: &mut MemoryDocument, members: &Members) {
        self.events.push(format!("membership:{}", members.len()));
    }

    fn on_attributes_changed(
        &mut self,
        _host: &mut MemoryDocument,
        _members: &Members,
        ids: &[EntityId],
    ) {
        let ids: Vec<&str> = ids.iter().map(EntityId::as_str).collect();
        self.events.push(format!("attributes:{}", ids.join(",")));
    }

    fn on_cleared(&mut self, host: &mut MemoryDocument, _members: &Members) {
        if let Some(token) = self.waiting.take() {
            host.cancel_frame(token);
        }
        self.events.push("cleared".to_string());
    }

    fn on_frame(&mut self, _host: &mut MemoryDocument, _members: &Members, token: FrameToken) -> bool {
        if self.waiting != Some(token) {
            return false;
        }
        self.waiting = None;
        self.events.push("frame".to_string());
        true
    }
}

fn recorder(id: &str) -> Collection<MemoryDocument, Recorder> {
    Collection::new(id, Recorder::default())
}

fn doc_with(ids: &[&str]) -> MemoryDocument {
    let mut doc = MemoryDocument::new();
    for id in ids {
        doc.insert(Entity::node(*id, 0.0, 0.0), None);
    }
    doc
}

fn events(registry: &CollectionRegistry<MemoryDocument>, id: &str) -> Vec<String> {
    registry
        .get::<Recorder>(id)
        .map(|c| c.lifecycle().events.clone())
        .unwrap_or_default()
}

#[test]
fn duplicate_collection_ids_are_rejected() {
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    registry
        .register(recorder("graph"))
        .unwrap();
    let err = registry
        .register(recorder("graph"))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateCollection { id } if id == "graph"));
}

#[test]
fn content_changes_reach_only_holding_collections() {
    let mut doc = doc_with(&["a", "b"]);
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let mut first = recorder("first");
    let all = doc.surface_entities();
    first.add(&mut doc, all);
    registry.register(first).unwrap();
    registry
        .register(recorder("second"))
        .unwrap();

    let change = doc.set_attribute(&"a".into(), "color", "red").unwrap();
    registry.route(&mut doc, &change);

    assert_eq!(events(&registry, "first"), ["membership:2", "attributes:a"]);
    assert!(events(&registry, "second").is_empty());
    let stored = registry
        .get::<Recorder>("first")
        .and_then(|c| c.members().get(&EntityId::new("a")).cloned())
        .unwrap();
    assert_eq!(stored.attribute("color"), Some(&"red".into()));
}

#[test]
fn moves_are_not_routed_as_updates() {
    let mut doc = doc_with(&["a"]);
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let mut c = recorder("graph");
    let all = doc.surface_entities();
    c.add(&mut doc, all);
    registry.register(c).unwrap();

    let change = doc
        .move_to(&"a".into(), shoal_core::Point::new(10.0, 10.0))
        .unwrap();
    registry.route(&mut doc, &change);
    assert_eq!(events(&registry, "graph"), ["membership:1"]);
}

#[test]
fn deletes_reach_every_collection() {
    let mut doc = doc_with(&["a", "b"]);
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let mut c = recorder("graph");
    let all = doc.surface_entities();
    c.add(&mut doc, all);
    registry.register(c).unwrap();
    registry
        .register(recorder("empty"))
        .unwrap();

    let change = doc.delete(&"b".into()).unwrap();
    registry.route(&mut doc, &change);

    let graph = registry.get::<Recorder>("graph").unwrap();
    assert!(!graph.contains(&"b".into()));
    assert_eq!(graph.lifecycle().events, ["membership:2", "membership:1"]);
    // Absent ids still signal membership-changed.
    assert_eq!(events(&registry, "empty"), ["membership:0"]);
}

#[test]
fn frames_go_to_the_scheduling_collection_only_once() {
    let mut doc = doc_with(&[]);
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    registry
        .register(recorder("idle"))
        .unwrap();
    let mut waiting = recorder("waiting");
    let token = doc.request_frame();
    let (_, lifecycle) = waiting.parts_mut();
    lifecycle.waiting = Some(token);
    registry.register(waiting).unwrap();

    assert!(registry.run_frame(&mut doc, token));
    assert!(!registry.run_frame(&mut doc, token), "stale token must be ignored");
    assert_eq!(events(&registry, "waiting"), ["frame"]);
    assert!(events(&registry, "idle").is_empty());
}

#[test]
fn clear_cancels_the_pending_frame() {
    let mut doc = doc_with(&["a"]);
    let mut c = recorder("graph");
    let all = doc.surface_entities();
    c.add(&mut doc, all);
    let token = doc.request_frame();
    c.parts_mut().1.waiting = Some(token);

    c.clear(&mut doc);
    assert!(c.is_empty());
    assert_eq!(doc.pending_frames().count(), 0);
    assert!(!c.run_frame(&mut doc, token));
    assert_eq!(c.lifecycle().events, ["membership:1", "cleared"]);
}

#[test]
fn count_listeners_fire_on_count_changes_only() {
    let mut doc = doc_with(&["a", "b"]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut c = recorder("graph");
    let sink = Rc::clone(&seen);
    let sub = c.subscribe(move |n| sink.borrow_mut().push(n));

    let all = doc.surface_entities();

    c.add(&mut doc, all);
    let all = doc.surface_entities();
    c.add(&mut doc, all);
    c.remove(&mut doc, [&EntityId::new("a")]);
    c.update(&mut doc, [Entity::node("b", 0.0, 0.0).with_attribute("color", "blue")]);
    assert!(c.unsubscribe(sub));
    assert!(!c.unsubscribe(sub));
    c.clear(&mut doc);

    assert_eq!(*seen.borrow(), vec![2, 1]);
}
