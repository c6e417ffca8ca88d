use shoal_core::{
    Collection, CollectionRegistry, Entity, EntityId, Geometry, Host, MemoryDocument, Point,
    ShoalConfig,
};
use shoal_layout::{GraphLayout, GraphLayoutCollection, LayoutSettings, SimulationControl};

fn id(s: &str) -> EntityId {
    EntityId::new(s)
}

fn square(doc: &mut MemoryDocument, name: &str, x: f64, y: f64, color: Option<&str>) {
    let mut e = Entity::node(name, x, y);
    if let Some(c) = color {
        e = e.with_attribute("color", c);
    }
    doc.insert(e, Some(Geometry::new(10.0, 10.0)));
}

fn arrow(doc: &mut MemoryDocument, name: &str, from: &str, to: &str) {
    doc.insert(Entity::edge(name, Some(from), Some(to)), None);
}

fn red_pair() -> MemoryDocument {
    let mut doc = MemoryDocument::new();
    square(&mut doc, "A", 0.0, 0.0, Some("red"));
    square(&mut doc, "B", 100.0, 0.0, Some("red"));
    arrow(&mut doc, "AB", "A", "B");
    doc
}

fn collection() -> GraphLayoutCollection<MemoryDocument> {
    Collection::new("graph", GraphLayout::new(LayoutSettings::default()))
}

fn add_all(doc: &mut MemoryDocument, coll: &mut GraphLayoutCollection<MemoryDocument>) {
    let all = doc.surface_entities();
    coll.add(doc, all);
}

fn pump(doc: &mut MemoryDocument, coll: &mut GraphLayoutCollection<MemoryDocument>, frames: usize) {
    for _ in 0..frames {
        for token in doc.take_due_frames() {
            coll.run_frame(doc, token);
        }
    }
}

#[test]
fn red_pair_projects_to_linked_x_alignment() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);

    let p = coll.lifecycle().projection();
    assert_eq!(p.nodes.len(), 2);
    assert_eq!(p.edges.len(), 1);
    assert_eq!((p.edges[0].source, p.edges[0].target), (0, 1));
    assert_eq!(p.index_of(&id("A")), Some(0));
    assert_eq!(p.index_of(&id("B")), Some(1));
    assert_eq!(p.node(&id("B")).map(|n| (n.x, n.y)), Some((105.0, 5.0)));

    assert_eq!(p.constraints.len(), 1);
    let c = &p.constraints[0];
    assert_eq!(c.axis, narwhal::Axis::X);
    let offsets: Vec<(usize, f64)> = c.offsets.iter().map(|o| (o.node, o.offset)).collect();
    assert_eq!(offsets, [(0, 0.0), (1, 0.0)]);
}

#[test]
fn removing_a_node_drops_its_edges_and_constraint_slot() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);

    coll.remove(&mut doc, [&id("B")]);
    let p = coll.lifecycle().projection();
    assert_eq!(p.nodes.len(), 1);
    assert!(p.edges.is_empty());
    assert_eq!(p.constraints.len(), 1);
    assert_eq!(p.constraints[0].offsets.len(), 1);
    assert_eq!(p.constraints[0].offsets[0].node, 0);
    assert!(p.node(&id("B")).is_none());
}

#[test]
fn add_is_idempotent() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    add_all(&mut doc, &mut coll);
    let ids: Vec<&str> = coll.members().keys().map(EntityId::as_str).collect();
    assert_eq!(ids, ["A", "B", "AB"]);
}

#[test]
fn edges_appear_once_both_ends_are_members() {
    let mut doc = red_pair();
    let mut coll = collection();
    let edge = doc.get(&id("AB")).cloned().unwrap();
    let a = doc.get(&id("A")).cloned().unwrap();
    let b = doc.get(&id("B")).cloned().unwrap();

    coll.add(&mut doc, [edge]);
    assert!(coll.lifecycle().projection().edges.is_empty());
    coll.add(&mut doc, [b]);
    assert!(coll.lifecycle().projection().edges.is_empty());
    coll.add(&mut doc, [a]);
    let p = coll.lifecycle().projection();
    assert_eq!(p.edges.len(), 1);
    // Member order, not insertion order of the edge, decides node indices.
    assert_eq!(p.index_of(&id("B")), Some(0));
    assert_eq!((p.edges[0].source, p.edges[0].target), (1, 0));
}

#[test]
fn running_layout_aligns_red_nodes() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    assert!(coll.is_running());

    pump(&mut doc, &mut coll, 120);

    let a = doc.get(&id("A")).unwrap();
    let b = doc.get(&id("B")).unwrap();
    assert!((a.x - b.x).abs() < 1e-6, "a={a:?} b={b:?}");
    let gap = (a.y - b.y).abs();
    assert!(gap >= 10.0 - 1e-6, "nodes overlap: {gap}");
    assert!(coll.lifecycle().last_write_back().written == 2);
}

#[test]
fn clear_while_running_cancels_the_frame() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    pump(&mut doc, &mut coll, 3);

    let pending = coll.lifecycle().pending_frame().unwrap();
    coll.clear(&mut doc);
    assert!(!coll.is_running());
    assert!(coll.is_empty());
    assert_eq!(doc.pending_frames().count(), 0);

    let writes = doc.writes().len();
    assert!(!coll.run_frame(&mut doc, pending), "stale frame must not tick");
    pump(&mut doc, &mut coll, 5);
    assert_eq!(doc.writes().len(), writes);
}

#[test]
fn enable_and_disable_are_idempotent() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);

    coll.disable(&mut doc);
    assert!(!coll.is_running());
    coll.enable(&mut doc);
    coll.enable(&mut doc);
    assert_eq!(doc.pending_frames().count(), 1);
    coll.disable(&mut doc);
    coll.disable(&mut doc);
    assert_eq!(doc.pending_frames().count(), 0);
}

#[test]
fn dragged_nodes_are_never_written() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    pump(&mut doc, &mut coll, 2);

    doc.select([id("A")]);
    doc.take_writes();
    pump(&mut doc, &mut coll, 10);
    assert!(doc.writes().iter().all(|w| w.id != id("A")));
    assert!(doc.writes().iter().any(|w| w.id == id("B")));

    // The user drags A; its node follows the live position and stays fixed.
    doc.move_to(&id("A"), Point::new(-300.0, 40.0));
    pump(&mut doc, &mut coll, 1);
    let driver = coll.lifecycle().driver();
    let node = &driver.nodes()[0];
    assert_eq!(driver.ids()[0], id("A"));
    assert!(node.fixed);
    assert_eq!((node.x, node.y), (-295.0, 45.0));
    assert_eq!(coll.lifecycle().last_write_back().pinned, 1);
}

#[test]
fn enable_clears_the_selection_first() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    doc.select([id("A")]);
    coll.enable(&mut doc);
    assert!(doc.selected_ids().is_empty());
}

#[test]
fn disable_then_enable_reseeds_the_simulation() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    pump(&mut doc, &mut coll, 15);
    assert_eq!(coll.lifecycle().driver().ticks(), 15);

    coll.disable(&mut doc);
    doc.move_to(&id("B"), Point::new(500.0, 500.0));
    coll.enable(&mut doc);

    let driver = coll.lifecycle().driver();
    assert_eq!(driver.ticks(), 0);
    assert_eq!((driver.nodes()[1].x, driver.nodes()[1].y), (505.0, 505.0));
}

#[test]
fn attribute_changes_keep_momentum() {
    let mut doc = red_pair();
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    registry.register(coll).unwrap();

    for _ in 0..5 {
        for token in doc.take_due_frames() {
            assert!(registry.run_frame(&mut doc, token));
        }
    }

    let change = doc.set_attribute(&id("B"), "color", "blue").unwrap();
    registry.route(&mut doc, &change);

    let coll = registry.get::<GraphLayout>("graph").unwrap();
    let layout = coll.lifecycle();
    assert_eq!(layout.driver().ticks(), 5);
    let axes: Vec<narwhal::Axis> = layout.projection().constraints.iter().map(|c| c.axis).collect();
    assert_eq!(axes, [narwhal::Axis::X, narwhal::Axis::Y]);
    assert_eq!(
        coll.members()
            .get(&id("B"))
            .and_then(|e| e.attribute("color"))
            .and_then(|v| v.as_str()),
        Some("blue")
    );
}

#[test]
fn deleted_entities_leave_the_simulation() {
    let mut doc = red_pair();
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    registry.register(coll).unwrap();

    let change = doc.delete(&id("B")).unwrap();
    registry.route(&mut doc, &change);
    for token in doc.take_due_frames() {
        registry.run_frame(&mut doc, token);
    }

    let coll = registry.get::<GraphLayout>("graph").unwrap();
    assert!(!coll.contains(&id("B")));
    assert!(coll.lifecycle().driver().ids().iter().all(|i| *i != id("B")));
    assert!(doc.writes().iter().all(|w| w.id != id("B")));
}

#[test]
fn unmeasurable_nodes_are_skipped_for_the_tick() {
    let mut doc = red_pair();
    let mut coll = collection();
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);

    doc.set_geometry(&id("B"), None);
    pump(&mut doc, &mut coll, 1);
    let stats = coll.lifecycle().last_write_back();
    assert_eq!((stats.written, stats.skipped), (1, 1));
    assert!(doc.writes().iter().all(|w| w.id != id("B")));
}

#[test]
fn selection_helpers_move_members() {
    let mut doc = red_pair();
    let mut coll = collection();

    doc.select([id("A"), id("AB")]);
    coll.add_selected(&mut doc);
    assert_eq!(coll.len(), 2);
    assert!(doc.selected_ids().is_empty());

    doc.select([id("AB")]);
    coll.remove_selected(&mut doc);
    assert_eq!(coll.len(), 1);
    assert!(coll.contains(&id("A")));
}

#[test]
fn toggle_all_starts_and_stops() {
    let mut doc = red_pair();
    let mut coll = collection();

    coll.toggle_all(&mut doc);
    assert_eq!(coll.len(), 3);
    assert!(coll.is_running());

    coll.toggle_all(&mut doc);
    assert!(coll.is_empty());
    assert!(!coll.is_running());
    assert_eq!(doc.pending_frames().count(), 0);
}

#[test]
fn animated_writes_carry_the_transition() {
    let cfg = ShoalConfig::from_json5_str("{ writeBack: { animate: true, durationMs: 30 } }").unwrap();
    let mut doc = red_pair();
    let mut coll: GraphLayoutCollection<MemoryDocument> =
        Collection::new("graph", GraphLayout::from_config(&cfg).unwrap());
    add_all(&mut doc, &mut coll);
    coll.enable(&mut doc);
    pump(&mut doc, &mut coll, 1);

    let w = doc.writes().first().unwrap();
    let t = w.transition.unwrap();
    assert_eq!(t.duration, std::time::Duration::from_millis(30));
    assert_eq!(t.easing, shoal_core::Easing::EaseInQuad);
}

#[test]
fn count_subscription_reports_member_count() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut doc = red_pair();
    let mut coll = collection();
    let last = Rc::new(Cell::new(usize::MAX));
    let sink = Rc::clone(&last);
    coll.subscribe(move |n| sink.set(n));

    add_all(&mut doc, &mut coll);
    assert_eq!(last.get(), 3);
    coll.clear(&mut doc);
    assert_eq!(last.get(), 0);
}
