use shoal::layout::{GraphLayout, SimulationControl, register_collection};
use shoal::{CollectionRegistry, Entity, EntityId, Geometry, MemoryDocument, ShoalConfig};

fn drive(doc: &mut MemoryDocument, registry: &mut CollectionRegistry<MemoryDocument>, frames: usize) {
    for _ in 0..frames {
        for token in doc.take_due_frames() {
            registry.run_frame(doc, token);
        }
    }
}

#[test]
fn blue_shapes_line_up_end_to_end() {
    let mut doc = MemoryDocument::new();
    for (name, x, y) in [("a", 0.0, 0.0), ("b", 150.0, 80.0), ("c", 320.0, -60.0)] {
        doc.insert(
            Entity::node(name, x, y).with_attribute("color", "blue"),
            Some(Geometry::new(40.0, 20.0)),
        );
    }
    doc.insert(Entity::edge("ab", Some("a"), Some("b")), None);
    doc.insert(Entity::edge("bc", Some("b"), Some("c")), None);

    let mut registry = CollectionRegistry::new();
    register_collection(&mut registry, "graph", &ShoalConfig::default()).unwrap();

    let coll = registry.get_mut::<GraphLayout>("graph").unwrap();
    coll.toggle_all(&mut doc);
    assert!(coll.is_running());

    drive(&mut doc, &mut registry, 150);

    let ys: Vec<f64> = ["a", "b", "c"]
        .iter()
        .map(|n| doc.get(&EntityId::new(*n)).unwrap().y)
        .collect();
    assert!((ys[0] - ys[1]).abs() < 1e-6 && (ys[1] - ys[2]).abs() < 1e-6, "{ys:?}");

    let coll = registry.get_mut::<GraphLayout>("graph").unwrap();
    coll.toggle_all(&mut doc);
    assert!(!coll.is_running());
    let writes = doc.writes().len();
    drive(&mut doc, &mut registry, 5);
    assert_eq!(doc.writes().len(), writes);
}

#[test]
fn bad_config_is_reported() {
    let cfg = ShoalConfig::from_json5_str("{ layout: { linkDistance: 0 } }").unwrap();
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    let err = register_collection(&mut registry, "graph", &cfg).unwrap_err();
    assert!(matches!(err, shoal::layout::Error::InvalidSettings { .. }));
    assert!(registry.is_empty());
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = CollectionRegistry::<MemoryDocument>::new();
    register_collection(&mut registry, "graph", &ShoalConfig::default()).unwrap();
    let err = register_collection(&mut registry, "graph", &ShoalConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        shoal::layout::Error::Core(shoal::Error::DuplicateCollection { .. })
    ));
}
