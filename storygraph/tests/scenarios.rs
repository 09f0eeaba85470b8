use serde_json::json;
use storygraph::{
    EdgeEnd, EditorConfig, Entity, EntityKind, GraphStore, InMemoryRepository, ManualClock, NodeChange, Pattern,
    PatternData, PatternRepository, Point, Side,
};

type Store = GraphStore<InMemoryRepository, ManualClock>;

fn entities() -> Vec<Entity> {
    vec![Entity::item("1", "Harbor"), Entity::item("2", "Lighthouse"), Entity::item("3", "Cliffs")]
}

fn store_with(repo: InMemoryRepository, pattern: &str) -> (Store, ManualClock) {
    let clock = ManualClock::new(10_000.0);
    let mut store = GraphStore::new(EntityKind::locations(), EditorConfig::default(), repo, clock.clone());
    store.sync_entities(entities());
    store.load_pattern(pattern).unwrap();
    (store, clock)
}

fn fresh_store() -> (Store, ManualClock) {
    let mut repo = InMemoryRepository::new();
    let p = repo.create_pattern("novel", "Main", PatternData::empty(), 0.0).unwrap();
    store_with(repo, &p.id)
}

#[test]
fn parallel_connections_fan_out_and_collapse() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(100.0, 100.0)).unwrap();
    let b = store.add_entity_node("2", Point::new(300.0, 100.0)).unwrap();
    assert_eq!((a.as_str(), b.as_str()), ("loc-1", "loc-2"));

    let first = store.connect(&a, &b, None, Default::default()).unwrap();
    let e = store.doc().edge(&first).unwrap();
    assert_eq!((e.source_handle, e.target_handle), (Some(Side::Right), Some(Side::Left)));
    assert_eq!(e.curvature, 0.0);

    let second = store.connect(&b, &a, None, Default::default()).unwrap();
    let c1 = store.doc().edge(&first).unwrap().curvature;
    let c2 = store.doc().edge(&second).unwrap().curvature;
    assert_ne!(c1, 0.0);
    assert_eq!(c1, -c2);
    assert_eq!(c1.abs(), 25.0);

    assert!(store.delete_edge(&first));
    assert_eq!(store.doc().edge(&second).unwrap().curvature, 0.0);
}

#[test]
fn deleting_either_sibling_restores_the_other() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(100.0, 100.0)).unwrap();
    let b = store.add_entity_node("2", Point::new(300.0, 100.0)).unwrap();
    let first = store.connect(&a, &b, None, Default::default()).unwrap();
    let second = store.connect(&b, &a, None, Default::default()).unwrap();
    assert!(store.delete_edge(&second));
    assert_eq!(store.doc().edge(&first).unwrap().curvature, 0.0);
}

#[test]
fn dangling_persisted_edge_is_dropped_on_load() {
    let mut repo = InMemoryRepository::new();
    repo.insert(Pattern {
        id: "pattern-legacy".into(),
        project_id: "novel".into(),
        name: "Main".into(),
        nodes_data: json!([
            { "id": "loc-1", "kind": "entity", "position": { "x": 0, "y": 0 }, "entityRef": "1" }
        ])
        .to_string(),
        edges_data: json!([
            { "id": "e-ok", "source": "loc-1", "target": "loc-1x" },
            { "id": "e-gone", "source": "loc-1", "target": "loc-404", "color": "#000",
              "strokeWidth": 2, "curvature": 0, "arrow": false }
        ])
        .to_string(),
        created_at: 0.0,
    });
    let (store, _clock) = store_with(repo, "pattern-legacy");
    assert_eq!(store.doc().nodes.len(), 1);
    assert!(store.doc().edges.is_empty());
    assert_eq!(store.doc().nodes[0].label.as_deref(), Some("Harbor"));
}

#[test]
fn persisted_handles_on_anchor_endpoints_are_cleared() {
    let mut repo = InMemoryRepository::new();
    repo.insert(Pattern {
        id: "pattern-old".into(),
        project_id: "novel".into(),
        name: "Main".into(),
        nodes_data: json!([
            { "id": "loc-1", "type": "locationNode", "position": { "x": 0, "y": 0 }, "data": { "locationId": 1 } },
            { "id": "anchor-5", "type": "anchorNode", "position": { "x": 300, "y": 20 } }
        ])
        .to_string(),
        edges_data: json!([
            { "id": "e-1", "source": "loc-1", "target": "anchor-5",
              "sourceHandle": "right-source", "targetHandle": "left-target" }
        ])
        .to_string(),
        created_at: 0.0,
    });
    let (store, _clock) = store_with(repo, "pattern-old");
    let e = store.doc().edge("e-1").unwrap();
    assert!(store.doc().node(&e.target).unwrap().is_anchor());
    assert_eq!(e.source_handle, Some(Side::Right));
    assert_eq!(e.target_handle, None);
}

#[test]
fn anchor_dropped_on_entity_rebinds_its_edges() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(0.0, 0.0)).unwrap();
    let b = store.add_entity_node("2", Point::new(400.0, 0.0)).unwrap();
    let c = store.add_entity_node("3", Point::new(400.0, 300.0)).unwrap();
    let e1 = store.connect(&a, &b, None, Default::default()).unwrap();
    let anchor = store.disconnect_endpoint(&e1, EdgeEnd::Target).unwrap();
    assert_eq!(store.doc().edge(&e1).unwrap().target, anchor);
    assert_eq!(store.doc().edge(&e1).unwrap().target_handle, None);

    // Drop the anchor into the upper-left part of the third card.
    let inside = Point::new(410.0, 305.0);
    store.apply_node_changes(&[NodeChange::Position { id: anchor.clone(), position: Some(inside), dragging: true }]);
    store.apply_node_changes(&[NodeChange::Position { id: anchor.clone(), position: None, dragging: false }]);

    assert!(!store.doc().has_node(&anchor));
    let e = store.doc().edge(&e1).unwrap();
    assert_eq!(e.target, c);
    assert!(matches!(e.target_handle, Some(Side::Left) | Some(Side::Top)));
    assert!(store.doc().edges.iter().all(|e| e.source != anchor && e.target != anchor));
}

#[test]
fn anchor_released_on_empty_canvas_stays() {
    let (mut store, _clock) = fresh_store();
    let anchor = store.add_anchor(Point::new(-500.0, -500.0), None).unwrap();
    store.apply_node_changes(&[NodeChange::Position { id: anchor.clone(), position: None, dragging: true }]);
    store.apply_node_changes(&[NodeChange::Position { id: anchor.clone(), position: None, dragging: false }]);
    assert!(store.doc().has_node(&anchor));
}

#[test]
fn rapid_edits_settle_into_one_snapshot() {
    let (mut store, clock) = fresh_store();
    assert_eq!(store.history_len(), 1);
    let a = store.add_entity_node("1", Point::new(0.0, 0.0)).unwrap();
    for i in 1..=5 {
        clock.advance(40.0);
        store.add_entity_node("1", Point::new(i as f64 * 10.0, 0.0));
        assert!(!store.poll().unwrap().captured);
    }
    clock.advance(300.0);
    assert!(store.poll().unwrap().captured);
    assert_eq!(store.history_len(), 2);
    assert_eq!(store.doc().node(&a).unwrap().position, Point::new(50.0, 0.0));

    assert!(store.undo());
    assert!(store.doc().is_empty());
    assert!(store.redo());
    assert_eq!(store.doc().node(&a).unwrap().position, Point::new(50.0, 0.0));
}

#[test]
fn sync_is_idempotent_and_prunes_deleted_entities() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(0.0, 0.0)).unwrap();
    let b = store.add_entity_node("2", Point::new(300.0, 0.0)).unwrap();
    store.connect(&a, &b, None, Default::default()).unwrap();

    let mut renamed = entities();
    renamed[0].name = "Old Harbor".into();
    assert!(store.sync_entities(renamed.clone()));
    assert_eq!(store.doc().node(&a).unwrap().label.as_deref(), Some("Old Harbor"));
    let before = store.doc().clone();
    assert!(!store.sync_entities(renamed.clone()));
    assert_eq!(*store.doc(), before);

    renamed.retain(|e| e.id != "2");
    assert!(store.sync_entities(renamed));
    assert!(!store.doc().has_node(&b));
    assert!(store.doc().edges.is_empty());
}

#[test]
fn reverse_keeps_the_drawn_curve() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(100.0, 100.0)).unwrap();
    let b = store.add_entity_node("2", Point::new(300.0, 100.0)).unwrap();
    let first = store.connect(&a, &b, None, Default::default()).unwrap();
    store.connect(&b, &a, None, Default::default()).unwrap();
    let before = storygraph::routing::resolve_edge(store.doc(), store.doc().edge(&first).unwrap()).unwrap().1;
    assert!(store.reverse_edge(&first));
    let e = store.doc().edge(&first).unwrap();
    assert_eq!((e.source.as_str(), e.target.as_str()), (b.as_str(), a.as_str()));
    assert_eq!((e.source_handle, e.target_handle), (Some(Side::Left), Some(Side::Right)));
    let after = storygraph::routing::resolve_edge(store.doc(), e).unwrap().1;
    assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
}

#[test]
fn pattern_survives_reload() {
    let (mut store, _clock) = fresh_store();
    let a = store.add_entity_node("1", Point::new(10.0, 20.0)).unwrap();
    let t = store.add_text(Point::new(0.0, 200.0), "Act I").unwrap();
    store.connect(&a, &t, None, Default::default()).unwrap();
    store.save_now().unwrap();
    let id = store.active_pattern().unwrap().to_string();
    let saved = store.doc().clone();
    let repo = store.repo().clone();

    let (reloaded, _clock) = store_with(repo, &id);
    assert_eq!(reloaded.doc().nodes.len(), saved.nodes.len());
    assert_eq!(reloaded.doc().edges, saved.edges);
    assert_eq!(reloaded.doc().node(&t).unwrap().label.as_deref(), Some("Act I"));
}
