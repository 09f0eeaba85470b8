use storygraph::config::DEFAULT_HISTORY_LIMIT;
use storygraph::{
    EditorConfig, EntityKind, GraphStore, InMemoryRepository, ManualClock, PatternData, PatternRepository, Point, Size,
};

#[test]
fn oldest_snapshots_are_evicted_at_the_limit() {
    let clock = ManualClock::new(0.0);
    let mut repo = InMemoryRepository::new();
    let p = repo.create_pattern("novel", "Main", PatternData::empty(), 0.0).unwrap();
    let config = EditorConfig::default();
    assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    let mut store = GraphStore::new(EntityKind::characters(), config, repo, clock.clone());
    store.load_pattern(&p.id).unwrap();

    for i in 0..DEFAULT_HISTORY_LIMIT + 5 {
        store.add_rect(Point::new(i as f64 * 10.0, 0.0), Size::new(20.0, 20.0)).unwrap();
        clock.advance(1_000.0);
        store.poll().unwrap();
    }
    assert_eq!(store.history_len(), DEFAULT_HISTORY_LIMIT);

    let mut steps = 0;
    while store.undo() {
        steps += 1;
    }
    assert_eq!(steps, DEFAULT_HISTORY_LIMIT - 1);
    // The empty baseline fell off the front; the oldest kept state has six rects.
    assert_eq!(store.doc().nodes.len(), 6);
}
