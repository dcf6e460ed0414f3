use shelftrack::tracker::now_millis;
use shelftrack::{
    Candidate, DetectionFilter, RawDetectionBuilder, Rect, StoreEvent, TrackerPipeline,
    TrackingStore,
};

fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

fn candidate(left: f32, top: f32, right: f32, bottom: f32) -> Candidate {
    Candidate::new(Rect::new(left, top, right, bottom), 0.9, "Product")
}

#[test]
fn test_basic_tracking() {
    init_logger();
    let mut store = TrackingStore::default();

    // Empty store: one candidate becomes one tracked item
    assert_eq!(store.ingest(vec![candidate(0.0, 0.0, 100.0, 100.0)]), 1);
    assert_eq!(store.count(), 1);
    assert_eq!(store.items()[0].bbox, Rect::new(0.0, 0.0, 100.0, 100.0));

    // Shifted box, IoU ~0.68 with the first: duplicate
    assert_eq!(store.ingest(vec![candidate(10.0, 10.0, 110.0, 110.0)]), 0);
    assert_eq!(store.count(), 1);

    // Disjoint box: new item
    assert_eq!(store.ingest(vec![candidate(500.0, 500.0, 600.0, 600.0)]), 1);
    assert_eq!(store.count(), 2);
    assert!(store.check_invariant());
}

#[test]
fn test_stale_item_is_evicted() {
    init_logger();
    let mut store = TrackingStore::default();
    let now = now_millis();
    store.ingest_at(vec![candidate(0.0, 0.0, 100.0, 100.0)], now - 70_000);

    assert_eq!(store.evict_older_than(60_000), 1);
    assert_eq!(store.count(), 0);
}

#[test]
fn test_count_is_monotonic() {
    init_logger();
    let mut store = TrackingStore::default();
    let frames = [
        vec![candidate(0.0, 0.0, 100.0, 100.0), candidate(5.0, 0.0, 105.0, 100.0)],
        vec![candidate(200.0, 0.0, 300.0, 100.0)],
        vec![candidate(0.0, 0.0, 100.0, 100.0), candidate(400.0, 0.0, 480.0, 90.0)],
    ];

    let mut previous = 0;
    for (i, frame) in frames.into_iter().enumerate() {
        store.ingest_at(frame, i as u64 * 1_000);
        assert!(store.count() >= previous);
        previous = store.count();
    }
    assert_eq!(previous, 3);

    store.evict_older_than_at(60_000, 2_500);
    assert!(store.count() <= previous);
    store.clear();
    assert_eq!(store.count(), 0);
}

#[test]
fn test_filter_then_store() {
    init_logger();
    let filter = DetectionFilter::default();
    let detections = vec![
        // Too small
        RawDetectionBuilder::new().tlwh(0.0, 0.0, 15.0, 15.0).build(),
        // Unlabeled, untracked
        RawDetectionBuilder::new().tlwh(100.0, 100.0, 80.0, 80.0).build(),
        // Unlabeled, tracked, overlapping the previous one
        RawDetectionBuilder::new()
            .tlwh(105.0, 100.0, 80.0, 80.0)
            .tracking_id(1)
            .build(),
        // Labeled but low confidence
        RawDetectionBuilder::new()
            .tlwh(400.0, 400.0, 80.0, 80.0)
            .label("Food", 0.1)
            .build(),
    ];

    let candidates = filter.filter(&detections);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].confidence, 0.5);
    assert_eq!(candidates[1].confidence, 0.7);

    let mut store = TrackingStore::default();
    assert_eq!(store.ingest(candidates), 1);
    assert_eq!(store.items()[0].confidence, 0.5);
    assert_eq!(store.items()[0].label, "Product");
}

#[test]
fn test_pipeline_notifies_subscribers() {
    init_logger();
    let mut pipeline = TrackerPipeline::default();
    let events = pipeline.subscribe();
    let renderer = pipeline.store();

    let frame = vec![
        RawDetectionBuilder::new()
            .tlbr(0.0, 0.0, 100.0, 100.0)
            .label("Home good", 0.8)
            .build(),
    ];
    pipeline.apply::<String>(Ok(frame.clone())).unwrap();
    pipeline.apply::<String>(Ok(frame)).unwrap();
    pipeline.clear();

    let received: Vec<StoreEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![StoreEvent::Added { added: 1, count: 1 }, StoreEvent::Cleared]
    );
    assert_eq!(renderer.count(), 0);
}
