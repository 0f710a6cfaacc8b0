use objekt_grid_foundation::{ColumnPolicy, EdgePadding, FetchAffordance, GridConfig};
use objekt_grid_testing::prelude::*;

// Four 100px columns (430px wide with 10px gaps), square cards, no padding.
fn harness(source: &ScriptedPageSource) -> GridHarness {
    GridHarness::with_config(
        source.clone(),
        430.0,
        300.0,
        GridConfig::default()
            .with_columns(ColumnPolicy::Fixed(4))
            .with_card_metrics(10.0, 1.0)
            .with_edge_padding(EdgePadding::ZERO),
    )
}

#[test]
fn fires_once_per_visibility_episode() {
    let source = ScriptedPageSource::manual();
    let mut h = harness(&source);

    // First page still loading: sentinel visible but nothing to fetch yet.
    let frame = h.frame();
    assert!(frame.sentinel_visible);
    assert!(!frame.fetch_triggered);
    assert_eq!(source.call_count(), 1);

    source.resolve_page(items(1, 8), Some(1));
    let frame = h.frame();
    assert_eq!(frame.row_count(), 2);
    assert!(frame.fetch_triggered);
    assert_eq!(source.call_count(), 2);

    // Still visible while the request is pending.
    let frame = h.frame();
    assert!(!frame.fetch_triggered);
    assert_eq!(frame.affordance, FetchAffordance::Fetching);

    // Out and back in while still pending.
    h.scroll_to(5000.0);
    assert!(!h.frame().sentinel_visible);
    h.scroll_to(0.0);
    let frame = h.frame();
    assert!(frame.sentinel_visible);
    assert!(!frame.fetch_triggered);
    assert_eq!(source.call_count(), 2);

    // The page lands; the next visible pass may fetch again.
    source.resolve_page(items(9, 8), Some(2));
    let frame = h.frame();
    assert_eq!(frame.row_count(), 4);
    assert!(frame.fetch_triggered);
    assert_eq!(source.calls(), vec![None, Some(1), Some(2)]);
}

#[test]
fn refires_when_page_grows_while_visible() {
    let source = ScriptedPageSource::manual();
    let mut h = harness(&source);

    source.resolve_page(items(1, 4), Some(1));
    assert!(h.frame().fetch_triggered);
    source.resolve_page(items(5, 4), Some(2));
    assert!(h.frame().fetch_triggered);
    source.resolve_page(items(9, 4), None);

    let frame = h.frame();
    assert!(!frame.fetch_triggered);
    assert_eq!(frame.affordance, FetchAffordance::Exhausted);
    assert_eq!(source.call_count(), 3);
}

#[test]
fn sentinel_far_below_viewport_does_not_fire() {
    let source = ScriptedPageSource::catalog(items(1, 200), 40);
    let mut h = harness(&source);

    let frame = h.frame();
    assert_eq!(frame.row_count(), 10);
    assert!(!frame.sentinel_visible);
    assert!(!frame.fetch_triggered);
    assert_eq!(frame.affordance, FetchAffordance::ReadyToFetch);
    assert_eq!(source.call_count(), 1);
}

#[test]
fn scrolling_near_the_end_requests_more() {
    let source = ScriptedPageSource::catalog(items(1, 200), 40);
    let mut h = harness(&source);
    h.frame();

    // Rows end at 1000px; viewport bottom 800 + 400 margin reaches it.
    h.scroll_to(500.0);
    let frame = h.frame();
    assert!(frame.sentinel_visible);
    assert!(frame.fetch_triggered);

    let frame = h.frame();
    assert_eq!(frame.pagination.item_count, 80);
    assert_eq!(frame.row_count(), 20);
}

#[test]
fn manual_request_uses_same_guard() {
    let source = ScriptedPageSource::catalog(items(1, 200), 40);
    let mut h = harness(&source);
    h.frame();

    assert!(h.grid_mut().fetch_next_page());
    assert!(!h.grid_mut().fetch_next_page());
    assert_eq!(source.call_count(), 2);
}
