//! End-to-end search flows through the runtime: debounce, paging, the
//! sentinel and stale responses.

use std::{sync::Arc, time::Duration};

use epicsearch::{
    core::error::FetchError,
    domain::ProductId,
    model::{catalog::Catalog, search_session::SessionSettings},
    presentation::virtual_dom::VirtualDom,
    test_helpers::{page, products, FakeCatalog, RecordingHost},
    Runtime,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn runtime_with(
    catalog: &FakeCatalog,
    host: &RecordingHost,
    page_size: usize,
) -> Runtime<VirtualDom> {
    let settings = SessionSettings {
        page_size,
        ..SessionSettings::default()
    };
    Runtime::new(
        Catalog::new(7, settings, 0.1),
        VirtualDom::new(720),
        Arc::new(catalog.clone()),
        Arc::new(host.clone()),
        CancellationToken::new(),
    )
}

fn ids(range: std::ops::RangeInclusive<i64>) -> Vec<ProductId> {
    range.map(ProductId).collect()
}

#[tokio::test(start_paused = true)]
async fn test_twenty_plus_five_detaches_sentinel() {
    let catalog = FakeCatalog::new()
        .with_page("bolt", 0, page(products(1, 20, "A"), true))
        .with_page("bolt", 20, page(products(21, 5, "A"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 20);

    runtime.submit_query("bolt");
    runtime.run_until_idle().await;

    assert_eq!(runtime.view().visible_ids(), ids(1..=20));
    assert!(runtime.view().sentinel().is_some());
    assert_eq!(runtime.catalog().session().offset(), 20);

    // Top of the list: the sentinel is out of view and nothing is fetched
    runtime.scroll_to(0);
    assert_eq!(catalog.search_calls().len(), 1);

    runtime.scroll_to_bottom();
    runtime.run_until_idle().await;

    assert_eq!(runtime.view().visible_ids(), ids(1..=25));
    assert_eq!(runtime.view().sentinel(), None);
    assert_eq!(runtime.catalog().session().offset(), 25);
    assert!(!runtime.catalog().session().has_more());
    let offsets: Vec<usize> = catalog.search_calls().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 20]);

    // Nothing left to load
    runtime.scroll_to_bottom();
    runtime.load_more();
    runtime.run_until_idle().await;
    assert_eq!(catalog.search_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_offset_is_cumulative_page_sizes() {
    let catalog = FakeCatalog::new()
        .with_page("nut", 0, page(products(1, 3, "A"), true))
        .with_page("nut", 3, page(products(4, 4, "A"), true))
        .with_page("nut", 7, page(products(8, 2, "A"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 50);

    // Every page is shorter than the viewport, so the sentinel stays in view
    runtime.submit_query("nut");
    runtime.run_until_idle().await;

    let offsets: Vec<usize> = catalog.search_calls().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 3, 7]);
    assert_eq!(runtime.catalog().session().offset(), 9);
    assert_eq!(runtime.view().visible_ids(), ids(1..=9));
}

#[tokio::test(start_paused = true)]
async fn test_stale_page_is_not_appended_after_new_query() {
    let catalog = FakeCatalog::new()
        .with_delayed_page(
            "bolt",
            0,
            Duration::from_secs(2),
            page(products(1, 3, "A"), false),
        )
        .with_page("nut", 0, page(products(100, 2, "B"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 50);

    runtime.submit_query("bolt");
    // Debounce fires and the slow fetch for "bolt" starts
    assert!(runtime.next().await);
    assert!(runtime.catalog().session().is_loading());

    runtime.submit_query("nut");
    runtime.run_until_idle().await;

    assert_eq!(runtime.view().visible_ids(), ids(100..=101));
    assert_eq!(runtime.catalog().session().query(), "nut");
    assert_eq!(runtime.catalog().session().offset(), 2);
    assert_eq!(runtime.catalog().results().len(), 2);
    let queries: Vec<String> = catalog
        .search_calls()
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(queries, vec![String::from("bolt"), String::from("nut")]);
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_within_debounce_issue_one_search() {
    let catalog = FakeCatalog::new().with_page("bolt", 0, page(products(1, 2, "A"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 50);

    for input in ["b", "bo", "bol", "bolt"] {
        runtime.submit_query(input);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    runtime.run_until_idle().await;

    let queries: Vec<String> = catalog
        .search_calls()
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(queries, vec![String::from("bolt")]);
    assert_eq!(runtime.view().visible_ids(), ids(1..=2));
}

#[tokio::test(start_paused = true)]
async fn test_short_first_page_loads_next_without_scrolling() {
    let catalog = FakeCatalog::new()
        .with_page("bolt", 0, page(products(1, 2, "A"), true))
        .with_page("bolt", 2, page(products(3, 2, "A"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 2);

    runtime.submit_query("bolt");
    runtime.run_until_idle().await;

    let offsets: Vec<usize> = catalog.search_calls().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 2]);
    assert_eq!(runtime.view().visible_ids(), ids(1..=4));
    assert_eq!(runtime.view().sentinel(), None);
    assert_eq!(runtime.view().scroll_top(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_short_query_clears_results() {
    let catalog = FakeCatalog::new().with_page("bolt", 0, page(products(1, 20, "A"), true));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 20);

    runtime.submit_query("bolt");
    runtime.run_until_idle().await;
    assert!(runtime.view().sentinel().is_some());

    runtime.submit_query("b");

    assert!(runtime.view().is_cleared());
    assert_eq!(runtime.view().sentinel(), None);
    assert!(runtime.catalog().results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_shows_nothing_found() {
    let catalog = FakeCatalog::new();
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 50);

    runtime.submit_query("zzz");
    runtime.run_until_idle().await;

    assert!(runtime.view().message().is_some());
    assert!(runtime.view().visible_ids().is_empty());
    assert!(host.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_continuation_keeps_cards_and_alerts() {
    let catalog = FakeCatalog::new()
        .with_page("bolt", 0, page(products(1, 2, "A"), true))
        .with_failed_page("bolt", 2, FetchError::Request("connection reset".into()));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 2);

    // The short first page puts the sentinel in view right away
    runtime.submit_query("bolt");
    runtime.run_until_idle().await;

    let offsets: Vec<usize> = catalog.search_calls().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 2]);
    assert_eq!(runtime.view().visible_ids(), ids(1..=2));
    assert_eq!(host.alerts().len(), 1);
    assert!(!runtime.catalog().session().is_loading());
    assert_eq!(runtime.catalog().session().offset(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reloads_from_first_page() {
    let catalog = FakeCatalog::new()
        .with_page("bolt", 0, page(products(1, 2, "A"), true))
        .with_page("bolt", 2, page(products(3, 1, "A"), false));
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 2);

    runtime.submit_query("bolt");
    runtime.run_until_idle().await;
    runtime.scroll_to_bottom();
    runtime.refresh();
    runtime.run_until_idle().await;

    let offsets: Vec<usize> = catalog.search_calls().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 2, 0, 2]);
    assert_eq!(runtime.view().visible_ids(), ids(1..=3));
    assert_eq!(runtime.view().scroll_top(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_is_retried() {
    let catalog = FakeCatalog::new().with_failed_page(
        "bolt",
        0,
        FetchError::Request("connection reset".into()),
    );
    let host = RecordingHost::new(false);
    let mut runtime = runtime_with(&catalog, &host, 20);

    runtime.submit_query("bolt");
    runtime.run_until_idle().await;
    assert!(runtime.view().message().is_some());

    let catalog = catalog.with_page("bolt", 0, page(products(1, 20, "A"), true));
    runtime.refresh();
    runtime.run_until_idle().await;

    assert_eq!(runtime.view().visible_ids(), ids(1..=20));
    assert!(runtime.view().sentinel().is_some());

    // Retyping the same query after a failure also searches again
    let catalog = catalog.with_failed_page("nut", 0, FetchError::Request("timeout".into()));
    runtime.submit_query("nut");
    runtime.run_until_idle().await;
    let catalog = catalog.with_page("nut", 0, page(products(50, 1, "B"), false));
    runtime.submit_query("nut");
    runtime.run_until_idle().await;

    assert_eq!(runtime.view().visible_ids(), ids(50..=50));
    let queries: Vec<(String, usize)> = catalog
        .search_calls()
        .into_iter()
        .map(|r| (r.query, r.offset))
        .collect();
    assert_eq!(
        queries,
        vec![
            (String::from("bolt"), 0),
            (String::from("bolt"), 0),
            (String::from("nut"), 0),
            (String::from("nut"), 0),
        ]
    );
}
