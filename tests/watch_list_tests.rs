// Integration tests for watch list membership and bulk refresh

mod common;

use common::{FakeScraper, fixture, scraped};
use serde_json::json;
use watch_tracker::error::TrackerError;
use watch_tracker::models::{Rating, TrackedItemId};
use watch_tracker::storage::KeyValueStore;
use watch_tracker::watch_list::WatchList;

fn three_items() -> FakeScraper {
    FakeScraper::new()
        .with_item(scraped(1, "One", 3, 1))
        .with_item(scraped(2, "Two", 3, 1))
        .with_item(scraped(3, "Three", 3, 1))
}

#[tokio::test]
async fn test_add_twice_is_rejected() {
    let f = fixture(three_items());
    let mut list = WatchList::new("default");

    list.add(TrackedItemId(1), &f.records).await.unwrap();
    let err = list.add(TrackedItemId(1), &f.records).await.unwrap_err();

    assert!(matches!(
        err,
        TrackerError::DuplicateMember { ref list, id } if list == "default" && id == TrackedItemId(1)
    ));
    assert_eq!(list.len(), 1);
    assert_eq!(f.scraper.calls(), 1);
}

#[tokio::test]
async fn test_add_warms_cache_and_persists() {
    let f = fixture(three_items());
    let mut list = WatchList::new("weekly");

    let record = list.add(TrackedItemId(2), &f.records).await.unwrap();

    assert_eq!(record.title, "Two");
    assert!(f.records.cached(TrackedItemId(2)).await.unwrap().is_some());
    let reloaded = WatchList::load(f.records.kv(), "weekly").await.unwrap();
    assert_eq!(reloaded.ids(), &[TrackedItemId(2)]);
}

#[tokio::test]
async fn test_add_fetch_failure_leaves_list_unchanged() {
    let scraper = three_items();
    scraper.fail(3);
    let f = fixture(scraper);
    let mut list = WatchList::new("default");
    list.add(TrackedItemId(1), &f.records).await.unwrap();

    let err = list.add(TrackedItemId(3), &f.records).await.unwrap_err();

    assert!(err.is_fetch_failure());
    assert_eq!(list.ids(), &[TrackedItemId(1)]);
    let reloaded = WatchList::load(f.records.kv(), "default").await.unwrap();
    assert_eq!(reloaded.ids(), &[TrackedItemId(1)]);
}

#[tokio::test]
async fn test_remove_is_idempotent_and_keeps_record() {
    let f = fixture(three_items());
    let mut list = WatchList::new("default");
    list.add(TrackedItemId(1), &f.records).await.unwrap();

    assert!(list.remove(TrackedItemId(1), &f.records).await.unwrap());
    assert!(!list.remove(TrackedItemId(1), &f.records).await.unwrap());
    assert!(!list.remove(TrackedItemId(42), &f.records).await.unwrap());

    assert!(list.is_empty());
    assert!(f.records.cached(TrackedItemId(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_refresh_all_continues_past_a_failure() {
    let f = fixture(three_items());
    let mut list = WatchList::new("default");
    for id in 1..=3 {
        list.add(TrackedItemId(id), &f.records).await.unwrap();
    }
    f.records.set_rating(TrackedItemId(2), Rating::Three).await.unwrap();
    let item_two_before = f.records.cached(TrackedItemId(2)).await.unwrap().unwrap();

    f.scraper.insert(scraped(1, "One", 4, 4));
    f.scraper.insert(scraped(2, "Two", 4, 4));
    f.scraper.insert(scraped(3, "Three", 4, 4));
    f.scraper.fail(2);

    let report = list.refresh_all(&f.records, 2).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].id, TrackedItemId(2));
    assert!(report.failures[0].error.is_fetch_failure());

    let ids: Vec<TrackedItemId> = report.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![TrackedItemId(1), TrackedItemId(2), TrackedItemId(3)]);
    assert!(report.records[0].all_watched());
    assert_eq!(report.records[1], item_two_before);
    assert!(report.records[2].all_watched());

    assert_eq!(
        f.records.cached(TrackedItemId(2)).await.unwrap(),
        Some(item_two_before)
    );
    assert_eq!(
        report.summary(),
        "Refreshed 2 item(s), 0 already complete, 1 failed"
    );
}

#[tokio::test]
async fn test_refresh_all_counts_policy_skips() {
    let f = fixture(
        FakeScraper::new()
            .with_item(scraped(10, "Airing", 5, 2))
            .with_item(scraped(20, "Done（全3話）", 3, 3)),
    );
    let mut list = WatchList::new("default");
    list.add(TrackedItemId(10), &f.records).await.unwrap();
    list.add(TrackedItemId(20), &f.records).await.unwrap();

    let report = list.refresh_all(&f.records, 4).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.skipped, 1);
    assert!(report.failures.is_empty());
    assert_eq!(f.scraper.calls_for(20), 1);
    assert_eq!(f.scraper.calls_for(10), 2);
}

#[tokio::test]
async fn test_get_list_keeps_order_and_fetches_missing() {
    let f = fixture(three_items());
    f.store
        .set("list:default", json!([3, 1, 2]))
        .await
        .unwrap();

    let list = WatchList::load(f.records.kv(), "default").await.unwrap();
    let records = list.get_list(&f.records).await.unwrap();

    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Three", "One", "Two"]);
    assert_eq!(f.scraper.calls(), 3);
}

#[tokio::test]
async fn test_get_list_fails_on_unreachable_item() {
    let scraper = three_items();
    scraper.fail(2);
    let f = fixture(scraper);
    f.store.set("list:default", json!([1, 2])).await.unwrap();

    let list = WatchList::load(f.records.kv(), "default").await.unwrap();
    let err = list.get_list(&f.records).await.unwrap_err();

    assert!(matches!(err, TrackerError::FetchFailure { id, .. } if id == TrackedItemId(2)));
}

#[tokio::test]
async fn test_load_folds_stored_duplicates() {
    let f = fixture(FakeScraper::new());
    f.store
        .set("list:legacy", json!([1, 2, 1, 3, 2]))
        .await
        .unwrap();

    let list = WatchList::load(f.records.kv(), "legacy").await.unwrap();

    assert_eq!(
        list.ids(),
        &[TrackedItemId(1), TrackedItemId(2), TrackedItemId(3)]
    );
}
