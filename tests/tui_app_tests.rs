// Tests for the TUI state built on top of the tracker

mod common;

use common::{FakeScraper, scraped, tracker};
use serde_json::json;
use watch_tracker::models::TrackedItemId;
use watch_tracker::storage::KeyValueStore;
use watch_tracker::tracker::{Intent, NotificationKind};
use watch_tracker::tui::app::App;

#[tokio::test]
async fn test_app_opens_with_unreachable_member() {
    let scraper = FakeScraper::new()
        .with_item(scraped(1, "One", 2, 0))
        .with_item(scraped(2, "Two", 2, 0));
    let (mut tracker, scraper, store) = tracker(scraper).await;
    tracker.handle(Intent::Add(TrackedItemId(1))).await;
    tracker.handle(Intent::Add(TrackedItemId(2))).await;

    store.remove("item:2").await.unwrap();
    scraper.fail(2);

    let app = App::load(tracker).await;

    assert_eq!(app.list_name, "default");
    assert_eq!(app.list_names, vec!["default"]);
    let ids: Vec<TrackedItemId> = app.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![TrackedItemId(1)]);
    assert_eq!(app.table_state.selected(), Some(0));

    let status = app.status.as_ref().unwrap();
    assert_eq!(status.kind, NotificationKind::Failure);
    assert_eq!(status.message, "1 item(s) in 'default' could not be loaded");
}

#[tokio::test]
async fn test_app_opens_with_corrupt_cached_record() {
    let (mut tracker, _scraper, store) =
        tracker(FakeScraper::new().with_item(scraped(1, "One", 2, 0))).await;
    tracker.handle(Intent::Add(TrackedItemId(1))).await;
    store.set("item:1", json!({"id": "broken"})).await.unwrap();

    let app = App::load(tracker).await;

    assert!(app.records.is_empty());
    assert_eq!(app.table_state.selected(), None);
    assert!(app.status.as_ref().unwrap().is_failure());
}

#[tokio::test]
async fn test_app_opens_on_selected_list() {
    let (mut tracker, _scraper, _store) =
        tracker(FakeScraper::new().with_item(scraped(1, "One", 2, 0))).await;
    tracker
        .handle(Intent::CreateList("seasonal".to_string()))
        .await;
    tracker
        .handle(Intent::SwitchList("seasonal".to_string()))
        .await;
    tracker.handle(Intent::Add(TrackedItemId(1))).await;

    let app = App::load(tracker).await;

    assert_eq!(app.list_name, "seasonal");
    assert_eq!(app.list_names, vec!["default", "seasonal"]);
    assert_eq!(app.records.len(), 1);
    let status = app.status.as_ref().unwrap();
    assert_eq!(status.kind, NotificationKind::Success);
    assert_eq!(status.message, "Showing 'seasonal'");
}
