//! Integration tests for cross-tab synchronization.
//!
//! Sessions opened on clones of one `MemoryStorage` (or on one directory
//! through `FileStorage`) behave like tabs of the same browser profile.

use std::sync::Arc;
use std::time::Duration;

use shopaholic_core::ProductId;
use shopaholic_integration_tests::{product, user};
use shopaholic_storefront::storage::{FileStorage, MemoryStorage, Storage, TabId};
use shopaholic_storefront::sync::SyncState;
use shopaholic_storefront::{ChangeSource, SessionEvent, StorefrontSession};

fn tabs() -> (StorefrontSession, StorefrontSession) {
    let storage = MemoryStorage::new();
    (
        StorefrontSession::open(Arc::new(storage.clone())),
        StorefrontSession::open(Arc::new(storage)),
    )
}

#[test]
fn test_cart_change_reaches_other_tab() {
    let (mut first, mut second) = tabs();
    let mut second_events = second.subscribe();
    let pepsi = product("1", "Cool Drinks", "Pepsi", 100);

    first.add_or_increment(&pepsi).expect("save failed");
    first.add_or_increment(&pepsi).expect("save failed");

    assert!(second.sync());
    assert_eq!(second.cart().quantity_of(&pepsi.id), 2);
    assert_eq!(second.totals(), first.totals());
    assert_eq!(
        second_events.try_recv().expect("no event"),
        SessionEvent::Cart(ChangeSource::OtherTab)
    );
    assert_eq!(second.sync_state(), SyncState::Idle);
}

#[test]
fn test_originating_tab_does_not_reload() {
    let (mut first, _second) = tabs();
    let mut events = first.subscribe();

    first
        .add_or_increment(&product("1", "Cool Drinks", "Pepsi", 100))
        .expect("save failed");

    assert!(!first.sync());
    assert_eq!(
        events.try_recv().expect("no event"),
        SessionEvent::Cart(ChangeSource::Local)
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_last_write_wins() {
    let (mut first, mut second) = tabs();
    let pepsi = product("1", "Cool Drinks", "Pepsi", 100);
    let coke = product("2", "Cool Drinks", "Coca Cola", 5000);

    // Both tabs start from an empty cart and write without syncing.
    first.add_or_increment(&pepsi).expect("save failed");
    second.add_or_increment(&coke).expect("save failed");

    first.sync();
    assert_eq!(first.cart().quantity_of(&pepsi.id), 0);
    assert_eq!(first.cart().quantity_of(&coke.id), 1);
}

#[test]
fn test_other_scope_is_not_watched() {
    let storage = MemoryStorage::new();
    let mut first = StorefrontSession::open(Arc::new(storage.clone()));
    let mut second = StorefrontSession::open(Arc::new(storage.clone()));

    first
        .sign_in(user("Asha", "asha@example.com"))
        .expect("sign in failed");
    assert!(second.sync());
    assert!(second.user().is_some());

    // A guest-cart write elsewhere is irrelevant to a logged-in tab.
    storage.set("cart", "[]", TabId::new()).expect("write failed");
    assert!(!second.sync());
}

#[test]
fn test_logout_in_other_tab_switches_to_guest_cart() {
    let (mut first, mut second) = tabs();
    let pepsi = product("1", "Cool Drinks", "Pepsi", 100);
    second.add_or_increment(&pepsi).expect("save failed");
    first.sync();

    first
        .sign_in(user("Asha", "asha@example.com"))
        .expect("sign in failed");
    second.sync();
    assert!(second.cart().is_empty());

    first.logout().expect("logout failed");
    assert!(second.sync());
    assert!(second.user().is_none());
    assert_eq!(second.cart().quantity_of(&pepsi.id), 1);
}

#[tokio::test]
async fn test_next_sync_waits_for_other_tab() {
    let storage = MemoryStorage::new();
    let mut watcher = StorefrontSession::open(Arc::new(storage.clone()));
    let mut writer = StorefrontSession::open(Arc::new(storage));
    let id = ProductId::new("7");

    let writer_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        writer
            .add_or_increment(&product("7", "Wine", "Merlot", 700))
            .expect("save failed");
    });

    let synced = tokio::time::timeout(Duration::from_secs(2), watcher.next_sync())
        .await
        .expect("timed out waiting for sync");
    assert!(synced);
    assert_eq!(watcher.cart().quantity_of(&id), 1);
    writer_task.await.expect("writer panicked");
}

#[test]
fn test_file_storage_tabs_share_state() {
    let dir = std::env::temp_dir().join(format!("shopaholic-cross-tab-{}", TabId::new()));
    let storage = FileStorage::open(&dir).expect("open failed");
    let mut first = StorefrontSession::open(Arc::new(storage.clone()));
    let mut second = StorefrontSession::open(Arc::new(storage));
    let pepsi = product("1", "Cool Drinks", "Pepsi", 100);

    first.add_or_increment(&pepsi).expect("save failed");
    assert!(second.sync());
    assert_eq!(second.cart().quantity_of(&pepsi.id), 1);

    // A later process sees the same cart.
    let reopened = StorefrontSession::open(Arc::new(FileStorage::open(&dir).expect("open failed")));
    assert_eq!(reopened.cart().quantity_of(&pepsi.id), 1);

    std::fs::remove_dir_all(dir).expect("cleanup failed");
}
