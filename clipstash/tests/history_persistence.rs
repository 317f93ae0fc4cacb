//! On-disk history: SQLite round trips, retention on reopen and clear policies

use clipstash::{
    ClearPolicy, ClipboardPayload, ClipboardStore, Selection, SqlitePersistence, StashConfig,
};
use std::path::Path;
use std::sync::Arc;

fn open(path: &Path, config: StashConfig) -> ClipboardStore {
    let persistence = SqlitePersistence::open(path).unwrap();
    ClipboardStore::open(Arc::new(persistence), config)
}

#[test]
fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");

    let (link_id, image_id) = {
        let store = open(&path, StashConfig::default());
        let link = store.capture(ClipboardPayload::Text("https://example.com".into())).unwrap();
        let image = store.capture(ClipboardPayload::Image(vec![0, 1, 2, 3])).unwrap();
        store.set_favorite(image.id(), true);
        store.add_custom_tag("work");
        store.add_tag(link.id(), "work");
        store.set_note(link.id(), "docs");
        (link.id(), image.id())
    };

    let store = open(&path, StashConfig::default());
    assert_eq!(store.len(), 2);

    let link = store.get(link_id).unwrap();
    assert!(link.tags().contains("Links"));
    assert!(link.tags().contains("work"));
    assert_eq!(link.note(), Some("docs"));

    let image = store.get(image_id).unwrap();
    assert!(image.is_favorite());
    assert_eq!(image.payload().as_image(), Some(&[0u8, 1, 2, 3][..]));

    assert_eq!(store.custom_tags(), vec!["work".to_string()]);
    assert_eq!(store.view(&Selection::Tag("work".into()), "").len(), 1);
}

#[test]
fn test_reopen_with_smaller_capacity_trims_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");

    {
        let store = open(&path, StashConfig::default());
        for i in 0..5 {
            store.capture(ClipboardPayload::Text(format!("entry {}", i)));
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let oldest = store.items().last().unwrap().id();
        store.set_favorite(oldest, true);
    }

    let small = StashConfig { capacity: 2, ..StashConfig::default() };
    let store = open(&path, small.clone());
    let texts: Vec<String> = store.items().iter().map(|i| i.display_content()).collect();
    assert_eq!(texts, vec!["entry 4", "entry 3", "entry 0"]);

    // The trimmed history was written back
    drop(store);
    let store = open(&path, StashConfig::default());
    assert_eq!(store.len(), 3);
}

#[test]
fn test_clear_policies_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");

    let keep = StashConfig { clear_policy: ClearPolicy::KeepFavorites, ..StashConfig::default() };
    {
        let store = open(&path, keep.clone());
        store.capture(ClipboardPayload::Text("plain".into()));
        let fav = store.capture(ClipboardPayload::Text("keep me".into())).unwrap();
        store.toggle_favorite(fav.id());
        assert_eq!(store.clear(), 1);
    }

    let store = open(&path, StashConfig::default());
    assert_eq!(store.len(), 1);
    assert_eq!(store.clear(), 1);
    drop(store);

    assert!(open(&path, StashConfig::default()).is_empty());
}

#[test]
fn test_corrupt_database_blob_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");
    SqlitePersistence::open(&path).unwrap().put("ClipboardItems", b"\x00garbage").unwrap();

    let store = open(&path, StashConfig::default());
    assert!(store.is_empty());

    // Still usable, and the next save replaces the corrupt blob
    store.capture(ClipboardPayload::Text("fresh".into()));
    drop(store);
    assert_eq!(open(&path, StashConfig::default()).len(), 1);
}
