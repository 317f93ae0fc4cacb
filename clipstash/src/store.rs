//! ClipboardStore - the single writable owner of clipboard history
//!
//! Concurrency Model:
//! - All state lives behind one `parking_lot::Mutex`; every read and write
//!   (polling inserts, user edits, clears) serializes on it, so the retention
//!   recomputation never interleaves with another mutation.
//! - Persistence runs after the in-memory change, still under the lock so saves
//!   land in mutation order. A failed save is logged and never rolls back
//!   memory state or reaches the caller.
//! - Filtered views are cached per revision; any mutation bumps the revision.
//! - The effective poll interval is published on a `watch` channel so a running
//!   watcher follows config changes.

use crate::config::{ClearPolicy, StashConfig};
use crate::database::MemoryPersistence;
use crate::interface::{ClipboardPayload, PersistError, Persistence, Selection};
use crate::models::{ClipboardItem, ItemId, PersistedItem};
use crate::search::filter_items;
use crate::tags::{is_reserved, TagRegistry, TagStyle, FAVORITES_TAG};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Persistence key for the serialized item list
pub const ITEMS_KEY: &str = "ClipboardItems";
/// Persistence key for the custom tag names
pub const CUSTOM_TAGS_KEY: &str = "CustomTags";

struct StoreState {
    /// Newest first by `created_at`
    items: Vec<ClipboardItem>,
    registry: TagRegistry,
    config: StashConfig,
    revision: u64,
}

/// What a mutation touched, so only the affected blobs are rewritten
#[derive(Debug, Clone, Copy, Default)]
struct Changed {
    items: bool,
    custom_tags: bool,
}

struct ViewCache {
    revision: u64,
    selection: Selection,
    query: String,
    items: Vec<ClipboardItem>,
}

pub struct ClipboardStore {
    state: Mutex<StoreState>,
    view_cache: Mutex<Option<ViewCache>>,
    persistence: Arc<dyn Persistence>,
    poll_interval: watch::Sender<Duration>,
}

impl ClipboardStore {
    /// Restore from persistence. Unreadable state yields an empty store.
    pub fn open(persistence: Arc<dyn Persistence>, config: StashConfig) -> Self {
        let mut items = load_items(persistence.as_ref());
        let registry = TagRegistry::from_names(load_custom_tags(persistence.as_ref()));

        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        let evicted = apply_retention(&mut items, config.capacity);

        let (poll_interval, _) = watch::channel(config.poll_interval());
        let store = Self {
            state: Mutex::new(StoreState { items, registry, config, revision: 0 }),
            view_cache: Mutex::new(None),
            persistence,
            poll_interval,
        };

        if evicted > 0 {
            debug!(evicted, "trimmed restored history to capacity");
            let items = store.items();
            store.save_items(&items);
        }
        store
    }

    /// Store backed by a fresh in-process map
    pub fn new_in_memory(config: StashConfig) -> Self {
        Self::open(Arc::new(MemoryPersistence::new()), config)
    }

    /// Run a mutation under the lock, then persist whatever it reported changed
    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState, &mut Changed) -> R) -> R {
        let mut state = self.state.lock();
        let mut changed = Changed::default();
        let result = f(&mut state, &mut changed);

        if changed.items || changed.custom_tags {
            state.revision += 1;
        }
        if changed.items {
            self.save_items(&state.items);
        }
        if changed.custom_tags {
            self.save_custom_tags(&state.registry);
        }
        result
    }

    /// Mutate one item by id. Missing ids are a no-op returning false.
    fn mutate_item(&self, id: ItemId, f: impl FnOnce(&mut ClipboardItem) -> bool) -> bool {
        self.mutate(|state, changed| {
            let Some(item) = state.items.iter_mut().find(|i| i.id() == id) else {
                return false;
            };
            changed.items = f(item);
            changed.items
        })
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let blob = serde_json::to_vec(value)?;
        self.persistence.save(key, &blob)
    }

    fn save_items(&self, items: &[ClipboardItem]) {
        let records: Vec<PersistedItem> = items.iter().map(PersistedItem::from).collect();
        if let Err(e) = self.save_json(ITEMS_KEY, &records) {
            warn!(error = %e, "failed to persist clipboard items");
        }
    }

    fn save_custom_tags(&self, registry: &TagRegistry) {
        if let Err(e) = self.save_json(CUSTOM_TAGS_KEY, registry.custom_tags()) {
            warn!(error = %e, "failed to persist custom tags");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Insert at the front, then evict the oldest non-favorites beyond capacity.
    /// An item whose id is already stored replaces the stored copy.
    /// Returns the number of evicted items.
    pub fn insert(&self, item: ClipboardItem) -> usize {
        self.mutate(|state, changed| {
            changed.items = true;
            state.items.retain(|i| i.id() != item.id());
            state.items.insert(0, item);
            let evicted = apply_retention(&mut state.items, state.config.capacity);
            if evicted > 0 {
                debug!(evicted, capacity = state.config.capacity, "evicted oldest non-favorites");
            }
            evicted
        })
    }

    /// Insert newly captured content unless an item with an identical payload
    /// already exists anywhere in the history. Check and insert are atomic.
    /// Returns none if nothing was stored, including when retention evicts the
    /// new item straight away (capacity 0).
    pub fn capture(&self, payload: ClipboardPayload) -> Option<ClipboardItem> {
        if payload.is_empty() {
            return None;
        }
        self.mutate(|state, changed| {
            if state.items.iter().any(|i| i.payload() == &payload) {
                return None;
            }
            let item = ClipboardItem::new(payload);
            let id = item.id();
            state.items.insert(0, item.clone());
            let evicted = apply_retention(&mut state.items, state.config.capacity);

            let kept = state.items.iter().any(|i| i.id() == id);
            changed.items = kept || evicted > 1;
            if !kept {
                debug!(%id, "captured item did not survive retention");
                return None;
            }
            debug!(%id, kind = ?item.payload().kind(), "captured clipboard item");
            Some(item)
        })
    }

    /// Remove an item. Returns false if it was not present.
    pub fn delete(&self, id: ItemId) -> bool {
        self.mutate(|state, changed| {
            let before = state.items.len();
            state.items.retain(|i| i.id() != id);
            changed.items = state.items.len() != before;
            changed.items
        })
    }

    /// Set the favorite flag, keeping the reserved tag in sync
    pub fn set_favorite(&self, id: ItemId, value: bool) -> bool {
        self.mutate_item(id, |item| item.set_favorite(value))
    }

    /// Flip the favorite flag. Returns the new value, or none for a missing id.
    pub fn toggle_favorite(&self, id: ItemId) -> Option<bool> {
        self.mutate(|state, changed| {
            let item = state.items.iter_mut().find(|i| i.id() == id)?;
            let value = !item.is_favorite();
            item.set_favorite(value);
            changed.items = true;
            Some(value)
        })
    }

    /// Add a tag to one item. The reserved favorites tag routes through the flag.
    pub fn add_tag(&self, id: ItemId, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        if tag == FAVORITES_TAG {
            return self.set_favorite(id, true);
        }
        self.mutate_item(id, |item| item.tags_mut().insert(tag))
    }

    pub fn remove_tag(&self, id: ItemId, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        if tag == FAVORITES_TAG {
            return self.set_favorite(id, false);
        }
        self.mutate_item(id, |item| item.tags_mut().remove(tag))
    }

    /// Store a trimmed note, or clear it when blank
    pub fn set_note(&self, id: ItemId, text: &str) -> bool {
        self.mutate_item(id, |item| item.set_note(text))
    }

    pub fn add_custom_tag(&self, name: &str) -> bool {
        self.mutate(|state, changed| {
            changed.custom_tags = state.registry.add(name);
            changed.custom_tags
        })
    }

    /// Remove a custom tag from the registry and strip it from every item.
    /// Reserved names are left alone.
    pub fn remove_custom_tag(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || is_reserved(name) {
            return false;
        }
        self.mutate(|state, changed| {
            changed.custom_tags = state.registry.remove(name);
            for item in state.items.iter_mut() {
                changed.items |= item.tags_mut().remove(name);
            }
            changed.custom_tags || changed.items
        })
    }

    /// Clear according to the configured [`ClearPolicy`]. Returns removed count.
    pub fn clear(&self) -> usize {
        self.mutate(|state, changed| {
            let before = state.items.len();
            match state.config.clear_policy {
                ClearPolicy::Everything => state.items.clear(),
                ClearPolicy::KeepFavorites => state.items.retain(|i| i.is_favorite()),
            }
            let removed = before - state.items.len();
            changed.items = removed > 0;
            removed
        })
    }

    /// Remove every non-favorite, regardless of the configured policy
    pub fn clear_non_favorites(&self) -> usize {
        self.mutate(|state, changed| {
            let before = state.items.len();
            state.items.retain(|i| i.is_favorite());
            let removed = before - state.items.len();
            changed.items = removed > 0;
            removed
        })
    }

    /// Replace the configuration. A lower capacity evicts immediately, and a
    /// new poll interval is pushed to subscribed watchers.
    pub fn update_config(&self, config: StashConfig) {
        let interval = config.poll_interval();
        self.mutate(|state, changed| {
            let view_changed = state.config.capacity != config.capacity
                || state.config.all_view_policy != config.all_view_policy;
            state.config = config;
            let evicted = apply_retention(&mut state.items, state.config.capacity);
            changed.items = evicted > 0;
            if view_changed && !changed.items {
                // Views depend on capacity and policy even when no item moved
                state.revision += 1;
            }
        });
        self.poll_interval.send_if_modified(|current| {
            if *current == interval {
                return false;
            }
            *current = interval;
            true
        });
    }

    /// Receiver for the effective (clamped) poll interval
    pub fn subscribe_poll_interval(&self) -> watch::Receiver<Duration> {
        self.poll_interval.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Snapshot of every item, newest first
    pub fn items(&self) -> Vec<ClipboardItem> {
        self.state.lock().items.clone()
    }

    pub fn get(&self, id: ItemId) -> Option<ClipboardItem> {
        self.state.lock().items.iter().find(|i| i.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_payload(&self, payload: &ClipboardPayload) -> bool {
        self.state.lock().items.iter().any(|i| i.payload() == payload)
    }

    pub fn config(&self) -> StashConfig {
        self.state.lock().config.clone()
    }

    /// Bumped by every state change
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    pub fn custom_tags(&self) -> Vec<String> {
        self.state.lock().registry.custom_tags().to_vec()
    }

    /// Sorted union of built-in, custom and in-use tag names
    pub fn all_tags(&self) -> Vec<String> {
        let state = self.state.lock();
        state.registry.all_tags(state.items.iter().flat_map(|i| i.tags().iter()))
    }

    pub fn tag_style(&self, name: &str) -> TagStyle {
        self.state.lock().registry.style(name)
    }

    /// Filtered view, served from cache while the store is unchanged
    pub fn view(&self, selection: &Selection, query: &str) -> Vec<ClipboardItem> {
        let state = self.state.lock();
        let mut cache = self.view_cache.lock();

        if let Some(cached) = cache.as_ref() {
            if cached.revision == state.revision && &cached.selection == selection && cached.query == query {
                return cached.items.clone();
            }
        }

        let items = filter_items(&state.items, selection, query, state.config.filter_options());
        *cache = Some(ViewCache {
            revision: state.revision,
            selection: selection.clone(),
            query: query.to_string(),
            items: items.clone(),
        });
        items
    }
}

/// Keep every favorite and the first `capacity` non-favorites in list order,
/// then re-sort newest first. Recomputed from scratch each call.
/// Returns how many items were dropped.
fn apply_retention(items: &mut Vec<ClipboardItem>, capacity: usize) -> usize {
    let before = items.len();
    let mut kept_non_favorites = 0usize;
    items.retain(|item| {
        if item.is_favorite() {
            return true;
        }
        kept_non_favorites += 1;
        kept_non_favorites <= capacity
    });
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    before - items.len()
}

fn load_json<T: DeserializeOwned>(persistence: &dyn Persistence, key: &str) -> Result<Option<T>, PersistError> {
    match persistence.load(key)? {
        Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
        None => Ok(None),
    }
}

fn load_items(persistence: &dyn Persistence) -> Vec<ClipboardItem> {
    let records: Vec<PersistedItem> = match load_json(persistence, ITEMS_KEY) {
        Ok(records) => records.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to load clipboard items, starting empty");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(|record| match ClipboardItem::try_from(record) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "skipping unreadable clipboard item");
                None
            }
        })
        .collect()
}

fn load_custom_tags(persistence: &dyn Persistence) -> Vec<String> {
    match load_json(persistence, CUSTOM_TAGS_KEY) {
        Ok(names) => names.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to load custom tags");
            Vec::new()
        }
    }
}
