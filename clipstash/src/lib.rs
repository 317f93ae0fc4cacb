//! ClipStash Core - clipboard history engine
//!
//! Watches the system clipboard, classifies captured text and images into
//! semantic tags, keeps a capacity-bounded history in which favorites are never
//! evicted, and derives filtered views for the host UI.
//!
//! The host supplies clipboard access, persistence and notifications through
//! the traits in [`interface`].

pub mod config;
pub mod content_detection;
pub mod database;
pub mod interface;
pub mod models;
pub mod search;
pub mod store;
pub mod tags;
pub mod watcher;

pub use config::{ClearPolicy, StashConfig};
pub use database::{MemoryPersistence, SqlitePersistence};
pub use interface::*;
pub use models::{ClipboardItem, ItemId, TagSet};
pub use search::{filter_items, AllViewPolicy, FilterOptions};
pub use store::ClipboardStore;
pub use tags::{TagCategory, TagRegistry, TagStyle, FAVORITES_TAG};
pub use watcher::PasteboardWatcher;
