//! Filter Engine
//!
//! Derives an ordered view of the history from a selection (all / favorites /
//! one tag) and a free-text query. Pure: input order is preserved and nothing
//! is mutated.

use crate::interface::Selection;
use crate::models::ClipboardItem;
use serde::Deserialize;

/// How the default `All` view treats old favorites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllViewPolicy {
    /// A favorite drops out of `All` once `capacity` newer non-favorites exist.
    /// It stays reachable through `Favorites` and its tags.
    #[default]
    SlidingWindow,
    /// `All` shows every stored item
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub capacity: usize,
    pub all_view: AllViewPolicy,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            capacity: crate::config::DEFAULT_CAPACITY,
            all_view: AllViewPolicy::default(),
        }
    }
}

/// Apply the selection and then the search query. `items` must be newest-first.
pub fn filter_items(
    items: &[ClipboardItem],
    selection: &Selection,
    query: &str,
    options: FilterOptions,
) -> Vec<ClipboardItem> {
    let selected: Vec<&ClipboardItem> = match selection {
        Selection::Favorites => items.iter().filter(|i| i.is_favorite()).collect(),
        Selection::Tag(name) => items.iter().filter(|i| i.tags().contains(name)).collect(),
        Selection::All => match options.all_view {
            AllViewPolicy::Passthrough => items.iter().collect(),
            AllViewPolicy::SlidingWindow => sliding_window(items, options.capacity),
        },
    };

    if query.is_empty() {
        return selected.into_iter().cloned().collect();
    }

    let needle = query.to_lowercase();

    selected
        .into_iter()
        .filter(|item| matches_query(item, &needle))
        .cloned()
        .collect()
}

/// Single pass over newest-first items, counting non-favorites seen so far
fn sliding_window(items: &[ClipboardItem], capacity: usize) -> Vec<&ClipboardItem> {
    let mut newer_non_favorites = 0usize;
    let mut visible = Vec::with_capacity(items.len());
    for item in items {
        if item.is_favorite() {
            if newer_non_favorites < capacity {
                visible.push(item);
            }
        } else {
            visible.push(item);
            newer_non_favorites += 1;
        }
    }
    visible
}

/// `needle` is already lowercased
fn matches_query(item: &ClipboardItem, needle: &str) -> bool {
    item.display_content().to_lowercase().contains(needle)
        || item.tags().iter().any(|t| t.to_lowercase().contains(needle))
}

/// Preview from content: whitespace runs collapse to one space, truncated to
/// `max_chars` characters.
pub fn generate_preview(content: &str, max_chars: usize) -> String {
    let mut result = String::with_capacity(max_chars.min(content.len()));
    let mut count = 0;
    let mut last_was_space = false;

    for ch in content.trim().chars() {
        if count >= max_chars {
            break;
        }

        let ch = match ch {
            '\n' | '\t' | '\r' => ' ',
            c => c,
        };

        if ch == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }

        result.push(ch);
        count += 1;
    }

    if result.ends_with(' ') {
        result.pop();
    }

    result
}
