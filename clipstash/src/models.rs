//! Core data models for ClipStash
//!
//! `ClipboardItem` is the unit of history. Its payload, id and capture time are
//! fixed at construction; only tags, favorite flag and note change afterwards,
//! and only through the store.

use crate::content_detection;
use crate::interface::{ClipboardPayload, ContentKind, PersistError};
use crate::tags::FAVORITES_TAG;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// TAG SET
// ─────────────────────────────────────────────────────────────────────────────

/// Set of tag names that keeps insertion order for stable display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Returns false if the tag was already present
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    /// Returns false if the tag was absent
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CLIPBOARD ITEM
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardItem {
    id: ItemId,
    payload: ClipboardPayload,
    created_at: DateTime<Utc>,
    tags: TagSet,
    is_favorite: bool,
    note: Option<String>,
}

impl ClipboardItem {
    /// Capture new content now, tagged by the classifier
    pub fn new(payload: ClipboardPayload) -> Self {
        Self::with_timestamp(payload, Utc::now())
    }

    pub fn new_text(text: impl Into<String>) -> Self {
        Self::new(ClipboardPayload::Text(text.into()))
    }

    pub fn new_image(data: Vec<u8>) -> Self {
        Self::new(ClipboardPayload::Image(data))
    }

    /// Capture with an explicit creation time (restores, imports, tests)
    pub fn with_timestamp(payload: ClipboardPayload, created_at: DateTime<Utc>) -> Self {
        let tags = content_detection::classify(&payload);
        Self {
            id: Uuid::new_v4(),
            payload,
            created_at,
            tags,
            is_favorite: false,
            note: None,
        }
    }

    /// Mark a not-yet-stored item as favorite
    pub fn into_favorite(mut self) -> Self {
        self.set_favorite(true);
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn payload(&self) -> &ClipboardPayload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Searchable/displayable text: the text itself, or a label for images
    pub fn display_content(&self) -> String {
        match &self.payload {
            ClipboardPayload::Text(text) => text.clone(),
            ClipboardPayload::Image(data) => image_label(data),
        }
    }

    /// Whitespace-normalized preview for notifications and list rows
    pub fn preview(&self, max_chars: usize) -> String {
        crate::search::generate_preview(&self.display_content(), max_chars)
    }

    // Mutators are crate-private: the store is the only writer once inserted.

    /// Returns true if the flag changed
    pub(crate) fn set_favorite(&mut self, value: bool) -> bool {
        let changed = self.is_favorite != value;
        self.is_favorite = value;
        if value {
            self.tags.insert(FAVORITES_TAG);
        } else {
            self.tags.remove(FAVORITES_TAG);
        }
        changed
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    /// Trimmed note, or none for blank input. Returns true if the note changed.
    pub(crate) fn set_note(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        let note = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
        let changed = self.note != note;
        self.note = note;
        changed
    }
}

/// Placeholder label for image content, e.g. "PNG Image"
pub fn image_label(data: &[u8]) -> String {
    match image::guess_format(data) {
        Ok(format) => {
            let name = format
                .extensions_str()
                .first()
                .map(|ext| ext.to_uppercase())
                .unwrap_or_default();
            if name.is_empty() {
                "Image".to_string()
            } else {
                format!("{} Image", name)
            }
        }
        Err(_) => "Image".to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PERSISTED FORM
// ─────────────────────────────────────────────────────────────────────────────

/// Wire form of an item inside the persisted JSON blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistedItem {
    id: Uuid,
    kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Base64-encoded image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    note: Option<String>,
}

impl From<&ClipboardItem> for PersistedItem {
    fn from(item: &ClipboardItem) -> Self {
        let (text, image) = match &item.payload {
            ClipboardPayload::Text(value) => (Some(value.clone()), None),
            ClipboardPayload::Image(data) => (None, Some(BASE64.encode(data))),
        };
        Self {
            id: item.id,
            kind: item.payload.kind(),
            text,
            image,
            created_at: item.created_at,
            tags: item.tags.iter().map(str::to_string).collect(),
            is_favorite: item.is_favorite,
            note: item.note.clone(),
        }
    }
}

impl TryFrom<PersistedItem> for ClipboardItem {
    type Error = PersistError;

    fn try_from(record: PersistedItem) -> Result<Self, Self::Error> {
        let payload = match (record.kind, record.text, record.image) {
            (ContentKind::Text, Some(text), None) => ClipboardPayload::Text(text),
            (ContentKind::Image, None, Some(encoded)) => {
                let data = BASE64
                    .decode(encoded)
                    .map_err(|e| PersistError::Corrupt(format!("item {}: {}", record.id, e)))?;
                ClipboardPayload::Image(data)
            }
            (kind, _, _) => {
                return Err(PersistError::Corrupt(format!(
                    "item {}: payload does not match kind {:?}",
                    record.id, kind
                )))
            }
        };

        let mut item = ClipboardItem {
            id: record.id,
            payload,
            created_at: record.created_at,
            tags: record.tags.into_iter().collect(),
            is_favorite: false,
            note: None,
        };
        // Re-derive the reserved tag from the flag so the two can't disagree
        item.set_favorite(record.is_favorite);
        item.set_note(record.note.as_deref().unwrap_or(""));
        Ok(item)
    }
}
