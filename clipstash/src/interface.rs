//! ClipStash public interface
//!
//! Shared types consumed by the host layer, plus the three collaborator traits
//! (clipboard access, persistence, notifications) the host supplies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Discriminator for the two capturable content kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
}

/// Captured clipboard content. Exactly one variant is ever populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Text(String),
    Image(Vec<u8>),
}

impl ClipboardPayload {
    pub fn kind(&self) -> ContentKind {
        match self {
            ClipboardPayload::Text(_) => ContentKind::Text,
            ClipboardPayload::Image(_) => ContentKind::Image,
        }
    }

    /// The text value, if this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClipboardPayload::Text(value) => Some(value),
            ClipboardPayload::Image(_) => None,
        }
    }

    /// The raw image bytes, if this is an image payload
    pub fn as_image(&self) -> Option<&[u8]> {
        match self {
            ClipboardPayload::Text(_) => None,
            ClipboardPayload::Image(data) => Some(data),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ClipboardPayload::Text(value) => value.is_empty(),
            ClipboardPayload::Image(data) => data.is_empty(),
        }
    }
}

/// Which subset of the history a view shows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    All,
    Favorites,
    Tag(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error type for ClipStash operations
#[derive(Debug, Error)]
pub enum ClipStashError {
    #[error("Clipboard error: {0}")]
    ClipboardError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error returned by a [`Persistence`] backend
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<toml::de::Error> for ClipStashError {
    fn from(e: toml::de::Error) -> Self {
        ClipStashError::ConfigError(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATORS (implemented by the host platform layer)
// ═══════════════════════════════════════════════════════════════════════════════

/// Access to the system clipboard.
///
/// `current_change_version` must change whenever any process (including this
/// one) replaces the clipboard contents. Reads return `None` when the format
/// is not present; that is the normal case, not an error.
pub trait ClipboardAccess: Send + Sync {
    fn current_change_version(&self) -> i64;

    fn read_text(&self) -> Option<String>;

    fn read_image_bytes(&self) -> Option<Vec<u8>>;

    fn write_text(&self, text: &str) -> Result<(), ClipStashError>;

    fn write_image_bytes(&self, data: &[u8]) -> Result<(), ClipStashError>;
}

/// Keyed blob storage for the serialized store and custom tags
pub trait Persistence: Send + Sync {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistError>;

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;
}

/// Optional sink for "new item captured" notifications. Delivery is best effort.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body_preview: &str);
}
