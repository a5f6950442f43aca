//! Core data models for jotter.
//!
//! These types are shared across all jotter crates and represent
//! the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note with its distinct set of tags eagerly attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update, never regresses.
    pub modified_at: DateTime<Utc>,
    pub is_favorite: bool,
    /// Distinct tags, ordered by name then id.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Note {
    /// Whether the note carries the given tag.
    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    /// Ids of the attached tags, in display order.
    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag definition. Names are unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Association row linking one note to one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteTag {
    pub note_id: i64,
    pub tag_id: i64,
}

impl NoteTag {
    pub fn new(note_id: i64, tag_id: i64) -> Self {
        Self { note_id, tag_id }
    }
}
