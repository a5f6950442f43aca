//! Core traits for jotter abstractions.
//!
//! These traits are the service boundary consumed by the presentation layer.
//! Concrete implementations live in `jotter-db`; fakes implement them in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
}

impl CreateNoteRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Desired state of an existing note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: String,
    pub is_favorite: bool,
}

impl From<&Note> for UpdateNoteRequest {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            is_favorite: note.is_favorite,
        }
    }
}

/// Repository for note CRUD operations.
///
/// Every note returned carries its distinct tags.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// List all notes, ordered by id.
    async fn list_all(&self) -> Result<Vec<Note>>;

    /// Get a note by id. Fails with `NoteNotFound` if absent.
    async fn get(&self, id: i64) -> Result<Note>;

    /// Notes whose title or content contains `term` (case-sensitive).
    async fn search(&self, term: &str) -> Result<Vec<Note>>;

    /// Insert a new note stamped with the current time.
    async fn create(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Overwrite title, content and favorite flag, advancing `modified_at`.
    async fn update(&self, id: i64, req: UpdateNoteRequest) -> Result<Note>;

    /// Set only the favorite flag, advancing `modified_at`.
    async fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<Note>;

    /// Delete a note and its associations. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Notes associated with the given tag.
    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Note>>;

    /// Notes flagged as favorite.
    async fn list_favorites(&self) -> Result<Vec<Note>>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for tag operations and note/tag associations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List all tags, ordered by name.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Create a tag. A case-insensitive name collision is a `ConstraintViolation`.
    async fn create(&self, name: &str) -> Result<Tag>;

    /// Return the tag matching `name` case-insensitively, creating it if absent.
    async fn get_or_create(&self, name: &str) -> Result<Tag>;

    /// Distinct tags of one note, ordered by name.
    async fn list_for_note(&self, note_id: i64) -> Result<Vec<Tag>>;

    /// Associate a tag with a note. Returns false if the pair already existed.
    async fn associate(&self, note_id: i64, tag_id: i64) -> Result<bool>;

    /// Remove an association. Returns false if the pair did not exist.
    async fn disassociate(&self, note_id: i64, tag_id: i64) -> Result<bool>;

    /// Delete a tag and all of its associations atomically.
    /// Returns false if the tag did not exist.
    async fn delete(&self, tag_id: i64) -> Result<bool>;
}
