//! Read access to notes for scoring and re-fetch.

use async_trait::async_trait;

use jotter_core::{Note, NoteRepository, Result};

/// Notes visible to the search pipeline.
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Every note, with tags attached.
    async fn load_all(&self) -> Result<Vec<Note>>;

    /// One note with tags, or `None` if it no longer exists.
    async fn load(&self, id: i64) -> Result<Option<Note>>;
}

#[async_trait]
impl<T: NoteRepository> NoteSource for T {
    async fn load_all(&self) -> Result<Vec<Note>> {
        self.list_all().await
    }

    async fn load(&self, id: i64) -> Result<Option<Note>> {
        match self.get(id).await {
            Ok(note) => Ok(Some(note)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
