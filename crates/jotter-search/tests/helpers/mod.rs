//! Test helpers for search session tests.
//!
//! Provides an in-memory [`NoteSource`] whose bulk load can be held open, so
//! tests can cancel or supersede a search at a known point.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use jotter_search::{Note, NoteSource, Result};

pub fn note(id: i64, title: &str, content: &str) -> Note {
    let now = Utc::now();
    Note {
        id,
        title: title.to_string(),
        content: content.to_string(),
        created_at: now,
        modified_at: now,
        is_favorite: false,
        tags: Vec::new(),
    }
}

/// The three-note set used across search tests.
pub fn budget_notes() -> Vec<Note> {
    vec![
        note(1, "Budget Report", "q3 numbers"),
        note(2, "Notes", "budget meeting"),
        note(3, "Groceries", "milk"),
    ]
}

const NO_HELD_FETCH: i64 = 0;

/// In-memory note store that can hold the next bulk load or one note's fetch.
pub struct GatedSource {
    notes: Vec<Note>,
    removed: Mutex<HashSet<i64>>,
    hold_next_load: AtomicBool,
    load_started: Notify,
    held_fetch: AtomicI64,
    fetch_started: Notify,
    loads: AtomicUsize,
    fetches: AtomicUsize,
}

impl GatedSource {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            notes,
            removed: Mutex::new(HashSet::new()),
            hold_next_load: AtomicBool::new(false),
            load_started: Notify::new(),
            held_fetch: AtomicI64::new(NO_HELD_FETCH),
            fetch_started: Notify::new(),
            loads: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make the next `load_all` wait until its search is cancelled.
    pub fn hold_next_load(&self) {
        self.hold_next_load.store(true, Ordering::SeqCst);
    }

    /// Wait until a held `load_all` has started.
    pub async fn wait_for_held_load(&self) {
        self.load_started.notified().await;
    }

    /// Make the next fetch of note `id` wait until its search is cancelled.
    pub fn hold_fetch(&self, id: i64) {
        self.held_fetch.store(id, Ordering::SeqCst);
    }

    /// Wait until a held single-note fetch has started.
    pub async fn wait_for_held_fetch(&self) {
        self.fetch_started.notified().await;
    }

    /// Hide a note from single-note fetches while it still appears in bulk loads.
    pub fn remove_after_scoring(&self, id: i64) {
        self.removed.lock().unwrap().insert(id);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteSource for GatedSource {
    async fn load_all(&self) -> Result<Vec<Note>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.hold_next_load.swap(false, Ordering::SeqCst) {
            self.load_started.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(self.notes.clone())
    }

    async fn load(&self, id: i64) -> Result<Option<Note>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self
            .held_fetch
            .compare_exchange(id, NO_HELD_FETCH, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.fetch_started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.removed.lock().unwrap().contains(&id) {
            return Ok(None);
        }
        Ok(self.notes.iter().find(|n| n.id == id).cloned())
    }
}
