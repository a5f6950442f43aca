//! Concurrent relevance scoring.
//!
//! Every note is scored independently against a lowercased query: a title
//! match is worth [`SCORE_TITLE_MATCH`], a content match [`SCORE_CONTENT_MATCH`].
//! Notes are split into one chunk per worker and scored on
//! `JoinSet::spawn_blocking` tasks. Each worker returns its own hits and the
//! caller merges them after every worker has finished, so no map is shared
//! between threads.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, instrument, trace, Span};

use jotter_core::defaults::{SCORER_FALLBACK_WORKERS, SCORE_CONTENT_MATCH, SCORE_TITLE_MATCH};
use jotter_core::logging::WORKER_COUNT;
use jotter_core::{Error, Note, Result};

use crate::source::NoteSource;

/// Note id to relevance score. Notes scoring zero are absent.
pub type ScoreMap = HashMap<i64, u32>;

/// Score one note against an already lowercased query.
pub fn score_note(note: &Note, needle: &str) -> u32 {
    let mut score = 0;
    if note.title.to_lowercase().contains(needle) {
        score += SCORE_TITLE_MATCH;
    }
    if note.content.to_lowercase().contains(needle) {
        score += SCORE_CONTENT_MATCH;
    }
    score
}

/// Scorer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorerConfig {
    /// Upper bound on blocking workers per scoring pass.
    pub workers: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(SCORER_FALLBACK_WORKERS);
        Self { workers }
    }
}

impl ScorerConfig {
    /// Set the worker count. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

fn score_chunk(notes: &[Note], needle: &str, token: &CancellationToken) -> Vec<(i64, u32)> {
    let mut hits = Vec::new();
    for note in notes {
        if token.is_cancelled() {
            break;
        }
        let score = score_note(note, needle);
        trace!(note_id = note.id, score, "Scored note");
        if score > 0 {
            hits.push((note.id, score));
        }
    }
    hits
}

/// Scores the full note set of a [`NoteSource`].
pub struct NoteScorer<S: ?Sized> {
    source: Arc<S>,
    config: ScorerConfig,
}

impl<S: NoteSource + ?Sized> NoteScorer<S> {
    pub fn new(source: Arc<S>, config: ScorerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score every note against `query`, case-insensitively.
    ///
    /// Returns [`Error::Cancelled`] if `token` is raised at any point before
    /// the merged map is handed back; partial results are discarded.
    #[instrument(skip(self, token), fields(
        subsystem = "search",
        component = "scorer",
        op = "score",
        worker_count = field::Empty,
    ))]
    pub async fn score(&self, query: &str, token: &CancellationToken) -> Result<ScoreMap> {
        let start = Instant::now();

        let notes = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Cancelled),
            notes = self.source.load_all() => notes?,
        };
        let note_count = notes.len();

        let workers = self.config.workers.clamp(1, note_count.max(1));
        let mut chunks: Vec<Vec<Note>> = (0..workers).map(|_| Vec::new()).collect();
        for (i, note) in notes.into_iter().enumerate() {
            chunks[i % workers].push(note);
        }
        Span::current().record(WORKER_COUNT, workers);

        let needle: Arc<str> = Arc::from(query.to_lowercase());
        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let needle = Arc::clone(&needle);
            let token = token.clone();
            tasks.spawn_blocking(move || score_chunk(&chunk, &needle, &token));
        }

        let mut scores = ScoreMap::new();
        while let Some(joined) = tasks.join_next().await {
            scores.extend(joined?);
        }

        if token.is_cancelled() {
            debug!("Scoring cancelled, discarding partial results");
            return Err(Error::Cancelled);
        }

        debug!(
            note_count,
            result_count = scores.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Scoring complete"
        );
        Ok(scores)
    }
}
