//! Cancellable, ranked search.
//!
//! A [`SearchSession`] owns at most one in-flight search. Starting a new
//! search cancels the previous one, so a caller typing a query only ever
//! receives results for the latest input.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, Span};

use jotter_core::logging::{DURATION_MS, RESULT_COUNT};
use jotter_core::{Error, Note, Result};

use crate::scorer::{NoteScorer, ScoreMap, ScorerConfig};
use crate::source::NoteSource;

/// A note with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedNote {
    pub note: Note,
    pub score: u32,
}

/// Order scored ids by descending score, ties by ascending id.
pub fn rank_scores(scores: &ScoreMap) -> Vec<(i64, u32)> {
    let mut ranked: Vec<(i64, u32)> = scores.iter().map(|(&id, &score)| (id, score)).collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// Search entry point with last-search-wins cancellation.
pub struct SearchSession<S: ?Sized> {
    source: Arc<S>,
    scorer: NoteScorer<S>,
    current: Mutex<Option<CancellationToken>>,
}

impl<S: NoteSource + ?Sized> SearchSession<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_config(source, ScorerConfig::default())
    }

    pub fn with_config(source: Arc<S>, config: ScorerConfig) -> Self {
        Self {
            scorer: NoteScorer::new(Arc::clone(&source), config),
            source,
            current: Mutex::new(None),
        }
    }

    /// Cancel the in-flight search, if any.
    pub fn cancel(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = previous {
            debug!(
                subsystem = "search",
                component = "session",
                op = "cancel",
                "Search cancelled"
            );
            token.cancel();
        }
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }

    /// Score, rank, and re-fetch every note matching `query`.
    ///
    /// Cancels any search still running on this session. Notes deleted
    /// between scoring and re-fetch are left out. A search cancelled before
    /// it completes returns [`Error::Cancelled`].
    #[instrument(skip(self), fields(
        subsystem = "search",
        component = "session",
        op = "search",
        result_count = field::Empty,
        duration_ms = field::Empty,
    ))]
    pub async fn search(&self, query: &str) -> Result<Vec<RankedNote>> {
        let start = Instant::now();
        let token = self.begin();

        let scores = self.scorer.score(query, &token).await?;
        let ranked = rank_scores(&scores);

        let mut results = Vec::with_capacity(ranked.len());
        for (id, score) in ranked {
            let note = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                note = self.source.load(id) => note?,
            };
            match note {
                Some(note) => results.push(RankedNote { note, score }),
                None => debug!(note_id = id, "Scored note no longer exists, skipping"),
            }
        }

        let span = Span::current();
        span.record(RESULT_COUNT, results.len());
        span.record(DURATION_MS, start.elapsed().as_millis() as u64);
        info!("Search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_scores_descending_with_id_tiebreak() {
        let scores: ScoreMap = [(7, 1), (3, 2), (5, 3), (1, 1), (2, 3)].into_iter().collect();
        assert_eq!(
            rank_scores(&scores),
            vec![(2, 3), (5, 3), (3, 2), (1, 1), (7, 1)]
        );
    }

    #[test]
    fn test_rank_scores_empty() {
        assert!(rank_scores(&ScoreMap::new()).is_empty());
    }
}
