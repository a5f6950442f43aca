//! # jotter-search
//!
//! Relevance search over the jotter note set.
//!
//! This crate provides:
//! - [`NoteSource`], the read-only view of notes the search needs, implemented
//!   for every [`NoteRepository`]
//! - [`NoteScorer`], which scores every note against a query on a pool of
//!   blocking workers and honours a [`CancellationToken`]
//! - [`SearchSession`], which ranks scored notes, re-fetches them with tags,
//!   and cancels the previous in-flight search when a new one starts
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jotter_db::Database;
//! use jotter_search::SearchSession;
//!
//! let db = Database::connect("postgres://...").await?;
//! let session = SearchSession::new(Arc::new(db.notes.clone()));
//!
//! for hit in session.search("budget").await? {
//!     println!("{} {}", hit.score, hit.note.title);
//! }
//! ```

pub mod scorer;
pub mod session;
pub mod source;

// Re-export core types
pub use jotter_core::*;

pub use scorer::{score_note, NoteScorer, ScoreMap, ScorerConfig};
pub use session::{rank_scores, RankedNote, SearchSession};
pub use source::NoteSource;
pub use tokio_util::sync::CancellationToken;
