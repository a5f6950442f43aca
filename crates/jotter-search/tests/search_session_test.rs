//! Search session behaviour: ranking, re-fetch, and cancellation.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{budget_notes, note, GatedSource};
use jotter_search::{Error, ScorerConfig, SearchSession};

fn session(source: &Arc<GatedSource>) -> Arc<SearchSession<GatedSource>> {
    Arc::new(SearchSession::with_config(
        Arc::clone(source),
        ScorerConfig::default().with_workers(3),
    ))
}

#[tokio::test]
async fn test_search_ranks_by_score() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    let results = session.search("budget").await.expect("search failed");

    let ranked: Vec<(i64, u32)> = results.iter().map(|r| (r.note.id, r.score)).collect();
    assert_eq!(ranked, vec![(1, 2), (2, 1)]);
    assert_eq!(results[0].note.title, "Budget Report");
}

#[tokio::test]
async fn test_search_breaks_ties_by_id() {
    let source = Arc::new(GatedSource::new(vec![
        note(9, "plan", ""),
        note(4, "plan", ""),
        note(6, "", "plan"),
        note(5, "plan", "plan"),
    ]));
    let session = session(&source);

    let ids: Vec<i64> = session
        .search("Plan")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.note.id)
        .collect();
    assert_eq!(ids, vec![5, 4, 9, 6]);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    assert!(session.search("xyz").await.unwrap().is_empty());
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_search_skips_notes_deleted_after_scoring() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    source.remove_after_scoring(1);
    let session = session(&source);

    let results = session.search("budget").await.expect("search failed");
    let ids: Vec<i64> = results.iter().map(|r| r.note.id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_cancel_yields_cancelled_then_fresh_search_succeeds() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    source.hold_next_load();
    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.search("budget").await }
    });

    source.wait_for_held_load().await;
    session.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("cancelled search did not finish")
        .unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));

    let fresh = session.search("budget").await.expect("fresh search failed");
    assert_eq!(fresh.len(), 2);
}

#[tokio::test]
async fn test_cancel_between_refetches_yields_cancelled() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    // Note 1 ranks first and is fetched; the fetch of note 2 is held.
    source.hold_fetch(2);
    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.search("budget").await }
    });

    source.wait_for_held_fetch().await;
    session.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("cancelled search did not finish")
        .unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_new_search_cancels_previous() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    source.hold_next_load();
    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.search("budget").await }
    });
    source.wait_for_held_load().await;

    let second = session.search("milk").await.expect("second search failed");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].note.id, 3);

    let first = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .expect("superseded search did not finish")
        .unwrap();
    assert!(first.unwrap_err().is_cancelled());
    assert_eq!(source.load_count(), 2);
}

#[tokio::test]
async fn test_cancel_without_search_is_noop() {
    let source = Arc::new(GatedSource::new(budget_notes()));
    let session = session(&source);

    session.cancel();
    assert_eq!(session.search("budget").await.unwrap().len(), 2);
}
