//! End-to-end search against the PostgreSQL note repository.
//!
//! Requires a migrated PostgreSQL database at `DATABASE_URL`.
//! Run with: `cargo test -p jotter-search --test pg_search_test -- --ignored`

use std::sync::Arc;

use jotter_db::test_fixtures::TestDatabase;
use jotter_db::{NoteRepository, TagRepository};
use jotter_search::SearchSession;

#[tokio::test]
#[ignore = "requires DATABASE_URL with migrated database"]
async fn test_search_over_postgres_notes() {
    let test_db = TestDatabase::new().await;
    let marker = format!("{}budget", test_db.prefix());

    let report = test_db
        .create_note(&format!("{} Report", marker.to_uppercase()), "q3 numbers")
        .await;
    let meeting = test_db
        .create_note("Notes", &format!("{} meeting", marker))
        .await;
    let tag = test_db.create_tag("finance").await;
    test_db.db.tags.associate(meeting.id, tag.id).await.unwrap();

    let session = SearchSession::new(Arc::new(test_db.db.notes.clone()));
    let results = session.search(&marker).await.expect("search failed");

    let ranked: Vec<(i64, u32)> = results.iter().map(|r| (r.note.id, r.score)).collect();
    assert_eq!(ranked, vec![(report.id, 2), (meeting.id, 1)]);
    assert_eq!(results[1].note.tag_ids(), vec![tag.id]);

    test_db.db.notes.delete(report.id).await.unwrap();
    let after_delete = session.search(&marker).await.unwrap();
    assert_eq!(after_delete.len(), 1);

    test_db.cleanup().await;
}
