//! Integration tests for the issue store lifecycle.
//!
//! Exercises: open_db, migrate idempotency, create_issue, list_issues,
//! update_status, add_comment, list_comments, and cross-connection
//! visibility (two handles over the same store file, simulating the
//! reviewer and the manager running concurrently).

use guardian_core::db::{self, StoreError};
use guardian_core::types::{Category, IssueDraft, IssueFilter, IssueStatus};

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("issues.db");
    path.to_string_lossy().to_string()
}

fn draft(title: &str, category: Category) -> IssueDraft {
    IssueDraft {
        file: "app.py".to_owned(),
        category,
        title: title.to_owned(),
        description: "something is wrong".to_owned(),
        effort: "Low".to_owned(),
    }
}

#[tokio::test]
async fn schema_and_wal_configured_on_open() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, tokio_rusqlite::Error>(db.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| Ok::<_, tokio_rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let issue_pk_type: String = conn
        .call(|db| {
            Ok::<_, tokio_rusqlite::Error>(db.query_row(
                "SELECT type FROM pragma_table_info('issues') WHERE name = 'id'",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(issue_pk_type, "TEXT", "issues.id should be TEXT");
}

#[tokio::test]
async fn reopening_existing_store_preserves_rows() {
    let path = temp_db_path();

    {
        let conn = db::open_db(&path).await.unwrap();
        db::create_issue(&conn, draft("first run issue", Category::Standards))
            .await
            .unwrap();
    }

    // Two more opens against the populated file — simulating consecutive
    // process starts — must neither fail nor alter existing rows.
    for _ in 0..2 {
        let conn = db::open_db(&path).await.unwrap();
        let issues = db::list_issues(&conn, IssueFilter::default()).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "first run issue");
    }
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let created = db::create_issue(&conn, draft("unchecked index", Category::BugsSecurity))
        .await
        .unwrap();
    assert!(!created.id.is_empty(), "issue id should be a non-empty UUID");
    assert_eq!(created.status, IssueStatus::Open);

    let issues = db::list_issues(&conn, IssueFilter::default()).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, created.id);
    assert_eq!(issues[0].status, IssueStatus::Open);
    assert_eq!(issues[0].category, Category::BugsSecurity);
}

#[tokio::test]
async fn duplicate_titles_are_distinct_issues() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let a = db::create_issue(&conn, draft("same title", Category::Standards)).await.unwrap();
    let b = db::create_issue(&conn, draft("same title", Category::Standards)).await.unwrap();
    assert_ne!(a.id, b.id, "no deduplication across identical drafts");

    let issues = db::list_issues(&conn, IssueFilter::default()).await.unwrap();
    assert_eq!(issues.len(), 2);
}

#[tokio::test]
async fn status_updates_and_filtering() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let issue = db::create_issue(&conn, draft("slow loop", Category::PerformanceArchitecture))
        .await
        .unwrap();

    db::update_status(&conn, &issue.id, IssueStatus::Resolved).await.unwrap();
    let issues = db::list_issues(&conn, IssueFilter::default()).await.unwrap();
    assert_eq!(issues[0].status, IssueStatus::Resolved);

    // Any status may move to any other — including back to Open.
    db::update_status(&conn, &issue.id, IssueStatus::Wontfix).await.unwrap();
    db::update_status(&conn, &issue.id, IssueStatus::Open).await.unwrap();

    let open_only = db::list_issues(
        &conn,
        IssueFilter { status: Some(IssueStatus::Open), category: None },
    )
    .await
    .unwrap();
    assert_eq!(open_only.len(), 1);

    let resolved_only = db::list_issues(
        &conn,
        IssueFilter { status: Some(IssueStatus::Resolved), category: None },
    )
    .await
    .unwrap();
    assert!(resolved_only.is_empty());

    let missing = db::update_status(&conn, "no-such-id", IssueStatus::Resolved).await;
    assert!(matches!(missing, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn newest_issues_list_first() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let first = db::create_issue(&conn, draft("older", Category::Standards)).await.unwrap();
    // Backdate the first row so ordering depends on the timestamp, not
    // insertion order.
    let first_id = first.id.clone();
    conn.call(move |db| {
        db.execute(
            "UPDATE issues SET created_at = created_at - 100 WHERE id = ?1",
            rusqlite::params![&first_id],
        )?;
        Ok::<_, tokio_rusqlite::Error>(())
    })
    .await
    .unwrap();
    let second = db::create_issue(&conn, draft("newer", Category::Standards)).await.unwrap();

    let issues = db::list_issues(&conn, IssueFilter::default()).await.unwrap();
    assert_eq!(issues[0].id, second.id);
    assert_eq!(issues[1].id, first.id);
}

#[tokio::test]
async fn comments_append_and_order_by_timestamp() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let issue = db::create_issue(&conn, draft("needs discussion", Category::Documentation))
        .await
        .unwrap();

    let c1 = db::add_comment(&conn, &issue.id, "ana", "first look").await.unwrap();
    let c2 = db::add_comment(&conn, &issue.id, "ben", "agreed").await.unwrap();
    let c3 = db::add_comment(&conn, &issue.id, "ana", "fixed upstream").await.unwrap();
    assert_eq!(c1.issue_id, issue.id);

    // Backdate the latest and future-date the first: listing must follow
    // timestamps, not insertion order.
    let (first, third) = (c1.id.clone(), c3.id.clone());
    conn.call(move |db| {
        db.execute(
            "UPDATE comments SET created_at = created_at + 100 WHERE id = ?1",
            rusqlite::params![&first],
        )?;
        db.execute(
            "UPDATE comments SET created_at = created_at - 100 WHERE id = ?1",
            rusqlite::params![&third],
        )?;
        Ok::<_, tokio_rusqlite::Error>(())
    })
    .await
    .unwrap();

    let comments = db::list_comments(&conn, &issue.id).await.unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0].id, c3.id);
    assert_eq!(comments[1].id, c2.id);
    assert_eq!(comments[2].id, c1.id);

    let missing = db::add_comment(&conn, "no-such-id", "ana", "lost").await;
    assert!(matches!(missing, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn unopenable_store_path_reports_store_error() {
    let res = db::open_db("/no-such-dir/for-sure/issues.db").await;
    assert!(matches!(res, Err(StoreError::Store(_))));
}

#[tokio::test]
async fn comment_on_deleted_issue_reports_not_found() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let issue = db::create_issue(&conn, draft("short-lived", Category::Standards)).await.unwrap();
    // Delete out from under the store API, as the other process could.
    let id = issue.id.clone();
    conn.call(move |db| {
        db.execute("DELETE FROM issues WHERE id = ?1", rusqlite::params![&id])?;
        Ok::<_, tokio_rusqlite::Error>(())
    })
    .await
    .unwrap();

    let res = db::add_comment(&conn, &issue.id, "ana", "too late").await;
    assert!(matches!(res, Err(StoreError::NotFound)), "expected NotFound, not an FK failure");
}

#[tokio::test]
async fn second_connection_sees_first_connections_commits() {
    let path = temp_db_path();
    let writer = db::open_db(&path).await.unwrap();
    let reader = db::open_db(&path).await.unwrap();

    // Reader opened before the write — its next list call must still see
    // the commit (no in-process caching is authoritative).
    let issue = db::create_issue(&writer, draft("cross-process", Category::BugsSecurity))
        .await
        .unwrap();

    let seen = db::list_issues(&reader, IssueFilter::default()).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, issue.id);

    // And a status change from the "manager" side is visible to the "reviewer".
    db::update_status(&reader, &issue.id, IssueStatus::Wontfix).await.unwrap();
    let seen = db::list_issues(&writer, IssueFilter::default()).await.unwrap();
    assert_eq!(seen[0].status, IssueStatus::Wontfix);
}
