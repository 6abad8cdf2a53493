use std::time::{SystemTime, UNIX_EPOCH};

use tokio_rusqlite::Connection;

use crate::types::{Category, Comment, Issue, IssueDraft, IssueFilter, IssueStatus};

/// Errors returned by issue store operations.
///
/// `NotFound` is a normal outcome the caller handles (e.g. the manager
/// refreshes its list when an issue disappeared between reads); `Store`
/// wraps everything the SQLite layer can fail with, including a locked or
/// corrupt store file at commit time.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("issue not found")]
    NotFound,
    #[error("issue store unavailable: {0}")]
    Store(#[from] tokio_rusqlite::Error),
}

/// Opens (or creates) the SQLite issue store at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// This function is the single entry point for all store connections — both
/// the reviewer process and the manager TUI open the store through it, and
/// each receives its own handle. There is no shared module-level connection.
///
/// It sets `busy_timeout` via the `Connection` method (not a PRAGMA string)
/// so the setting takes effect regardless of pragma caching; the 5 s window
/// absorbs write contention between the two processes.
///
/// # Errors
///
/// Returns `StoreError::Store` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, StoreError> {
    // open() reports rusqlite::Error directly; fold it into the wrapped
    // error type everything downstream uses.
    let conn = Connection::open(path).await.map_err(tokio_rusqlite::Error::from)?;

    // WAL pragmas — connection-level settings re-applied on every open.
    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    // Apply schema migrations via the schema_version versioning system.
    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Maps a row from the issues SELECT column order into an `Issue`.
fn issue_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: r.get(0)?,
        file: r.get(1)?,
        category: Category::parse(&r.get::<_, String>(2)?),
        title: r.get(3)?,
        description: r.get(4)?,
        effort: r.get(5)?,
        status: IssueStatus::parse(&r.get::<_, String>(6)?),
        created_at: r.get(7)?,
    })
}

/// Persists an extracted issue draft and returns the stored `Issue`.
///
/// Generates a new UUID v4 id, sets status `open` and `created_at` to now,
/// and commits via `BEGIN IMMEDIATE` before returning — a crash after this
/// call returns cannot lose the issue.
///
/// # Errors
///
/// Returns `StoreError::Store` if the insert transaction fails.
pub async fn create_issue(conn: &Connection, draft: IssueDraft) -> Result<Issue, StoreError> {
    let issue = conn
        .call(move |db| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = now_secs();
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO issues (id, file, category, title, description, effort, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'open', ?7)",
                rusqlite::params![
                    &id,
                    &draft.file,
                    draft.category.as_str(),
                    &draft.title,
                    &draft.description,
                    &draft.effort,
                    now
                ],
            )?;
            tx.commit()?;
            Ok(Issue {
                id,
                file: draft.file,
                category: draft.category,
                title: draft.title,
                description: draft.description,
                effort: draft.effort,
                status: IssueStatus::Open,
                created_at: now,
            })
        })
        .await?;
    Ok(issue)
}

/// Lists issues matching `filter`, newest first (`created_at DESC`, id as
/// tiebreak).
///
/// Every call reads the store afresh — there is no in-process cache — so
/// rows committed by the other process since the previous call are always
/// visible.
///
/// # Errors
///
/// Returns `StoreError::Store` if the query fails.
pub async fn list_issues(conn: &Connection, filter: IssueFilter) -> Result<Vec<Issue>, StoreError> {
    let issues = conn
        .call(move |db| {
            let mut sql = String::from(
                "SELECT id, file, category, title, description, effort, status, created_at
                 FROM issues",
            );
            let mut clauses: Vec<&str> = Vec::new();
            let mut params: Vec<String> = Vec::new();
            if let Some(status) = filter.status {
                clauses.push("status = ?");
                params.push(status.as_str().to_owned());
            }
            if let Some(category) = filter.category {
                clauses.push("category = ?");
                params.push(category.as_str().to_owned());
            }
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let mut stmt = db.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), issue_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(issues)
}

/// Sets the status of issue `id` to `status`.
///
/// No transition restriction exists — any status may move to any other.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if no issue has that id, or
/// `StoreError::Store` if the update transaction fails.
pub async fn update_status(
    conn: &Connection,
    id: &str,
    status: IssueStatus,
) -> Result<(), StoreError> {
    let id = id.to_owned();
    let changed = conn
        .call(move |db| {
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE issues SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), &id],
            )?;
            tx.commit()?;
            Ok(changed)
        })
        .await?;

    if changed == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Appends a comment to issue `issue_id` and returns the stored `Comment`.
///
/// Comments are append-only; no edit or delete operation exists.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if the issue does not exist, or
/// `StoreError::Store` if the insert transaction fails.
pub async fn add_comment(
    conn: &Connection,
    issue_id: &str,
    author: &str,
    body: &str,
) -> Result<Comment, StoreError> {
    let issue_id = issue_id.to_owned();
    let author = author.to_owned();
    let body = body.to_owned();

    let comment = conn
        .call(move |db| {
            // The existence check runs inside the immediate transaction so a
            // concurrent delete between check and insert cannot surface as an
            // FK violation instead of NotFound.
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM issues WHERE id = ?1",
                rusqlite::params![&issue_id],
                |r| r.get(0),
            )?;
            if exists == 0 {
                return Ok(None);
            }

            let id = uuid::Uuid::new_v4().to_string();
            let now = now_secs();
            tx.execute(
                "INSERT INTO comments (id, issue_id, author, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![&id, &issue_id, &author, &body, now],
            )?;
            tx.commit()?;
            Ok(Some(Comment { id, issue_id, author, body, created_at: now }))
        })
        .await?;

    comment.ok_or(StoreError::NotFound)
}

/// Lists all comments on `issue_id` in creation-time order, oldest first.
///
/// Ordering follows the stored timestamp, not insertion order, so backdated
/// rows sort into their chronological position.
///
/// # Errors
///
/// Returns `StoreError::Store` if the query fails.
pub async fn list_comments(conn: &Connection, issue_id: &str) -> Result<Vec<Comment>, StoreError> {
    let issue_id = issue_id.to_owned();
    let comments = conn
        .call(move |db| {
            let mut stmt = db.prepare(
                "SELECT id, issue_id, author, body, created_at
                 FROM comments
                 WHERE issue_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![&issue_id], |r| {
                    Ok(Comment {
                        id: r.get(0)?,
                        issue_id: r.get(1)?,
                        author: r.get(2)?,
                        body: r.get(3)?,
                        created_at: r.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(comments)
}
