//! SQLite schema for the guardian issue store.

/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// Two tables:
/// - `issues`: one row per extracted finding, keyed by UUID v4 text.
/// - `comments`: triage discussion attached to an issue; append-only.
///
/// Both tables use `STRICT` mode for type enforcement. The comments foreign
/// key uses `ON DELETE CASCADE` so a GUI-level issue delete (outside the core
/// contract) cannot strand comment rows.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS issues (
        id          TEXT    PRIMARY KEY,
        file        TEXT    NOT NULL,
        category    TEXT    NOT NULL
                            CHECK(category IN
                                  ('bugs-security','performance-architecture',
                                   'standards','documentation','uncategorized')),
        title       TEXT    NOT NULL,
        description TEXT    NOT NULL,
        effort      TEXT    NOT NULL DEFAULT '',
        status      TEXT    NOT NULL DEFAULT 'open'
                            CHECK(status IN ('open', 'resolved', 'wontfix')),
        created_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS comments (
        id          TEXT    PRIMARY KEY,
        issue_id    TEXT    NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
        author      TEXT    NOT NULL,
        body        TEXT    NOT NULL,
        created_at  INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_comments_issue
        ON comments (issue_id, created_at);
";

/// Runs forward-only schema migration to migrate the DB to the latest version.
///
/// This function is idempotent: safe to call on every startup regardless of
/// whether the schema has already been applied. Two processes (reviewer and
/// manager) may both open the same store file; whichever runs first applies
/// the DDL, the other reads `version = 1` and does nothing.
///
/// # Process
///
/// 1. Creates the `schema_version` table if it does not exist.
/// 2. Reads the current version (`0` if the table is empty).
/// 3. If the version is below 1, applies `SCHEMA_V1_SQL` inside a
///    `BEGIN IMMEDIATE` transaction and records `version = 1`.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
