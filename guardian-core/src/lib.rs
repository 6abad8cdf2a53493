//! guardian-core — shared library for the guardian review pipeline.
//!
//! Holds everything both guardian processes (the streaming reviewer and the
//! issue manager TUI) need to agree on:
//!
//! - `schema` / `db` — the WAL-mode SQLite issue store and its operations.
//! - `types` — issues, comments, statuses, categories.
//! - `decode` — NDJSON chunk decoder for the model service's byte stream.
//! - `extract` — incremental issue-block extractor over the growing review.
//!
//! No terminal or HTTP code lives here; the binary crate owns all I/O except
//! the SQLite file itself.

pub mod db;
pub mod decode;
pub mod extract;
pub mod schema;
pub mod types;
