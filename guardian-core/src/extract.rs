//! Incremental extractor for structured issue blocks in the streamed review.
//!
//! The model is prompted to group findings under the four category headings
//! and to emit each finding as a run of labeled fields:
//!
//! ```text
//! ## Bugs & Security
//! * **[Issue]:** SQL built by string concatenation
//! * **[Explanation]:** User input reaches the query unescaped.
//! * **[Remediation Effort]:** Low
//! * **[Suggested Fix (diff)]:** ...
//! ```
//!
//! The extractor is a per-line state machine (`Outside` / `InBlock`) fed the
//! same fragments the live renderer receives. A block closes when the next
//! `[Issue]` marker appears, a new heading starts, or the stream ends; it is
//! emitted only when well-formed (non-empty title, explanation, and effort) —
//! precision over recall, so truncated blocks at end-of-stream are dropped.
//!
//! Only the partial trailing line is buffered between pushes; consumed text
//! is discarded, so extraction cost stays linear in document size no matter
//! how many fragments arrive.

use crate::types::{Category, IssueDraft};

/// Which labeled field continuation lines currently append to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Explanation,
    Effort,
    Fix,
}

/// An issue block being accumulated, before the well-formedness gate.
#[derive(Debug, Default)]
struct PartialBlock {
    category: Category,
    title: String,
    explanation: String,
    effort: String,
    fix: String,
}

impl PartialBlock {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Explanation => &mut self.explanation,
            Field::Effort => &mut self.effort,
            Field::Fix => &mut self.fix,
        }
    }
}

/// Scanner position relative to issue blocks.
#[derive(Debug)]
enum ScanState {
    /// Between blocks; free-form review prose is ignored here.
    Outside,
    /// Inside a block, appending to `field` of the partial block.
    InBlock { block: PartialBlock, field: Field },
}

/// Incremental issue extractor over one review document.
///
/// Feed fragments with [`push`](Self::push) in delivery order; call
/// [`finish`](Self::finish) once at end of stream. Each returned draft
/// carries `source_name` as its file.
#[derive(Debug)]
pub struct IssueExtractor {
    file: String,
    /// Partial trailing line awaiting its newline.
    tail: String,
    state: ScanState,
    /// Nearest preceding heading that matched one of the four categories.
    category: Category,
    /// Inside a fenced code block: fence contents are never interpreted as
    /// headings or field markers.
    in_fence: bool,
    dropped: usize,
}

impl IssueExtractor {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            file: source_name.into(),
            tail: String::new(),
            state: ScanState::Outside,
            category: Category::Uncategorized,
            in_fence: false,
            dropped: 0,
        }
    }

    /// Consumes one fragment and returns any issues whose blocks it closed.
    pub fn push(&mut self, fragment: &str) -> Vec<IssueDraft> {
        self.tail.push_str(fragment);
        let mut out = Vec::new();

        while let Some(pos) = self.tail.find('\n') {
            let line: String = self.tail.drain(..=pos).collect();
            self.scan_line(line.trim_end_matches(['\n', '\r']), &mut out);
        }

        out
    }

    /// Marks end of stream: the trailing partial line is scanned and the open
    /// block (if any) is closed. Malformed leftovers are dropped, not emitted.
    pub fn finish(&mut self) -> Vec<IssueDraft> {
        let mut out = Vec::new();
        if !self.tail.is_empty() {
            let line = std::mem::take(&mut self.tail);
            self.scan_line(line.trim_end_matches('\r'), &mut out);
        }
        self.close_block(&mut out);
        out
    }

    /// Number of blocks discarded by the well-formedness gate so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn scan_line(&mut self, line: &str, out: &mut Vec<IssueDraft>) {
        let trimmed = line.trim_start();

        // Fence delimiters toggle; everything inside a fence is opaque text.
        if trimmed.starts_with("```") {
            self.in_fence = !self.in_fence;
            self.append_continuation(line);
            return;
        }
        if self.in_fence {
            self.append_continuation(line);
            return;
        }

        if let Some(category) = heading_category(trimmed) {
            // A heading starts a new region: close the open block and label
            // everything that follows with the matched category.
            self.close_block(out);
            if let Some(c) = category {
                self.category = c;
            }
            return;
        }

        if let Some((field, value)) = field_marker(trimmed) {
            if field == Field::Title {
                self.close_block(out);
                self.state = ScanState::InBlock {
                    block: PartialBlock {
                        category: self.category,
                        title: value.to_owned(),
                        ..PartialBlock::default()
                    },
                    field: Field::Title,
                };
            } else if let ScanState::InBlock { block, field: current } = &mut self.state {
                *block.field_mut(field) = value.to_owned();
                *current = field;
            }
            // Field markers outside a block (no preceding [Issue]) are
            // ignored: without a title there is nothing to attach them to.
            return;
        }

        self.append_continuation(line);
    }

    /// Appends a plain line to the active field of the open block. Text
    /// outside any block is not an issue and not an error — it is skipped.
    /// Only explanation and fix accept continuation lines; title and effort
    /// take their inline value only, so prose after a finished block cannot
    /// leak into it.
    fn append_continuation(&mut self, line: &str) {
        if let ScanState::InBlock { block, field } = &mut self.state {
            if !matches!(field, Field::Explanation | Field::Fix) {
                return;
            }
            let target = block.field_mut(*field);
            if !target.is_empty() {
                target.push('\n');
            }
            target.push_str(line);
        }
    }

    /// Closes the open block, emitting it if well-formed.
    fn close_block(&mut self, out: &mut Vec<IssueDraft>) {
        let state = std::mem::replace(&mut self.state, ScanState::Outside);
        let ScanState::InBlock { block, .. } = state else {
            return;
        };

        let title = block.title.trim();
        let explanation = block.explanation.trim();
        let effort = block.effort.trim();
        if title.is_empty() || explanation.is_empty() || effort.is_empty() {
            self.dropped += 1;
            tracing::debug!(
                title = %title,
                "dropping malformed issue block (missing required fields)"
            );
            return;
        }

        let mut description = explanation.to_owned();
        let fix = block.fix.trim();
        if !fix.is_empty() {
            description.push_str("\n\nSuggested fix:\n");
            description.push_str(fix);
        }

        out.push(IssueDraft {
            file: self.file.clone(),
            category: block.category,
            title: title.to_owned(),
            description,
            effort: effort.to_owned(),
        });
    }
}

/// Recognizes a heading line.
///
/// Returns `None` for non-headings. For headings, the inner `Option` is the
/// matched category — `#`-style headings always count as headings (closing
/// any open block) even when they match no category; bold-line headings such
/// as `**Bugs & Security**` only count when they match one, since bold text
/// is otherwise ordinary emphasis.
fn heading_category(trimmed: &str) -> Option<Option<Category>> {
    if let Some(rest) = trimmed.strip_prefix('#') {
        let text = rest.trim_start_matches('#').trim();
        return Some(match_category(text));
    }

    if trimmed.starts_with("**") && trimmed.ends_with("**") && !trimmed.contains('[') {
        let text = trimmed.trim_matches('*').trim();
        if let Some(c) = match_category(text) {
            return Some(Some(c));
        }
    }

    None
}

/// Maps heading text to one of the four fixed categories.
fn match_category(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    if lower.contains("bug") || lower.contains("security") {
        Some(Category::BugsSecurity)
    } else if lower.contains("performance") || lower.contains("architecture") {
        Some(Category::PerformanceArchitecture)
    } else if lower.contains("standard") || lower.contains("clean code") {
        Some(Category::Standards)
    } else if lower.contains("documentation") {
        Some(Category::Documentation)
    } else {
        None
    }
}

/// Recognizes a labeled field marker like `* **[Issue]:** text`.
///
/// Accepts optional leading bullet characters and optional bold wrapping
/// around the bracketed label. Returns the field and the value text that
/// follows the label on the same line.
fn field_marker(trimmed: &str) -> Option<(Field, &str)> {
    let rest = trimmed
        .trim_start_matches(['*', '-'])
        .trim_start()
        .trim_start_matches("**")
        .trim_start();
    let rest = rest.strip_prefix('[')?;
    let close = rest.find(']')?;
    let name = rest[..close].trim().to_lowercase();

    let field = if name == "issue" {
        Field::Title
    } else if name == "explanation" {
        Field::Explanation
    } else if name.starts_with("remediation") {
        Field::Effort
    } else if name.starts_with("suggested fix") {
        Field::Fix
    } else {
        return None;
    };

    // Skip the label terminator: `]:` optionally wrapped in `**`.
    let value = rest[close + 1..]
        .trim_start_matches(':')
        .trim_start_matches('*')
        .trim();
    Some((field, value))
}
