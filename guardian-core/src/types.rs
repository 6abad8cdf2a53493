//! Core data types shared by the reviewer process and the issue manager.
//!
//! Enums round-trip through SQLite as lowercase text (`as_str` / `parse`) so
//! the store stays readable with plain `sqlite3` and the CHECK constraints in
//! `schema.rs` can name every legal value.

/// Review status of an issue.
///
/// Every status may transition to every other — there is no terminal state.
/// New issues always start as `Open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueStatus {
    #[default]
    Open,
    Resolved,
    Wontfix,
}

impl IssueStatus {
    /// The stored text form (matches the `issues.status` CHECK constraint).
    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Wontfix => "wontfix",
        }
    }

    /// Parses the stored text form. Unknown text maps to `Open` so a row
    /// written by a newer version never makes the manager unable to list.
    pub fn parse(s: &str) -> Self {
        match s {
            "resolved" => IssueStatus::Resolved,
            "wontfix" => IssueStatus::Wontfix,
            _ => IssueStatus::Open,
        }
    }
}

/// The four review dimensions the model is prompted with, plus a fallback
/// for blocks that appear before any recognized heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Category {
    BugsSecurity,
    PerformanceArchitecture,
    Standards,
    Documentation,
    #[default]
    Uncategorized,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::BugsSecurity => "bugs-security",
            Category::PerformanceArchitecture => "performance-architecture",
            Category::Standards => "standards",
            Category::Documentation => "documentation",
            Category::Uncategorized => "uncategorized",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "bugs-security" => Category::BugsSecurity,
            "performance-architecture" => Category::PerformanceArchitecture,
            "standards" => Category::Standards,
            "documentation" => Category::Documentation,
            _ => Category::Uncategorized,
        }
    }

    /// Human-readable label for display in the manager TUI.
    pub fn label(self) -> &'static str {
        match self {
            Category::BugsSecurity => "Bugs & Security",
            Category::PerformanceArchitecture => "Performance & Architecture",
            Category::Standards => "Standards & Clean Code",
            Category::Documentation => "Documentation",
            Category::Uncategorized => "Uncategorized",
        }
    }
}

/// A structured finding persisted in the store.
///
/// `id` is UUID v4 text assigned by `db::create_issue`. `created_at` is Unix
/// seconds. `effort` is the model's remediation-effort label, stored verbatim
/// (typically "Low" / "Medium" / "High").
#[derive(Debug, Clone)]
pub struct Issue {
    pub id: String,
    pub file: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub effort: String,
    pub status: IssueStatus,
    pub created_at: i64,
}

/// An issue as produced by the extractor, before the store assigns identity,
/// status, and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub file: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub effort: String,
}

/// A comment on one issue. Append-only: no edit or delete operation exists.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,
    pub issue_id: String,
    pub author: String,
    pub body: String,
    pub created_at: i64,
}

/// Optional narrowing for `db::list_issues`. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trip() {
        for s in [IssueStatus::Open, IssueStatus::Resolved, IssueStatus::Wontfix] {
            assert_eq!(IssueStatus::parse(s.as_str()), s);
        }
        // Unknown text degrades to Open rather than failing.
        assert_eq!(IssueStatus::parse("archived"), IssueStatus::Open);
    }

    #[test]
    fn category_text_round_trip() {
        for c in [
            Category::BugsSecurity,
            Category::PerformanceArchitecture,
            Category::Standards,
            Category::Documentation,
            Category::Uncategorized,
        ] {
            assert_eq!(Category::parse(c.as_str()), c);
        }
    }
}
