//! Central application state for the issue manager.
//!
//! This module owns all mutable UI state: the current mode, which panel has
//! focus, the loaded issues and comments, per-panel scroll offsets and
//! viewport heights, the active status filter, and the comment draft. No
//! ratatui rendering logic lives here — `app.rs` is pure state read by the
//! render module and mutated by the keybinding dispatcher.

use guardian_core::types::{Comment, Issue, IssueFilter, IssueStatus};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Normal vim-style navigation mode (default).
    #[default]
    Normal,
    /// Text insertion mode for the comment draft.
    Insert,
    /// Full-screen help overlay is shown above all panels.
    HelpOverlay,
    /// Quit-confirmation dialog shown when an unsent comment draft exists.
    ConfirmQuit,
}

/// Which panel currently has keyboard focus.
///
/// Navigation cycles IssueList → Detail → Comments → IssueList via `next()`
/// and in reverse via `prev()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Left panel listing issues.
    #[default]
    IssueList,
    /// Centre panel showing the selected issue in full.
    Detail,
    /// Right panel showing the comment thread.
    Comments,
}

impl PanelFocus {
    /// Returns the panel that precedes `self` in the cycle (wraps around).
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::IssueList => PanelFocus::Comments,
            PanelFocus::Detail => PanelFocus::IssueList,
            PanelFocus::Comments => PanelFocus::Detail,
        }
    }

    /// Returns the panel that follows `self` in the cycle (wraps around).
    pub fn next(self) -> Self {
        match self {
            PanelFocus::IssueList => PanelFocus::Detail,
            PanelFocus::Detail => PanelFocus::Comments,
            PanelFocus::Comments => PanelFocus::IssueList,
        }
    }
}

/// All mutable UI state passed through every render cycle.
///
/// Bundled so the render function receives a single mutable reference and the
/// keybinding dispatcher another. No logic resides in the render path.
pub struct AppState {
    /// Current editor mode governing which keybindings are active.
    pub mode: Mode,
    /// Which panel currently receives keyboard scroll/navigation events.
    pub focus: PanelFocus,

    /// Issues currently loaded from the store, newest first, already
    /// filtered by `status_filter`.
    pub issues: Vec<Issue>,
    /// Comment thread for the selected issue.
    pub comments: Vec<Comment>,

    /// Stateful list widget backing the issue-list panel (left).
    pub issue_list_state: ListState,

    /// Vertical scroll offset for the detail `Paragraph` (centre panel).
    pub detail_scroll: u16,
    /// Vertical scroll offset for the comments `Paragraph` (right panel).
    pub comments_scroll: u16,

    /// Inner height of the issue-list panel after borders, cached per render.
    pub issue_list_viewport_height: u16,
    /// Inner height of the detail panel after borders, cached per render.
    pub detail_viewport_height: u16,
    /// Inner height of the comments panel after borders, cached per render.
    pub comments_viewport_height: u16,

    /// Only issues with this status are loaded; `None` loads everything.
    pub status_filter: Option<IssueStatus>,

    /// Comment text being typed in Insert mode. Guards the quit path when
    /// non-empty.
    pub comment_draft: String,
    /// Author name recorded on submitted comments.
    pub author: String,

    /// Panel rects from the last render, used for click-to-focus hit tests.
    pub panel_rects: [Rect; 3],
    /// Vertical scroll offset for the help overlay.
    pub help_scroll: u16,
    /// Tick counter driving the periodic store reload.
    pub ticks: u8,
}

impl Default for AppState {
    fn default() -> Self {
        let mut issue_list_state = ListState::default();
        issue_list_state.select(Some(0));
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            issues: Vec::new(),
            comments: Vec::new(),
            issue_list_state,
            detail_scroll: 0,
            comments_scroll: 0,
            issue_list_viewport_height: 0,
            detail_viewport_height: 0,
            comments_viewport_height: 0,
            status_filter: None,
            comment_draft: String::new(),
            author: whoami(),
            panel_rects: [Rect::default(); 3],
            help_scroll: 0,
            ticks: 0,
        }
    }
}

/// Comment author, taken from the environment. Falls back to a fixed name so
/// comments are never attributed to an empty string.
fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "reviewer".to_owned())
}

impl AppState {
    /// The issue currently selected in the list, if any.
    pub fn selected_issue(&self) -> Option<&Issue> {
        self.issues.get(self.issue_list_state.selected()?)
    }

    /// Replaces the issue list with a fresh load from the store.
    ///
    /// Selection is preserved by issue id, not index, so a background reload
    /// that inserts newer issues above the cursor does not move it to a
    /// different issue.
    pub fn apply_issues(&mut self, issues: Vec<Issue>) {
        let selected_id = self.selected_issue().map(|i| i.id.clone());
        self.issues = issues;
        let index = selected_id
            .and_then(|id| self.issues.iter().position(|i| i.id == id))
            .unwrap_or(0);
        if self.issues.is_empty() {
            self.issue_list_state.select(None);
        } else {
            self.issue_list_state.select(Some(index.min(self.issues.len() - 1)));
        }
    }

    /// Advances the status filter: all → open → resolved → wontfix → all.
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(IssueStatus::Open),
            Some(IssueStatus::Open) => Some(IssueStatus::Resolved),
            Some(IssueStatus::Resolved) => Some(IssueStatus::Wontfix),
            Some(IssueStatus::Wontfix) => None,
        };
    }

    /// The filter handed to the store on every load.
    pub fn filter(&self) -> IssueFilter {
        IssueFilter { status: self.status_filter, category: None }
    }

    /// Scrolls the focused panel down by `lines` rows.
    ///
    /// For `IssueList`: advances the `ListState` selection. For `Detail` and
    /// `Comments`: adds to the u16 scroll offset (saturating; ratatui clamps).
    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::IssueList => {
                self.issue_list_state.scroll_down_by(lines);
                self.reset_detail_scroll();
            }
            PanelFocus::Detail => {
                self.detail_scroll = self.detail_scroll.saturating_add(lines);
            }
            PanelFocus::Comments => {
                self.comments_scroll = self.comments_scroll.saturating_add(lines);
            }
        }
    }

    /// Scrolls the focused panel up by `lines` rows.
    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::IssueList => {
                self.issue_list_state.scroll_up_by(lines);
                self.reset_detail_scroll();
            }
            PanelFocus::Detail => {
                self.detail_scroll = self.detail_scroll.saturating_sub(lines);
            }
            PanelFocus::Comments => {
                self.comments_scroll = self.comments_scroll.saturating_sub(lines);
            }
        }
    }

    /// Scrolls the focused panel to the very top.
    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::IssueList => {
                self.issue_list_state.select_first();
                self.reset_detail_scroll();
            }
            PanelFocus::Detail => self.detail_scroll = 0,
            PanelFocus::Comments => self.comments_scroll = 0,
        }
    }

    /// Scrolls the focused panel to the very bottom.
    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::IssueList => {
                self.issue_list_state.select_last();
                self.reset_detail_scroll();
            }
            PanelFocus::Detail => self.detail_scroll = u16::MAX,
            PanelFocus::Comments => self.comments_scroll = u16::MAX,
        }
    }

    /// Scrolls the focused panel down by half its visible height.
    ///
    /// Uses the viewport height cached from the previous render. If the cached
    /// height is zero (first frame), scrolls by 1 to avoid a no-op.
    pub fn half_page_down(&mut self) {
        let half = self.focused_viewport_height() / 2;
        self.scroll_down(half.max(1));
    }

    /// Scrolls the focused panel up by half its visible height.
    pub fn half_page_up(&mut self) {
        let half = self.focused_viewport_height() / 2;
        self.scroll_up(half.max(1));
    }

    /// Scrolls the focused panel down by its full visible height (one page).
    pub fn full_page_down(&mut self) {
        let full = self.focused_viewport_height();
        self.scroll_down(full.max(1));
    }

    /// Scrolls the focused panel up by its full visible height (one page).
    pub fn full_page_up(&mut self) {
        let full = self.focused_viewport_height();
        self.scroll_up(full.max(1));
    }

    fn focused_viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::IssueList => self.issue_list_viewport_height,
            PanelFocus::Detail => self.detail_viewport_height,
            PanelFocus::Comments => self.comments_viewport_height,
        }
    }

    // Moving the list cursor shows a different issue; its detail and thread
    // start at the top.
    fn reset_detail_scroll(&mut self) {
        self.detail_scroll = 0;
        self.comments_scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::types::Category;

    fn issue(id: &str, created_at: i64) -> Issue {
        Issue {
            id: id.to_owned(),
            file: "app.py".to_owned(),
            category: Category::Standards,
            title: format!("issue {id}"),
            description: String::new(),
            effort: "Low".to_owned(),
            status: IssueStatus::Open,
            created_at,
        }
    }

    #[test]
    fn reload_preserves_selection_by_id() {
        let mut state = AppState::default();
        state.apply_issues(vec![issue("a", 30), issue("b", 20)]);
        state.issue_list_state.select(Some(1)); // "b"

        // A newer issue lands on top; "b" shifts down one slot.
        state.apply_issues(vec![issue("c", 40), issue("a", 30), issue("b", 20)]);
        assert_eq!(state.selected_issue().map(|i| i.id.as_str()), Some("b"));
    }

    #[test]
    fn reload_handles_selected_issue_disappearing() {
        let mut state = AppState::default();
        state.apply_issues(vec![issue("a", 30), issue("b", 20)]);
        state.issue_list_state.select(Some(1));

        // "b" filtered out; selection falls back to the top.
        state.apply_issues(vec![issue("a", 30)]);
        assert_eq!(state.selected_issue().map(|i| i.id.as_str()), Some("a"));

        state.apply_issues(Vec::new());
        assert!(state.selected_issue().is_none());
    }

    #[test]
    fn status_filter_cycles_through_all_states() {
        let mut state = AppState::default();
        assert_eq!(state.status_filter, None);
        state.cycle_status_filter();
        assert_eq!(state.status_filter, Some(IssueStatus::Open));
        state.cycle_status_filter();
        state.cycle_status_filter();
        state.cycle_status_filter();
        assert_eq!(state.status_filter, None);
    }

    #[test]
    fn list_navigation_resets_detail_scroll() {
        let mut state = AppState::default();
        state.apply_issues(vec![issue("a", 30), issue("b", 20)]);
        state.focus = PanelFocus::Detail;
        state.scroll_down(5);
        assert_eq!(state.detail_scroll, 5);

        state.focus = PanelFocus::IssueList;
        state.scroll_down(1);
        assert_eq!(state.detail_scroll, 0);
    }
}
