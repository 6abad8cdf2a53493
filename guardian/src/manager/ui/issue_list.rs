//! Issue list panel renderer.
//!
//! Renders the left panel from `AppState.issues`. Each entry shows a status
//! badge, a category badge, and the issue title. When the list is empty a
//! placeholder names the active filter so "no issues" and "filtered out" are
//! distinguishable.

use ratatui::{
    Frame,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
};

use guardian_core::types::{Category, Issue};

use crate::manager::app::{AppState, PanelFocus};
use crate::manager::theme::Theme;
use crate::manager::ui::layout::panel_block;

pub fn render_issue_list(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::IssueList;
    let count = state.issues.len();
    let title = if count > 0 { format!("Issues ({})", count) } else { "Issues".to_owned() };
    let block = panel_block(&title, is_focused, theme);

    let items: Vec<ListItem> = if state.issues.is_empty() {
        let msg = match state.status_filter {
            None => "No issues recorded".to_owned(),
            Some(status) => format!("No {} issues", status.as_str()),
        };
        vec![ListItem::new(Line::styled(msg, Style::default().fg(theme.text_dim)))]
    } else {
        state.issues.iter().map(|issue| issue_item(issue, theme)).collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active));

    frame.render_stateful_widget(list, area, &mut state.issue_list_state);
}

/// Converts an issue into a styled ListItem.
///
/// Format: `[O] [BUG] Unchecked index into user input`. Long titles are
/// truncated to avoid horizontal overflow.
fn issue_item(issue: &Issue, theme: &Theme) -> ListItem<'static> {
    let status_char = issue.status.as_str().chars().next().unwrap_or('?').to_ascii_uppercase();
    let status_badge = Span::styled(
        format!("[{}] ", status_char),
        Style::default().fg(theme.status_color(issue.status)),
    );
    let category_badge = Span::styled(
        format!("[{}] ", category_tag(issue.category)),
        Style::default().fg(theme.category_color(issue.category)),
    );

    let max_title_len = 40usize;
    let title = if issue.title.chars().count() > max_title_len {
        let truncated: String = issue.title.chars().take(max_title_len - 3).collect();
        format!("{truncated}...")
    } else {
        issue.title.clone()
    };

    ListItem::new(Line::from(vec![status_badge, category_badge, Span::raw(title)]))
}

/// Short badge text; the full category label is shown in the detail panel.
fn category_tag(category: Category) -> &'static str {
    match category {
        Category::BugsSecurity => "BUG",
        Category::PerformanceArchitecture => "PERF",
        Category::Standards => "STD",
        Category::Documentation => "DOC",
        Category::Uncategorized => "MISC",
    }
}
