//! Issue detail panel renderer.
//!
//! Renders the centre panel from the selected issue: title, source file,
//! category, status, remediation effort, relative age, and the full
//! description including any suggested fix text.

use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::manager::app::{AppState, PanelFocus};
use crate::manager::theme::Theme;
use crate::manager::ui::layout::{inner_rect, panel_block};

pub fn render_detail(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    focus: PanelFocus,
    state: &AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Detail;
    let block = panel_block("Detail", is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(issue) = state.selected_issue() else {
        let placeholder = Paragraph::new(Line::styled(
            "  Select an issue to see its detail",
            Style::default().fg(theme.text_dim),
        ));
        frame.render_widget(placeholder, inner);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            issue.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        meta_line("File", issue.file.clone(), theme),
        Line::from(vec![
            Span::styled("Category  ", Style::default().fg(theme.text_dim)),
            Span::styled(
                issue.category.label(),
                Style::default().fg(theme.category_color(issue.category)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status    ", Style::default().fg(theme.text_dim)),
            Span::styled(
                issue.status.as_str(),
                Style::default().fg(theme.status_color(issue.status)),
            ),
        ]),
        meta_line("Effort", issue.effort.clone(), theme),
        meta_line("Reported", age_label(issue.created_at), theme),
        Line::from(""),
    ];
    for text_line in issue.description.lines() {
        lines.push(Line::from(text_line.to_owned()));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0));
    frame.render_widget(paragraph, inner);
}

fn meta_line(label: &str, value: String, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<9} "), Style::default().fg(theme.text_dim)),
        Span::raw(value),
    ])
}

/// Human-readable age of a unix-seconds timestamp, like "3h ago".
fn age_label(created_at: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let age = now - created_at;
    if age < 0 {
        return "just now".to_owned();
    }
    match age {
        0..=59 => "just now".to_owned(),
        60..=3599 => format!("{}m ago", age / 60),
        3600..=86399 => format!("{}h ago", age / 3600),
        _ => format!("{}d ago", age / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now_secs() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn age_label_buckets() {
        let now = now_secs();
        assert_eq!(age_label(now), "just now");
        assert_eq!(age_label(now - 120), "2m ago");
        assert_eq!(age_label(now - 7200), "2h ago");
        assert_eq!(age_label(now - 3 * 86400), "3d ago");
        // A clock-skewed future timestamp must not underflow into garbage.
        assert_eq!(age_label(now + 1000), "just now");
    }
}
