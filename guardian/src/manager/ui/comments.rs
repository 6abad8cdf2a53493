//! Comment thread panel renderer.
//!
//! Renders the right panel: the selected issue's comments oldest first, and
//! the in-progress draft line while Insert mode is active.

use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::manager::app::{AppState, Mode, PanelFocus};
use crate::manager::theme::Theme;
use crate::manager::ui::layout::{inner_rect, panel_block};

pub fn render_comments(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    focus: PanelFocus,
    state: &AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Comments;
    let count = state.comments.len();
    let title = if count > 0 { format!("Comments ({})", count) } else { "Comments".to_owned() };
    let block = panel_block(&title, is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    if state.comments.is_empty() && state.mode != Mode::Insert {
        let msg = if state.selected_issue().is_some() {
            "No comments yet ('c' to add one)"
        } else {
            "No issue selected"
        };
        lines.push(Line::styled(msg, Style::default().fg(theme.text_dim)));
    }

    for comment in &state.comments {
        lines.push(Line::from(Span::styled(
            comment.author.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for body_line in comment.body.lines() {
            lines.push(Line::from(format!("  {body_line}")));
        }
        lines.push(Line::from(""));
    }

    // Draft line with a block cursor while typing.
    if state.mode == Mode::Insert {
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.status_mode_insert)),
            Span::raw(state.comment_draft.clone()),
            Span::styled("\u{2588}", Style::default().fg(theme.status_mode_insert)),
        ]));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((state.comments_scroll, 0));
    frame.render_widget(paragraph, inner);
}
