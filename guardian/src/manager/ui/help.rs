//! Help overlay renderer.
//!
//! Draws a centred modal box over the panel layout using ratatui's `Clear`
//! widget to erase the background first. The overlay is rendered inside the
//! same `terminal.draw()` closure as all other panels.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::manager::theme::Theme;

/// Renders the help overlay as a centred modal on top of the 3-panel layout.
///
/// Skipped on terminals narrower than 60 columns to avoid a zero-height
/// `Rect` panic.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  | j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Scroll down / up one line"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Scroll half page down / up"),
        Line::from("  Ctrl-f / b    Scroll full page down / up"),
        Line::from("  H / L / Tab   Move panel focus left / right"),
        Line::from(""),
        Line::from("Issues"),
        Line::from("  o / r / w     Mark selected issue open / resolved / wontfix"),
        Line::from("  f             Cycle status filter: all, open, resolved, wontfix"),
        Line::from("  R             Reload from the store now"),
        Line::from(""),
        Line::from("Comments"),
        Line::from("  c             Start a comment on the selected issue"),
        Line::from("  Enter         Submit the comment draft"),
        Line::from("  Esc           Leave insert mode (draft is kept)"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit (confirms if a comment draft exists)"),
    ])
}
