//! UI rendering for the issue manager.
//!
//! This is the module root for `ui/`. It re-exports `render()` as the single
//! entry point called by the event loop's `terminal.draw()` closure.
//!
//! Layout arithmetic lives in `layout.rs`; the three panels have one renderer
//! module each.

mod layout;
pub mod comments;
pub mod detail;
pub mod help;
pub mod issue_list;
pub mod keybindings;

use ratatui::{
    Frame,
    layout::Constraint,
    text::Line,
    widgets::{Block, Clear, Paragraph},
};

use crate::manager::app::{AppState, Mode};
use crate::manager::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame: 3-panel layout, status bar, and overlays.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()` — the
/// only location where `terminal.draw()` is called in the application.
///
/// Viewport heights and panel rects are written back into `state` so that
/// scroll operations and click hit-tests triggered by the *next* input can
/// use them. The one-frame lag is imperceptible in practice.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, status_bar] = compute_layout(frame);

    state.issue_list_viewport_height = inner_rect(left).height;
    state.detail_viewport_height = inner_rect(center).height;
    state.comments_viewport_height = inner_rect(right).height;
    state.panel_rects = [left, center, right];

    let focus = state.focus;

    // Collapsed panels (narrow terminals) are skipped entirely.
    if left.width > 0 {
        issue_list::render_issue_list(frame, left, focus, state, theme);
    }

    detail::render_detail(frame, center, focus, state, theme);

    if right.width > 0 {
        comments::render_comments(frame, right, focus, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    // Overlays render after all panels so they sit on top.
    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
    if state.mode == Mode::ConfirmQuit {
        render_confirm_quit(frame, theme);
    }
}

/// Small centred dialog guarding quit while a comment draft exists.
fn render_confirm_quit(frame: &mut Frame, theme: &Theme) {
    if frame.area().width < 50 {
        return;
    }
    let area = frame
        .area()
        .centered(Constraint::Length(46), Constraint::Length(4));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Unsent comment ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));
    let body = Paragraph::new(vec![
        Line::from("Discard the comment draft and quit?"),
        Line::from("  y: quit    n / Esc: keep editing"),
    ])
    .block(block);
    frame.render_widget(body, area);
}
