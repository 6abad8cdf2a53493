//! Responsive 3-panel layout engine for the issue manager.
//!
//! This module is pure layout arithmetic — no mutable application state lives
//! here. It is called inside `terminal.draw()` on every render so every frame
//! gets a fresh layout that reflects the current terminal size.
//!
//! At `>= 120` columns all three panels are visible (25 / 50 / 25). Below 120
//! columns both side panels collapse and the detail panel fills the width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column and merge their junction
//! box-drawing characters automatically.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::manager::app::{AppState, Mode};
use crate::manager::theme::Theme;

/// Returns `[left, center, right, status_bar]` panel `Rect`s for the current
/// frame. Valid only inside the current draw closure — never store them
/// across frames (the click hit-test copy in `AppState.panel_rects` is
/// refreshed every render).
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let horizontal = if term_width >= 120 {
        Layout::horizontal([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .spacing(Spacing::Overlap(1))
    } else {
        Layout::horizontal([
            Constraint::Length(0),
            Constraint::Fill(1),
            Constraint::Length(0),
        ])
        .spacing(Spacing::Overlap(1))
    };

    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on
/// each side. Used to cache viewport heights in `AppState` before panels are
/// rendered, so page-scroll distances are available at keypress time.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// `BorderType::Thick` when focused, `Plain` otherwise. `MergeStrategy::Fuzzy`
/// because `Exact` produces incorrect junctions when mixing Thick and Plain
/// borders.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Always shows a mode indicator, the active status filter, and the loaded
/// issue count. `HelpOverlay` and `ConfirmQuit` display `NORMAL` because the
/// underlying mode is Normal — the overlay is a transient layer, not a mode
/// change.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let filter_text = match state.status_filter {
        None => "filter: all".to_owned(),
        Some(status) => format!("filter: {}", status.as_str()),
    };

    let status_line = Line::from(vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}  {} issues ", filter_text, state.issues.len())),
        Span::styled("f filter  o/r/w status  c comment  ? help", Style::default().fg(theme.text_dim)),
    ]);

    frame.render_widget(
        Paragraph::new(status_line)
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
