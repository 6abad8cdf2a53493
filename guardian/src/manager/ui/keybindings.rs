//! Keybinding dispatcher for the issue manager.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns
//! a `KeyAction` telling the event loop what to do next. The dispatcher
//! branches first on `state.mode` so HelpOverlay, ConfirmQuit, Insert, and
//! Normal all have isolated handler functions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use guardian_core::types::IssueStatus;
use ratatui::layout::Position;

use crate::manager::app::{AppState, Mode, PanelFocus};

/// Control-flow signal returned from the key dispatcher.
///
/// Store writes cannot happen inside the dispatcher (it is synchronous), so
/// status changes and comment submission are signalled back to the event
/// loop, which performs the async store call and reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue the event loop normally.
    Continue,
    /// Exit cleanly.
    Quit,
    /// Reload issues and comments from the store.
    Reload,
    /// Set the selected issue's status, then reload.
    SetStatus(IssueStatus),
    /// Persist the comment draft on the selected issue, then reload.
    SubmitComment,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// Mutates `state` in place and returns a `KeyAction`. The event loop calls
/// this once per received key.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    // Scroll keys first (j/k/g/G/Ctrl-d/u/f/b).
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        // Panel focus
        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') | KeyCode::Tab => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }

        // Status changes on the selected issue.
        KeyCode::Char('o') => KeyAction::SetStatus(IssueStatus::Open),
        KeyCode::Char('r') => KeyAction::SetStatus(IssueStatus::Resolved),
        KeyCode::Char('w') => KeyAction::SetStatus(IssueStatus::Wontfix),

        // Status filter cycle: all -> open -> resolved -> wontfix -> all.
        // The filter is applied by the store query, so a reload follows.
        KeyCode::Char('f') => {
            state.cycle_status_filter();
            KeyAction::Reload
        }

        // Manual reload (the 2s auto-reload covers the common case).
        KeyCode::Char('R') => KeyAction::Reload,

        // Start a comment draft.
        KeyCode::Char('c') => {
            if state.selected_issue().is_some() {
                state.mode = Mode::Insert;
                state.focus = PanelFocus::Comments;
            }
            KeyAction::Continue
        }

        // Help overlay
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }

        // Quit / confirm-quit
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.comment_draft.trim().is_empty() {
                KeyAction::Quit
            } else {
                state.mode = Mode::ConfirmQuit;
                KeyAction::Continue
            }
        }

        _ => KeyAction::Continue,
    }
}

/// Handles scroll-related keys in Normal mode: j / k / g / G and Ctrl combos.
///
/// Returns `Some(KeyAction)` when the key was consumed, `None` when it should
/// fall through to the rest of the Normal handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.scroll_down(1);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.scroll_up(1);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('g') => {
            state.scroll_top();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('G') => {
            state.scroll_bottom();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('d') if ctrl => {
            state.half_page_down();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('u') if ctrl => {
            state.half_page_up();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('f') if ctrl => {
            state.full_page_down();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('b') if ctrl => {
            state.full_page_up();
            Some(KeyAction::Continue)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

/// Any of `?`, `Esc`, or `q` dismisses the overlay; j/k/g/G scroll it.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => {
            state.help_scroll = state.help_scroll.saturating_add(1);
            KeyAction::Continue
        }
        KeyCode::Char('k') => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
            KeyAction::Continue
        }
        KeyCode::Char('g') => {
            state.help_scroll = 0;
            KeyAction::Continue
        }
        KeyCode::Char('G') => {
            state.help_scroll = u16::MAX;
            KeyAction::Continue
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// ConfirmQuit mode
// ---------------------------------------------------------------------------

/// `y` / `Y` discards the draft and quits. `n` / `N` / `Esc` cancels.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Edits the comment draft. `Enter` submits a non-blank draft, `Esc` leaves
/// Insert mode keeping the draft (the quit path guards it).
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Enter => {
            if state.comment_draft.trim().is_empty() {
                KeyAction::Continue
            } else {
                KeyAction::SubmitComment
            }
        }
        KeyCode::Backspace => {
            state.comment_draft.pop();
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            state.comment_draft.push(c);
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// Left click on a panel sets focus to that panel. Scroll wheel moves the
/// focused panel by 3 lines, or the help overlay when it is open.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            handle_mouse_click(mouse.column, mouse.row, state)
        }
        MouseEventKind::ScrollUp => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_sub(3);
            } else {
                state.scroll_up(3);
            }
            KeyAction::Continue
        }
        MouseEventKind::ScrollDown => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_add(3);
            } else {
                state.scroll_down(3);
            }
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

/// Sets panel focus based on the clicked screen position. Panels with zero
/// width are skipped so collapsed panels cannot receive focus via click.
fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) -> KeyAction {
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;

    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::IssueList;
    } else if center.contains(pos) {
        state.focus = PanelFocus::Detail;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Comments;
    }

    KeyAction::Continue
}
