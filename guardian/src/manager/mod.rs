//! Interactive issue manager over the shared SQLite store.
//!
//! # Startup sequence (order matters)
//!
//! 1. `install_panic_hook()` — installed first so it is the innermost hook.
//!    Restores the terminal before the panic message prints.
//! 2. `register_sigterm()` — returns `Arc<AtomicBool>` polled in the event loop.
//! 3. `init_tui()` — enters alternate screen and enables raw mode.
//! 4. Create event channel and `spawn_event_task()`.
//! 5. `open_db()` + initial load — the store is read before the first frame
//!    so there is no "loading" state to manage.
//!
//! The store is shared: a review running in another terminal may append
//! issues at any moment, so the manager reloads from SQLite every 2 seconds
//! (8 ticks of the 250 ms tick interval) in addition to reloading after its
//! own writes. Selection is preserved by issue id across reloads.

pub mod app;
pub mod event;
pub mod theme;
pub mod tui;
pub mod ui;

use std::sync::atomic::Ordering;

use guardian_core::db::{self, StoreError};

use app::{AppState, Mode};
use event::AppEvent;
use theme::Theme;
use ui::keybindings::{handle_key, handle_mouse, KeyAction};

// 8 ticks at 250 ms = 2 s between background reloads.
const RELOAD_TICKS: u8 = 8;

/// Runs the manager until the user quits or the process receives SIGTERM.
///
/// `restore_tui()` is called at the single exit point after the loop; the
/// panic hook covers the panic path. The loop exits only via `break` so the
/// restore is always reached.
pub async fn run(theme: Theme, db_path: &str) -> anyhow::Result<()> {
    let mut state = AppState::default();

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let store = match db::open_db(db_path).await {
        Ok(store) => store,
        Err(e) => {
            // The terminal is already in raw mode; restore before reporting.
            tui::restore_tui()?;
            return Err(anyhow::Error::new(e).context(format!("opening issue store {db_path}")));
        }
    };
    let mut loop_result = reload(&store, &mut state).await.map_err(anyhow::Error::new);
    let mut last_selected = state.selected_issue().map(|i| i.id.clone());

    if loop_result.is_ok() {
        'event_loop: loop {
            tokio::select! {
                // Heartbeat: guarantees SIGTERM is checked at least every 50ms,
                // even when no crossterm/tick/render events arrive.
                _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                    if term_flag.load(Ordering::Relaxed) {
                        break 'event_loop;
                    }
                }
                maybe_event = rx.recv() => {
                    let action = match maybe_event {
                        Some(AppEvent::Render) => {
                            // Exactly one draw() call per Render event.
                            if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                                loop_result = Err(e.into());
                                break 'event_loop;
                            }
                            KeyAction::Continue
                        }
                        Some(AppEvent::Key(key)) => handle_key(key, &mut state),
                        Some(AppEvent::Mouse(mouse)) => handle_mouse(mouse, &mut state),
                        Some(AppEvent::Tick) => {
                            state.ticks += 1;
                            if state.ticks >= RELOAD_TICKS {
                                state.ticks = 0;
                                KeyAction::Reload
                            } else {
                                KeyAction::Continue
                            }
                        }
                        Some(AppEvent::Resize(_, _)) => {
                            // ratatui relayouts from frame.area() on the next Render.
                            KeyAction::Continue
                        }
                        Some(AppEvent::Quit) | None => break 'event_loop,
                    };

                    if let Err(e) = apply_action(action, &store, &mut state).await {
                        loop_result = Err(anyhow::Error::new(e));
                        break 'event_loop;
                    }
                    if action == KeyAction::Quit {
                        break 'event_loop;
                    }

                    // Moving the list cursor selects a different issue; fetch
                    // its comment thread.
                    let selected = state.selected_issue().map(|i| i.id.clone());
                    if selected != last_selected {
                        last_selected = selected;
                        if let Err(e) = reload_comments(&store, &mut state).await {
                            loop_result = Err(anyhow::Error::new(e));
                            break 'event_loop;
                        }
                    }

                    // Check SIGTERM after every event too, not just on the
                    // heartbeat, so quit latency is at most one event cycle.
                    if term_flag.load(Ordering::Relaxed) {
                        break 'event_loop;
                    }
                }
            }
        }
    }

    // Restore the terminal at the single exit point of the loop. Covers
    // normal quit, SIGTERM, channel close, and store errors; the panic hook
    // handles the panic path separately.
    tui::restore_tui()?;
    loop_result
}

/// Performs the store side of a `KeyAction`.
///
/// A `NotFound` from a write means the issue vanished underneath us (deleted
/// by another process between reloads); the reload that follows resynchronises
/// the view, so it is not treated as fatal.
async fn apply_action(
    action: KeyAction,
    store: &tokio_rusqlite::Connection,
    state: &mut AppState,
) -> Result<(), StoreError> {
    match action {
        KeyAction::Continue | KeyAction::Quit => Ok(()),
        KeyAction::Reload => reload(store, state).await,
        KeyAction::SetStatus(status) => {
            if let Some(id) = state.selected_issue().map(|i| i.id.clone()) {
                match db::update_status(store, &id, status).await {
                    Ok(_) | Err(StoreError::NotFound) => {}
                    Err(e) => return Err(e),
                }
                reload(store, state).await?;
            }
            Ok(())
        }
        KeyAction::SubmitComment => {
            if let Some(id) = state.selected_issue().map(|i| i.id.clone()) {
                let body = state.comment_draft.trim().to_owned();
                match db::add_comment(store, &id, &state.author, &body).await {
                    Ok(_) | Err(StoreError::NotFound) => {}
                    Err(e) => return Err(e),
                }
                state.comment_draft.clear();
                state.mode = Mode::Normal;
                reload_comments(store, state).await?;
            }
            Ok(())
        }
    }
}

/// Reloads the issue list (honouring the status filter) and the selected
/// issue's comment thread.
async fn reload(store: &tokio_rusqlite::Connection, state: &mut AppState) -> Result<(), StoreError> {
    let issues = db::list_issues(store, state.filter()).await?;
    state.apply_issues(issues);
    reload_comments(store, state).await
}

async fn reload_comments(
    store: &tokio_rusqlite::Connection,
    state: &mut AppState,
) -> Result<(), StoreError> {
    state.comments = match state.selected_issue() {
        Some(issue) => {
            let id = issue.id.clone();
            match db::list_comments(store, &id).await {
                Ok(comments) => comments,
                Err(StoreError::NotFound) => Vec::new(),
                Err(e) => return Err(e),
            }
        }
        None => Vec::new(),
    };
    Ok(())
}
