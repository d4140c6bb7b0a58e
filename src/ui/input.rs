//! Input handling for the TUI.
//!
//! Keys are routed by focus: an active text field captures everything,
//! then global keys, then the focused panel.

use crate::app::{App, AppEvent, Focus};
use crate::sidebar::{DraftField, SidebarRow};
use crate::util::validate_url_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{apply_sidebar, refresh, start_fetch};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    if let Some(field) = app.editing {
        handle_edit_input(app, field, code, modifiers, event_tx);
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Char('r') => refresh(app, event_tx),
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        _ => match app.focus {
            Focus::Feed => handle_feed_input(app, code, event_tx),
            Focus::Sidebar => handle_sidebar_input(app, code, event_tx),
        },
    }
    Ok(Action::Continue)
}

fn handle_feed_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_expanded(),
        KeyCode::Char('m') => {
            if let Some(job) = app.request_more() {
                start_fetch(app, job, event_tx);
            } else if !app.feed.has_more() {
                app.set_status("End of feed");
            }
        }
        KeyCode::Char('o') => open_selected(app),
        KeyCode::Char('g') | KeyCode::Home => app.selected = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.selected = app.feed.items().len().saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_sidebar_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('a') => apply_sidebar(app, event_tx),
        KeyCode::Enter | KeyCode::Char(' ') => activate_sidebar_row(app, event_tx),
        _ => {}
    }
}

fn activate_sidebar_row(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(row) = app.sidebar_row() else {
        return;
    };
    match row {
        SidebarRow::Field(field) => app.editing = Some(field),
        SidebarRow::Preset(index) => app.sidebar.apply_preset(index),
        SidebarRow::Source(id) => app.sidebar.toggle_source(id),
        SidebarRow::Sort(mode) => app.sidebar.set_sort(mode),
        SidebarRow::Apply => apply_sidebar(app, event_tx),
    }
}

fn handle_edit_input(
    app: &mut App,
    field: DraftField,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match code {
        KeyCode::Esc => app.editing = None,
        KeyCode::Enter if field == DraftField::Keywords => apply_sidebar(app, event_tx),
        KeyCode::Enter | KeyCode::Tab => app.editing = None,
        KeyCode::Backspace => app.sidebar.pop_char(field),
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.sidebar.clear_field(field);
        }
        KeyCode::Char(c) => app.sidebar.push_char(field, c),
        _ => {}
    }
}

fn open_selected(app: &mut App) {
    let Some(raw) = app.selected_item().map(|item| item.url.clone()) else {
        return;
    };
    if raw.is_empty() {
        app.set_status("Item has no link");
        return;
    }
    match validate_url_for_open(&raw) {
        Err(e) => app.set_status(e),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(error = %e, "Failed to open browser");
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opened in browser");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::Config;
    use crate::feed::SortMode;
    use std::sync::Arc;

    fn app() -> App {
        let client = Arc::new(ApiClient::new("http://localhost:1").unwrap());
        App::new(client, &Config::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit));
        assert!(matches!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx).unwrap(),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_editing_captures_q() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        app.toggle_focus();
        app.sidebar_cursor = 0;
        press(&mut app, KeyCode::Enter, &tx);
        assert_eq!(app.editing, Some(DraftField::Focus));

        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(app.sidebar.focus().ends_with('q'));
        assert!(app.sidebar.is_dirty());

        press(&mut app, KeyCode::Esc, &tx);
        assert_eq!(app.editing, None);
    }

    #[tokio::test]
    async fn test_enter_in_keywords_applies() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        app.focus = Focus::Sidebar;
        app.editing = Some(DraftField::Keywords);

        press(&mut app, KeyCode::Enter, &tx);
        assert!(app.sidebar.is_applying());
        assert_eq!(app.editing, None);
    }

    #[tokio::test]
    async fn test_sidebar_sort_row() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        app.focus = Focus::Sidebar;
        app.sidebar_cursor = app
            .sidebar_rows
            .iter()
            .position(|r| *r == SidebarRow::Sort(SortMode::Date))
            .unwrap();

        press(&mut app, KeyCode::Enter, &tx);
        assert_eq!(app.sidebar.sort(), SortMode::Date);
        // Authoritative sort changes only on apply.
        assert_eq!(app.sort, SortMode::Relevance);
    }

    #[tokio::test]
    async fn test_load_more_without_next_page() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        press(&mut app, KeyCode::Char('m'), &tx);
        assert!(!app.feed.is_loading());
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_refresh_starts_reset() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = app();
        press(&mut app, KeyCode::Char('r'), &tx);
        assert!(app.feed.is_loading());
        assert!(!app.can_refresh());
    }
}
