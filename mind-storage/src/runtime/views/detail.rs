use crate::app::{App, Transition};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::super::action_queue::{Action, ActionTx};
use super::{enqueue_action, navigate};

pub(super) fn handle_detail_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    if app.detail.editing {
        handle_editing_key(key, app);
    } else if app.detail.delete_menu.is_some() {
        handle_delete_menu_key(key, app, action_tx);
    } else {
        handle_browsing_key(key, app, action_tx);
    }
}

fn handle_browsing_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => navigate(app, action_tx, Transition::Prev),
        KeyCode::Right | KeyCode::Char('l') => navigate(app, action_tx, Transition::Next),
        KeyCode::Esc | KeyCode::Backspace => navigate(app, action_tx, Transition::Back),
        KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::Char('j')
        | KeyCode::Char('k') => {
            app.detail.focused = app.detail.focused.other();
        }
        KeyCode::Enter | KeyCode::Char('i') => {
            if app.detail.is_covered(app.detail.focused) {
                app.detail.sad_revealed = true;
            } else {
                app.detail.editing = true;
            }
        }
        KeyCode::Char('d') | KeyCode::Char('.') => {
            if !app.detail.is_covered(app.detail.focused) {
                app.detail.delete_menu = Some(app.detail.focused);
            }
        }
        KeyCode::Char('q') => app.quit(),
        _ => {}
    }
}

fn handle_delete_menu_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            let (Some(field), Some(key)) = (app.detail.delete_menu.take(), app.detail.key.clone())
            else {
                return;
            };
            // Write any pending edit first so the delete sees it.
            if let Some(pending) = app.flush_autosave() {
                enqueue_action(action_tx, Action::SaveEntry(pending));
            }
            enqueue_action(action_tx, Action::DeleteField { key, field });
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.detail.delete_menu = None;
        }
        _ => {}
    }
}

fn handle_editing_key(key: KeyEvent, app: &mut App) {
    let input = app.detail.focused_input_mut();
    let edited = match key.code {
        KeyCode::Esc => {
            app.detail.editing = false;
            return;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.insert(c);
            true
        }
        KeyCode::Enter => {
            input.insert('\n');
            true
        }
        KeyCode::Backspace => {
            input.backspace();
            true
        }
        KeyCode::Delete => {
            input.delete();
            true
        }
        KeyCode::Left => {
            input.move_left();
            false
        }
        KeyCode::Right => {
            input.move_right();
            false
        }
        KeyCode::Home => {
            input.home();
            false
        }
        KeyCode::End => {
            input.end();
            false
        }
        _ => false,
    };
    if edited {
        app.record_edit();
    }
}
