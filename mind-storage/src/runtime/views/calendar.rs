use crate::app::{App, Screen, Transition};
use crossterm::event::{KeyCode, KeyEvent};

use super::super::action_queue::{Action, ActionTx};
use super::{enqueue_action, navigate};

/// Year, month and day lists share their keys: j/k move, Enter opens,
/// h/l page the month list by year and the day list by month.
pub(super) fn handle_calendar_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_highlight(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_highlight(1),
        KeyCode::Enter => {
            if let Some(transition) = app.select_highlighted() {
                navigate(app, action_tx, transition);
            }
        }
        KeyCode::Left | KeyCode::Char('h') => navigate(app, action_tx, Transition::Prev),
        KeyCode::Right | KeyCode::Char('l') => navigate(app, action_tx, Transition::Next),
        KeyCode::Esc | KeyCode::Backspace => navigate(app, action_tx, Transition::Back),
        KeyCode::Char('L') if app.nav.screen == Screen::Year => {
            if let Some(pending) = app.flush_autosave() {
                enqueue_action(action_tx, Action::SaveEntry(pending));
            }
            enqueue_action(action_tx, Action::Logout);
        }
        KeyCode::Char('r') => enqueue_action(action_tx, Action::ReloadEntries),
        KeyCode::Char('q') => app.quit(),
        _ => {}
    }
}
