use crate::app::{App, Screen, Transition};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action_queue::{Action, ActionTx};

mod auth_modal;
mod calendar;
mod detail;
mod landing;

fn enqueue_action(action_tx: &ActionTx, action: Action) {
    let _ = action_tx.send(action);
}

/// Navigate, saving whatever the detail editor still held for the old day.
fn navigate(app: &mut App, action_tx: &ActionTx, transition: Transition) {
    if let Some(pending) = app.navigate(transition) {
        enqueue_action(action_tx, Action::SaveEntry(pending));
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

pub(super) fn handle_alert_key(key: KeyEvent, app: &mut App) {
    if is_ctrl_c(&key) {
        app.quit();
        return;
    }
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
        app.dismiss_alert();
    }
}

pub(super) fn handle_view_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    if is_ctrl_c(&key) {
        app.quit();
        return;
    }
    if app.auth_modal.is_some() {
        auth_modal::handle_auth_modal_key(key, app, action_tx);
        return;
    }
    match app.nav.screen {
        Screen::Landing => landing::handle_landing_key(key, app),
        Screen::Year | Screen::Month | Screen::Day => {
            calendar::handle_calendar_key(key, app, action_tx)
        }
        Screen::Detail => detail::handle_detail_key(key, app, action_tx),
    }
}
