use crate::app::{App, AuthField};
use crate::validation::Credentials;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use supabase::OAuthProvider;

use super::super::action_queue::{Action, ActionTx};
use super::enqueue_action;

pub(super) fn handle_auth_modal_key(key: KeyEvent, app: &mut App, action_tx: &ActionTx) {
    let Some(modal) = app.auth_modal.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.close_auth_modal(),
        KeyCode::Tab | KeyCode::Down => modal.focused = modal.focused.next(),
        KeyCode::BackTab | KeyCode::Up => modal.focused = modal.focused.previous(),
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            modal.kind = modal.kind.toggle();
            modal.error = None;
            modal.notice = None;
        }
        KeyCode::Enter => match modal.focused {
            AuthField::Google => enqueue_action(action_tx, Action::StartOAuth(OAuthProvider::Google)),
            AuthField::Apple => enqueue_action(action_tx, Action::StartOAuth(OAuthProvider::Apple)),
            AuthField::Email | AuthField::Password => {
                if !modal.can_submit() {
                    modal.error = Some("Enter your email and password.".to_string());
                    return;
                }
                match Credentials::validate(&modal.email.value, &modal.password.value) {
                    Ok(credentials) => {
                        modal.error = None;
                        enqueue_action(
                            action_tx,
                            Action::SubmitAuth {
                                kind: modal.kind,
                                credentials,
                            },
                        );
                    }
                    Err(e) => modal.error = Some(e.to_string()),
                }
            }
        },
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(input) = modal.focused_input() {
                input.insert(c);
                modal.error = None;
            }
        }
        KeyCode::Backspace => {
            if let Some(input) = modal.focused_input() {
                input.backspace();
            }
        }
        KeyCode::Left => {
            if let Some(input) = modal.focused_input() {
                input.move_left();
            }
        }
        KeyCode::Right => {
            if let Some(input) = modal.focused_input() {
                input.move_right();
            }
        }
        _ => {}
    }
}
