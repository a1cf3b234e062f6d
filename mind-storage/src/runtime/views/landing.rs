use crate::app::{App, AuthKind};
use crossterm::event::{KeyCode, KeyEvent};

pub(super) fn handle_landing_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            app.landing_choice = app.landing_choice.toggle();
        }
        KeyCode::Enter => app.open_auth_modal(app.landing_choice),
        KeyCode::Char('l') => app.open_auth_modal(AuthKind::Login),
        KeyCode::Char('s') => app.open_auth_modal(AuthKind::SignUp),
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        _ => {}
    }
}
