use std::sync::Arc;
use std::time::{Duration, Instant};

use supabase::User;

use crate::date_engine::{self, CivilDate, Clock};
use crate::entry_store::{EntryField, EntryStore};
use crate::error::AppError;

mod autosave;
mod navigation;
mod state;
pub use autosave::{Autosave, PendingSave};
pub use navigation::{NavigationState, Screen, Transition};
pub use state::{Alert, AuthField, AuthKind, AuthModalState, DetailState, TextInput};

pub struct App {
    pub running: bool,
    pub clock: Arc<dyn Clock>,
    pub user: Option<User>,
    pub entries: EntryStore,
    pub nav: NavigationState,

    /// Highlighted row on the year, month and day lists (a year, month or day number).
    pub highlight: i32,
    /// Landing screen button under the cursor.
    pub landing_choice: AuthKind,
    pub auth_modal: Option<AuthModalState>,
    pub detail: DetailState,
    pub autosave: Autosave,

    pub alert: Option<Alert>,
    pub status_message: Option<String>,

    // Loading indicator
    pub is_loading: bool,
    pub throbber_state: throbber_widgets_tui::ThrobberState,
}

impl App {
    pub fn new(clock: Arc<dyn Clock>, autosave_quiet: Duration) -> Self {
        let today = date_engine::today(clock.as_ref());
        Self {
            running: true,
            clock,
            user: None,
            entries: EntryStore::new(),
            nav: NavigationState::cold_start(today),
            highlight: 0,
            landing_choice: AuthKind::Login,
            auth_modal: None,
            detail: DetailState::default(),
            autosave: Autosave::new(autosave_quiet),
            alert: None,
            status_message: None,
            is_loading: false,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    pub fn today(&self) -> CivilDate {
        date_engine::today(self.clock.as_ref())
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn show_error(&mut self, err: &AppError) {
        self.alert = Some(Alert::from(err));
    }

    pub fn show_alert(&mut self, alert: Alert) {
        self.alert = Some(alert);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn open_auth_modal(&mut self, kind: AuthKind) {
        self.auth_modal = Some(AuthModalState::new(kind));
    }

    pub fn close_auth_modal(&mut self) {
        self.auth_modal = None;
    }

    /// Enter the signed-in screens. `restored` is the navigation state saved
    /// by an earlier run, used only when it still makes sense today.
    pub fn enter_session(&mut self, user: User, restored: Option<NavigationState>) {
        let today = self.today();
        tracing::info!(user_id = %user.id, "Signed in");
        self.user = Some(user);
        self.auth_modal = None;
        self.nav = match restored {
            Some(nav) if nav.is_resumable(today) => nav,
            _ => NavigationState::after_login(today, !self.entries.is_empty()),
        };
        self.on_screen_changed();
    }

    /// Drop everything that belongs to the session. Unsaved edits are lost.
    pub fn leave_session(&mut self) {
        if self.user.take().is_some() {
            tracing::info!("Signed out");
        }
        self.entries.clear();
        self.autosave.cancel();
        self.detail = DetailState::default();
        self.auth_modal = None;
        let today = self.today();
        self.nav = self
            .nav
            .apply(Transition::Logout, today)
            .unwrap_or_else(|| NavigationState::cold_start(today));
        self.on_screen_changed();
    }

    /// Apply a navigation transition. Returns any edit that must be saved
    /// before the detail screen moves on.
    pub fn navigate(&mut self, transition: Transition) -> Option<PendingSave> {
        let next = self.nav.apply(transition, self.today())?;
        let pending = self.flush_autosave();
        self.nav = next;
        self.on_screen_changed();
        pending
    }

    pub fn can_navigate(&self, transition: Transition) -> bool {
        self.nav.can_apply(transition, self.today())
    }

    fn on_screen_changed(&mut self) {
        self.highlight = match self.nav.screen {
            Screen::Landing | Screen::Detail => 0,
            Screen::Year => self.nav.selected_year,
            Screen::Month => i32::from(self.nav.selected_month),
            Screen::Day => i32::from(self.nav.selected_day),
        };
        if self.nav.screen == Screen::Detail {
            self.reload_detail();
        } else {
            self.detail = DetailState::default();
        }
    }

    /// Reset the detail editor from the store for the selected day.
    pub fn reload_detail(&mut self) {
        let key = self.nav.selected_date().key();
        self.detail = DetailState::open(key.clone(), self.entries.get(&key));
    }

    /// Bounds of the highlighted row on the current list screen.
    pub fn highlight_range(&self) -> Option<(i32, i32)> {
        let today = self.today();
        match self.nav.screen {
            Screen::Year => Some((date_engine::FIRST_YEAR, today.year)),
            Screen::Month => Some((
                1,
                i32::from(date_engine::last_selectable_month(
                    self.nav.selected_year,
                    today,
                )),
            )),
            Screen::Day => Some((
                1,
                i32::from(date_engine::last_selectable_day(
                    self.nav.selected_year,
                    self.nav.selected_month,
                    today,
                )),
            )),
            Screen::Landing | Screen::Detail => None,
        }
    }

    pub fn move_highlight(&mut self, delta: i32) {
        if let Some((low, high)) = self.highlight_range() {
            self.highlight = (self.highlight + delta).clamp(low, high);
        }
    }

    /// Transition that selects the highlighted row.
    pub fn select_highlighted(&self) -> Option<Transition> {
        match self.nav.screen {
            Screen::Year => Some(Transition::SelectYear(self.highlight)),
            Screen::Month => u8::try_from(self.highlight).ok().map(Transition::SelectMonth),
            Screen::Day => u8::try_from(self.highlight).ok().map(Transition::SelectDay),
            Screen::Landing | Screen::Detail => None,
        }
    }

    /// Restart the autosave quiet period with the current editor contents.
    pub fn record_edit(&mut self) {
        let Some(key) = self.detail.key.clone() else {
            return;
        };
        self.autosave.record(
            PendingSave {
                key,
                happy: self.detail.happy.value.clone(),
                sad: self.detail.sad.value.clone(),
            },
            Instant::now(),
        );
    }

    /// A debounced save that is due and would change what is stored.
    pub fn due_autosave(&mut self, now: Instant) -> Option<PendingSave> {
        let pending = self.autosave.take_due(now)?;
        self.differs_from_stored(&pending).then_some(pending)
    }

    /// Pending edit to write right away (leaving the day, deleting a field,
    /// exiting), if it changes anything.
    pub fn flush_autosave(&mut self) -> Option<PendingSave> {
        let pending = self.autosave.flush()?;
        self.differs_from_stored(&pending).then_some(pending)
    }

    fn differs_from_stored(&self, pending: &PendingSave) -> bool {
        let stored = self.entries.get(&pending.key).cloned().unwrap_or_default();
        stored.happy.trim() != pending.happy.trim() || stored.sad.trim() != pending.sad.trim()
    }

    /// Clear one editor box after its field was deleted remotely.
    pub fn field_deleted(&mut self, field: EntryField) {
        self.detail.delete_menu = None;
        match field {
            EntryField::Happy => self.detail.happy.clear(),
            EntryField::Sad => self.detail.sad.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_engine::clock_at;
    use crate::gateway::{AuthGateway, DevBackend};
    use crate::validation::Credentials;

    fn app() -> App {
        App::new(Arc::new(clock_at(2024, 6, 15)), Duration::from_millis(500))
    }

    async fn sign_in(app: &mut App, backend: &DevBackend) {
        let user = backend
            .sign_in(&Credentials::validate("new@user.co", "secret1").unwrap())
            .await
            .unwrap();
        app.entries.load(backend, &user.id).await.unwrap();
        app.enter_session(user, None);
    }

    #[tokio::test]
    async fn first_login_lands_on_year_and_first_note_marks_the_month() {
        let backend = DevBackend::new();
        let mut app = app();
        sign_in(&mut app, &backend).await;

        assert_eq!(app.nav.screen, Screen::Year);
        assert!((2020..=2024).all(|year| !app.entries.has_data_for_year(year)));

        let user_id = app.user_id().unwrap().to_string();
        let today = app.today().key();
        app.entries
            .save(&backend, &user_id, &today, "good day", "")
            .await
            .unwrap();

        assert!(app.entries.has_data_for_month(2024, 6));
        assert!(app.entries.has_data_for_year(2024));
    }

    #[tokio::test]
    async fn returning_user_lands_on_todays_detail() {
        let backend = DevBackend::seeded(CivilDate::new(2024, 6, 15));
        let user = backend.current_user().await.unwrap().unwrap();
        let mut app = app();
        app.entries.load(&backend, &user.id).await.unwrap();
        app.enter_session(user, None);

        assert_eq!(app.nav.screen, Screen::Detail);
        assert_eq!(app.nav.selected_date(), CivilDate::new(2024, 6, 15));
        assert_eq!(app.detail.key, Some(CivilDate::new(2024, 6, 15).key()));
    }

    #[tokio::test]
    async fn restored_navigation_is_used_only_when_still_valid() {
        let backend = DevBackend::new();
        let user = backend
            .sign_in(&Credentials::validate("a@b.co", "secret1").unwrap())
            .await
            .unwrap();

        let mut restored = NavigationState::after_login(CivilDate::new(2023, 1, 5), true);
        restored.screen = Screen::Day;
        let mut app = app();
        app.enter_session(user.clone(), Some(restored));
        assert_eq!(app.nav, restored);
        assert_eq!(app.highlight, 5);

        let mut future = restored;
        future.selected_year = 2030;
        let mut app = self::app();
        app.enter_session(user, Some(future));
        assert_eq!(app.nav.screen, Screen::Year);
    }

    #[tokio::test]
    async fn leaving_the_day_flushes_the_edit_and_logout_clears_everything() {
        let backend = DevBackend::seeded(CivilDate::new(2024, 6, 15));
        let user = backend.current_user().await.unwrap().unwrap();
        let mut app = app();
        app.entries.load(&backend, &user.id).await.unwrap();
        app.enter_session(user, None);

        app.detail.happy.insert('!');
        app.record_edit();
        app.detail.sad_revealed = true;

        let flushed = app.navigate(Transition::Prev).unwrap();
        assert_eq!(flushed.key, CivilDate::new(2024, 6, 15).key());
        assert_eq!(flushed.happy, "!");
        assert!(!app.detail.sad_revealed);
        assert_eq!(app.nav.selected_date(), CivilDate::new(2024, 6, 14));

        app.leave_session();
        assert!(app.user.is_none());
        assert!(app.entries.is_empty());
        assert_eq!(app.nav, NavigationState::cold_start(app.today()));
        assert_eq!(app.nav.screen, Screen::Landing);

        app.leave_session();
        assert_eq!(app.nav.screen, Screen::Landing);
    }

    #[test]
    fn unchanged_edits_are_not_saved() {
        let mut app = app();
        app.nav = NavigationState::after_login(app.today(), true);
        app.reload_detail();

        app.record_edit();
        assert_eq!(app.due_autosave(Instant::now() + Duration::from_secs(1)), None);

        app.detail.happy.insert('x');
        app.record_edit();
        assert!(app.due_autosave(Instant::now()).is_none());
        let due = app.due_autosave(Instant::now() + Duration::from_secs(1)).unwrap();
        assert_eq!(due.happy, "x");
    }

    #[tokio::test]
    async fn reopening_a_note_with_trailing_newline_does_not_resave_it() {
        let backend = DevBackend::new();
        let mut app = app();
        sign_in(&mut app, &backend).await;
        let user_id = app.user_id().unwrap().to_string();
        let today = app.today().key();
        app.entries
            .save(&backend, &user_id, &today, "good day\n", " ")
            .await
            .unwrap();

        app.nav = NavigationState::after_login(app.today(), true);
        app.reload_detail();
        app.detail.happy = TextInput::from_str("good day \n");
        app.record_edit();

        assert_eq!(app.due_autosave(Instant::now() + Duration::from_secs(1)), None);
    }

    #[test]
    fn highlight_stays_within_selectable_rows() {
        let mut app = app();
        app.nav = NavigationState::after_login(app.today(), false);
        app.highlight = 2024;
        app.move_highlight(1);
        assert_eq!(app.highlight, 2024);
        app.move_highlight(-10);
        assert_eq!(app.highlight, 2020);
        assert_eq!(app.select_highlighted(), Some(Transition::SelectYear(2020)));
    }
}
