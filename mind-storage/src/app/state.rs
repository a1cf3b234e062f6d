use crate::date_engine::DateKey;
use crate::entry_store::{Entry, EntryField};
use crate::error::AppError;

/// Single-line or multi-line text buffer with a byte cursor kept on char boundaries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            value: s.to_string(),
            cursor: s.len(),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.value.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.value.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// (before, after) the cursor.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.value.split_at(self.cursor)
    }

    /// One bullet per character, for password fields.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.chars().count())
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.value[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    SignUp,
}

impl AuthKind {
    pub fn title(self) -> &'static str {
        match self {
            AuthKind::Login => "login",
            AuthKind::SignUp => "sign up",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            AuthKind::Login => AuthKind::SignUp,
            AuthKind::SignUp => AuthKind::Login,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
    Google,
    Apple,
}

impl AuthField {
    pub fn next(self) -> Self {
        match self {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Google,
            AuthField::Google => AuthField::Apple,
            AuthField::Apple => AuthField::Email,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            AuthField::Email => AuthField::Apple,
            AuthField::Password => AuthField::Email,
            AuthField::Google => AuthField::Password,
            AuthField::Apple => AuthField::Google,
        }
    }
}

/// Login / sign-up overlay shown above the landing screen.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthModalState {
    pub kind: AuthKind,
    pub email: TextInput,
    pub password: TextInput,
    pub focused: AuthField,
    /// Inline validation message. Backend errors go to the alert instead.
    pub error: Option<String>,
    /// Set after a sign-up that needs e-mail confirmation.
    pub notice: Option<String>,
}

impl AuthModalState {
    pub fn new(kind: AuthKind) -> Self {
        Self {
            kind,
            email: TextInput::new(),
            password: TextInput::new(),
            focused: AuthField::Email,
            error: None,
            notice: None,
        }
    }

    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focused {
            AuthField::Email => Some(&mut self.email),
            AuthField::Password => Some(&mut self.password),
            AuthField::Google | AuthField::Apple => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.email.value.trim().is_empty() && !self.password.is_empty()
    }
}

/// Editor state for the day currently open on the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub key: Option<DateKey>,
    pub happy: TextInput,
    pub sad: TextInput,
    pub focused: EntryField,
    pub editing: bool,
    /// The sad box starts covered and is hidden again on every date change.
    pub sad_revealed: bool,
    /// Field whose "…" delete menu is open.
    pub delete_menu: Option<EntryField>,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            key: None,
            happy: TextInput::new(),
            sad: TextInput::new(),
            focused: EntryField::Happy,
            editing: false,
            sad_revealed: false,
            delete_menu: None,
        }
    }
}

impl DetailState {
    pub fn open(key: DateKey, entry: Option<&Entry>) -> Self {
        let entry = entry.cloned().unwrap_or_default();
        Self {
            key: Some(key),
            happy: TextInput::from_str(&entry.happy),
            sad: TextInput::from_str(&entry.sad),
            ..Self::default()
        }
    }

    pub fn input(&self, field: EntryField) -> &TextInput {
        match field {
            EntryField::Happy => &self.happy,
            EntryField::Sad => &self.sad,
        }
    }

    pub fn focused_input_mut(&mut self) -> &mut TextInput {
        match self.focused {
            EntryField::Happy => &mut self.happy,
            EntryField::Sad => &mut self.sad,
        }
    }

    pub fn is_covered(&self, field: EntryField) -> bool {
        field == EntryField::Sad && !self.sad_revealed
    }
}

/// Blocking message box. Swallows all input until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl From<&AppError> for Alert {
    fn from(err: &AppError) -> Self {
        Self {
            title: err.title().to_string(),
            message: err.user_message(),
        }
    }
}
