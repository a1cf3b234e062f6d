use std::time::{Duration, Instant};

use crate::date_engine::DateKey;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Editor contents waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub key: DateKey,
    pub happy: String,
    pub sad: String,
}

/// Debounce for detail edits. Each edit restarts the quiet period; only the
/// latest contents are ever handed out.
#[derive(Debug, Clone)]
pub struct Autosave {
    quiet: Duration,
    pending: Option<PendingSave>,
    last_edit: Option<Instant>,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Autosave {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_edit: None,
        }
    }

    pub fn record(&mut self, save: PendingSave, at: Instant) {
        self.pending = Some(save);
        self.last_edit = Some(at);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending save once the quiet period has passed since the last edit.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingSave> {
        let last_edit = self.last_edit?;
        if now.saturating_duration_since(last_edit) < self.quiet {
            return None;
        }
        self.flush()
    }

    /// The pending save right away, e.g. before leaving the day.
    pub fn flush(&mut self) -> Option<PendingSave> {
        self.last_edit = None;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_edit = None;
    }
}
