use supabase::{OAuthProvider, User};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app::{AuthKind, PendingSave};
use crate::date_engine::DateKey;
use crate::entry_store::EntryField;
use crate::validation::Credentials;

/// Work that talks to the backend. Run in order, one at a time, between frames.
#[derive(Debug, Clone)]
pub(super) enum Action {
    SubmitAuth {
        kind: AuthKind,
        credentials: Credentials,
    },
    StartOAuth(OAuthProvider),
    CompleteOAuth {
        code: String,
        verifier: String,
    },
    OAuthFailed(String),
    /// A sign-in this app did not start itself, pushed by the gateway.
    EnterSession(User),
    Logout,
    SaveEntry(PendingSave),
    DeleteField {
        key: DateKey,
        field: EntryField,
    },
    ReloadEntries,
}

pub(super) type ActionTx = UnboundedSender<Action>;
pub(super) type ActionRx = UnboundedReceiver<Action>;

pub(super) fn channel() -> (ActionTx, ActionRx) {
    mpsc::unbounded_channel()
}
