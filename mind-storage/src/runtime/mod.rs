use std::sync::Arc;

use crate::config::MindConfig;
use crate::gateway::{AuthGateway, Gateway};
use crate::session_store::SessionStore;

mod action_queue;
mod actions;
mod event_loop;
mod views;

pub use event_loop::run_app;

/// What the event loop talks to besides the terminal.
pub struct Services {
    pub gateway: Arc<dyn Gateway>,
    /// `None` in dev mode, where nothing is persisted.
    pub sessions: Option<SessionStore>,
    pub config: MindConfig,
}

impl Services {
    /// Store the gateway's current session, if it has one worth keeping.
    pub fn persist_session(&self) {
        let (Some(sessions), Some(raw)) = (&self.sessions, self.gateway.export_session()) else {
            return;
        };
        if let Err(e) = sessions.save_session(&raw) {
            tracing::warn!("Failed to save session: {:#}", e);
        }
    }

    pub fn forget_session(&self) {
        if let Some(sessions) = &self.sessions {
            if let Err(e) = sessions.clear() {
                tracing::warn!("Failed to clear saved session: {:#}", e);
            }
        }
    }
}
