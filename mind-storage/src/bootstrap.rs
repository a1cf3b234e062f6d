use anyhow::Result;
use std::sync::Arc;
use supabase::SupabaseClient;

use crate::app::App;
use crate::config::{MindConfig, ANON_KEY_ENV, URL_ENV};
use crate::date_engine::CivilDate;
use crate::gateway::{AuthGateway, DevBackend, Gateway, SupabaseGateway, UnconfiguredGateway};
use crate::runtime::Services;
use crate::session_store::SessionStore;

/// Pick the backend for this run. Dev mode gets a seeded in-memory backend and
/// persists nothing; otherwise the hosted backend with the saved session
/// reinstalled, or a stand-in that reports the missing configuration.
pub fn build_services(config: MindConfig, dev: bool, today: CivilDate) -> Result<Services> {
    if dev {
        return Ok(Services {
            gateway: Arc::new(DevBackend::seeded(today)),
            sessions: None,
            config,
        });
    }

    let sessions = SessionStore::default_location()?;
    let gateway: Arc<dyn Gateway> = match config.backend() {
        Some(backend) => match SupabaseClient::new(&backend.url, &backend.anon_key) {
            Ok(client) => {
                let gateway = SupabaseGateway::new(client);
                match sessions.load_session() {
                    Ok(Some(raw)) => {
                        gateway.restore_session(&raw);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Could not read saved session: {:#}", e),
                }
                Arc::new(gateway)
            }
            Err(e) => Arc::new(UnconfiguredGateway::new(format!(
                "invalid settings: {}",
                e
            ))),
        },
        None => Arc::new(UnconfiguredGateway::new(format!(
            "missing; {} and {} also work",
            URL_ENV, ANON_KEY_ENV
        ))),
    };

    Ok(Services {
        gateway,
        sessions: Some(sessions),
        config,
    })
}

/// Resume a stored session before the first frame. Without one the app stays
/// on the landing screen.
pub async fn initialize_app_state(app: &mut App, services: &Services) {
    app.is_loading = true;

    match services.gateway.current_user().await {
        Ok(Some(user)) => {
            if let Err(e) = app
                .entries
                .load(services.gateway.as_ref(), &user.id)
                .await
            {
                app.show_error(&e);
            }
            let restored = services
                .sessions
                .as_ref()
                .and_then(SessionStore::load_navigation);
            app.enter_session(user, restored);
            services.persist_session();
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Could not resume session: {}", e);
            app.show_error(&e);
        }
    }

    app.is_loading = false;
}
