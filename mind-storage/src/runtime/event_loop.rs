use crate::app::{Alert, App, NavigationState};
use crate::gateway::AuthGateway;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use supabase::AuthEvent;
use tokio::sync::broadcast::error::TryRecvError;

use super::action_queue::{channel, Action, ActionTx};
use super::actions::run_action;
use super::views::{handle_alert_key, handle_view_key};
use super::Services;

pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    services: &Services,
) -> Result<()> {
    let (action_tx, mut action_rx) = channel();
    let mut auth_events = services.gateway.subscribe();
    let mut saved_nav = app.user.as_ref().map(|_| app.nav);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.alert.is_some() {
                        handle_alert_key(key, app);
                    } else {
                        handle_view_key(key, app, &action_tx);
                    }
                }
            }
        }

        if let Some(pending) = app.due_autosave(Instant::now()) {
            tracing::debug!(date = %pending.key, "Autosave quiet period elapsed");
            let _ = action_tx.send(Action::SaveEntry(pending));
        }

        loop {
            match auth_events.try_recv() {
                Ok(event) => handle_auth_event(event, app, services, &action_tx),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed session events");
                }
                Err(_) => break,
            }
        }

        while let Ok(action) = action_rx.try_recv() {
            app.is_loading = true;
            app.throbber_state.calc_next();
            terminal.draw(|f| ui::render(f, app))?;
            run_action(action, app, services, &action_tx).await?;
        }
        app.is_loading = false;

        persist_navigation(app, services, &mut saved_nav);

        if !app.running {
            if let Some(pending) = app.flush_autosave() {
                run_action(Action::SaveEntry(pending), app, services, &action_tx).await?;
            }
            break;
        }
    }

    Ok(())
}

fn handle_auth_event(event: AuthEvent, app: &mut App, services: &Services, action_tx: &ActionTx) {
    match event {
        AuthEvent::SignedIn(user) => {
            if app.user.as_ref().map(|u| &u.id) != Some(&user.id) {
                let _ = action_tx.send(Action::EnterSession(user));
            }
        }
        AuthEvent::SignedOut => {
            if app.user.is_some() {
                tracing::info!("Session ended by the backend");
                app.leave_session();
                services.forget_session();
                app.show_alert(Alert::info(
                    "Signed out",
                    "Your session has ended. Please log in again.",
                ));
            }
        }
        AuthEvent::TokenRefreshed => services.persist_session(),
    }
}

/// Write the navigation state after every change, but only while signed in.
fn persist_navigation(app: &App, services: &Services, saved: &mut Option<NavigationState>) {
    if app.user.is_none() {
        *saved = None;
        return;
    }
    if *saved == Some(app.nav) {
        return;
    }
    if let Some(sessions) = &services.sessions {
        if let Err(e) = sessions.save_navigation(&app.nav) {
            tracing::warn!("Failed to save navigation state: {:#}", e);
        }
    }
    *saved = Some(app.nav);
}
