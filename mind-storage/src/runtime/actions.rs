use anyhow::Result;
use supabase::User;

use crate::app::{Alert, App, AuthKind, AuthModalState, PendingSave, TextInput};
use crate::date_engine::DateKey;
use crate::entry_store::EntryField;
use crate::error::AppError;
use crate::gateway::{AuthGateway, SignUpResult};
use crate::login;
use crate::validation::Credentials;

use super::action_queue::{Action, ActionTx};
use super::Services;

pub(super) async fn run_action(
    action: Action,
    app: &mut App,
    services: &Services,
    action_tx: &ActionTx,
) -> Result<()> {
    match action {
        Action::SubmitAuth { kind, credentials } => {
            handle_submit_auth(app, services, kind, credentials).await;
        }
        Action::StartOAuth(provider) => {
            let redirect_to = services.config.oauth_redirect_url();
            match services.gateway.oauth_request(provider, &redirect_to) {
                Ok(request) => {
                    login::open_browser(&request.url);
                    app.set_status(format!("Finish the {} login in your browser", provider));
                    spawn_oauth_listener(
                        services.config.oauth_callback_port,
                        request.code_verifier,
                        action_tx.clone(),
                    );
                }
                Err(e) => app.show_error(&e),
            }
        }
        Action::CompleteOAuth { code, verifier } => {
            app.clear_status();
            match services.gateway.complete_oauth(&code, &verifier).await {
                Ok(user) => start_session(app, services, user).await,
                Err(e) => app.show_error(&e),
            }
        }
        Action::OAuthFailed(reason) => {
            app.clear_status();
            app.show_alert(Alert::info("Login failed", reason));
        }
        Action::EnterSession(user) => {
            start_session(app, services, user).await;
        }
        Action::Logout => {
            if let Err(e) = services.gateway.sign_out().await {
                tracing::warn!("Remote sign-out failed: {}", e);
            }
            app.leave_session();
            services.forget_session();
        }
        Action::SaveEntry(pending) => {
            handle_save_entry(app, services, pending).await;
        }
        Action::DeleteField { key, field } => {
            handle_delete_field(app, services, key, field).await;
        }
        Action::ReloadEntries => {
            let Some(user_id) = app.user_id().map(str::to_string) else {
                return Ok(());
            };
            if let Err(e) = app.entries.load(services.gateway.as_ref(), &user_id).await {
                report(app, services, e);
            }
        }
    }
    Ok(())
}

async fn handle_submit_auth(
    app: &mut App,
    services: &Services,
    kind: AuthKind,
    credentials: Credentials,
) {
    let outcome = match kind {
        AuthKind::Login => services.gateway.sign_in(&credentials).await.map(Some),
        AuthKind::SignUp => match services.gateway.sign_up(&credentials).await {
            Ok(SignUpResult::SignedIn(user)) => Ok(Some(user)),
            Ok(SignUpResult::ConfirmationRequired) => Ok(None),
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(Some(user)) => start_session(app, services, user).await,
        Ok(None) => {
            let mut modal = AuthModalState::new(AuthKind::Login);
            modal.email = TextInput::from_str(credentials.email.as_ref());
            modal.notice = Some(
                "Account created. Confirm it from the e-mail we sent, then log in.".to_string(),
            );
            app.auth_modal = Some(modal);
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", kind.title(), e);
            app.show_error(&e);
        }
    }
}

/// Load the user's entries and switch to the signed-in screens.
async fn start_session(app: &mut App, services: &Services, user: User) {
    if let Err(e) = app.entries.load(services.gateway.as_ref(), &user.id).await {
        app.show_error(&e);
    }
    app.enter_session(user, None);
    services.persist_session();
}

async fn handle_save_entry(app: &mut App, services: &Services, pending: PendingSave) {
    let Some(user_id) = app.user_id().map(str::to_string) else {
        return;
    };
    tracing::debug!(date = %pending.key, "Saving entry");
    if let Err(e) = app
        .entries
        .save(
            services.gateway.as_ref(),
            &user_id,
            &pending.key,
            &pending.happy,
            &pending.sad,
        )
        .await
    {
        // The editor keeps the text; the next edit re-arms the autosave.
        report(app, services, e);
    }
}

async fn handle_delete_field(app: &mut App, services: &Services, key: DateKey, field: EntryField) {
    let Some(user_id) = app.user_id().map(str::to_string) else {
        return;
    };
    match app
        .entries
        .delete_field(services.gateway.as_ref(), &user_id, &key, field)
        .await
    {
        Ok(()) => {
            if app.detail.key.as_ref() == Some(&key) {
                app.field_deleted(field);
            }
        }
        Err(e) => report(app, services, e),
    }
}

/// Show `err`; an expired session also ends the session locally.
fn report(app: &mut App, services: &Services, err: AppError) {
    if err.is_session_expired() && app.user.is_some() {
        app.leave_session();
        services.forget_session();
    }
    app.show_error(&err);
}

fn spawn_oauth_listener(port: u16, verifier: String, action_tx: ActionTx) {
    tokio::spawn(async move {
        let action = match login::wait_for_code(port).await {
            Ok(code) => Action::CompleteOAuth { code, verifier },
            Err(e) => Action::OAuthFailed(format!("{:#}", e)),
        };
        let _ = action_tx.send(action);
    });
}
