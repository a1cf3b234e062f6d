//! Seam between the app and the hosted auth/row-store service.

use async_trait::async_trait;
use supabase::{AuthEvent, OAuthProvider, OAuthRequest, User};
use tokio::sync::broadcast;

use crate::date_engine::DateKey;
use crate::entry_store::{Entry, EntryMap};
use crate::error::AppError;
use crate::validation::Credentials;

mod dev_backend;
mod supabase_gateway;
mod unconfigured;

pub use dev_backend::{DevBackend, DEV_EMAIL};
pub use supabase_gateway::SupabaseGateway;
pub use unconfigured::UnconfiguredGateway;

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpResult {
    SignedIn(User),
    /// Account created, but it must be confirmed by e-mail before logging in.
    ConfirmationRequired,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AppError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpResult, AppError>;

    /// Browser URL for an OAuth sign-in that redirects to `redirect_to`.
    fn oauth_request(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRequest, AppError>;

    async fn complete_oauth(&self, auth_code: &str, code_verifier: &str)
        -> Result<User, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    async fn current_user(&self) -> Result<Option<User>, AppError>;

    async fn delete_account(&self, user_id: &str) -> Result<(), AppError>;

    /// Push notifications of sign-in and sign-out.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Serialized session worth persisting between runs, if any.
    fn export_session(&self) -> Option<String> {
        None
    }
}

/// Row-store operations. One record per `(user_id, date)`.
#[async_trait]
pub trait EntryGateway: Send + Sync {
    async fn list_entries(&self, user_id: &str) -> Result<EntryMap, AppError>;

    async fn get_entry(&self, user_id: &str, key: &DateKey) -> Result<Option<Entry>, AppError>;

    async fn upsert_entry(
        &self,
        user_id: &str,
        key: &DateKey,
        happy: &str,
        sad: &str,
    ) -> Result<(), AppError>;

    async fn delete_entry(&self, user_id: &str, key: &DateKey) -> Result<(), AppError>;
}

pub trait Gateway: AuthGateway + EntryGateway {}

impl<T: AuthGateway + EntryGateway> Gateway for T {}
