use async_trait::async_trait;
use supabase::{AuthEvent, OAuthProvider, OAuthRequest, User};
use tokio::sync::broadcast;

use super::{AuthGateway, EntryGateway, SignUpResult};
use crate::date_engine::DateKey;
use crate::entry_store::{Entry, EntryMap};
use crate::error::AppError;
use crate::validation::Credentials;

/// Stands in when no backend URL/key is configured. Every call fails.
#[derive(Debug, Clone)]
pub struct UnconfiguredGateway {
    reason: String,
    events: broadcast::Sender<AuthEvent>,
}

impl UnconfiguredGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(1);
        Self {
            reason: reason.into(),
            events,
        }
    }

    fn error(&self) -> AppError {
        AppError::Configuration(self.reason.clone())
    }
}

#[async_trait]
impl AuthGateway for UnconfiguredGateway {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<User, AppError> {
        Err(self.error())
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<SignUpResult, AppError> {
        Err(self.error())
    }

    fn oauth_request(
        &self,
        _provider: OAuthProvider,
        _redirect_to: &str,
    ) -> Result<OAuthRequest, AppError> {
        Err(self.error())
    }

    async fn complete_oauth(
        &self,
        _auth_code: &str,
        _code_verifier: &str,
    ) -> Result<User, AppError> {
        Err(self.error())
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        Err(self.error())
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        Err(self.error())
    }

    async fn delete_account(&self, _user_id: &str) -> Result<(), AppError> {
        Err(self.error())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl EntryGateway for UnconfiguredGateway {
    async fn list_entries(&self, _user_id: &str) -> Result<EntryMap, AppError> {
        Err(self.error())
    }

    async fn get_entry(&self, _user_id: &str, _key: &DateKey) -> Result<Option<Entry>, AppError> {
        Err(self.error())
    }

    async fn upsert_entry(
        &self,
        _user_id: &str,
        _key: &DateKey,
        _happy: &str,
        _sad: &str,
    ) -> Result<(), AppError> {
        Err(self.error())
    }

    async fn delete_entry(&self, _user_id: &str, _key: &DateKey) -> Result<(), AppError> {
        Err(self.error())
    }
}
