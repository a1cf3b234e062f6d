use async_trait::async_trait;
use std::future::Future;
use supabase::{
    AuthEvent, EntryRow, OAuthProvider, OAuthRequest, Session, SignUpOutcome, SupabaseClient,
    SupabaseError, User,
};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use super::{AuthGateway, EntryGateway, SignUpResult};
use crate::date_engine::DateKey;
use crate::entry_store::{Entry, EntryMap};
use crate::error::{AppError, AuthFailure};
use crate::validation::Credentials;

#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    client: SupabaseClient,
}

impl SupabaseGateway {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Reinstall a session saved by a previous run. Returns false when the
    /// blob cannot be decoded.
    pub fn restore_session(&self, raw: &str) -> bool {
        match serde_json::from_str::<Session>(raw) {
            Ok(session) => {
                self.client.restore_session(session);
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored session: {}", e);
                false
            }
        }
    }

    async fn refresh_or_forget(&self) -> Result<Option<User>, AppError> {
        match self.client.refresh_session().await {
            Ok(session) => Ok(Some(session.user)),
            Err(e) if e.is_transport() => Err(e.into()),
            Err(e) => {
                tracing::info!("Stored session could not be refreshed: {}", e);
                // Dropping the local session matters here, the remote revoke may fail.
                let _ = self.client.sign_out().await;
                Ok(None)
            }
        }
    }

    /// Run a row-store request, refreshing the access token first when it has
    /// lapsed and once more if the request is still rejected.
    async fn authorized<T, F, Fut>(&self, request: F) -> Result<T, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SupabaseError>>,
    {
        let lapsed = self
            .client
            .session()
            .is_some_and(|session| session.is_expired(OffsetDateTime::now_utc()));
        if lapsed {
            self.refresh_for_request().await?;
        }

        match request().await {
            Err(SupabaseError::Unauthorized) => {
                tracing::debug!("Access token rejected, refreshing");
                self.refresh_for_request().await?;
                request().await.map_err(AppError::from)
            }
            result => result.map_err(AppError::from),
        }
    }

    async fn refresh_for_request(&self) -> Result<(), AppError> {
        match self.refresh_or_forget().await? {
            Some(_) => Ok(()),
            None => Err(AuthFailure::SessionExpired.into()),
        }
    }
}

fn row_to_entry(row: EntryRow) -> Option<(DateKey, Entry)> {
    let Some(key) = DateKey::parse(&row.date) else {
        tracing::warn!("Skipping entry with malformed date {:?}", row.date);
        return None;
    };
    Some((
        key,
        Entry {
            happy: row.happy().to_string(),
            sad: row.sad().to_string(),
        },
    ))
}

#[async_trait]
impl AuthGateway for SupabaseGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AppError> {
        let session = self
            .client
            .sign_in_with_password(credentials.email.as_ref(), &credentials.password)
            .await?;
        Ok(session.user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpResult, AppError> {
        let outcome = self
            .client
            .sign_up(credentials.email.as_ref(), &credentials.password)
            .await?;
        Ok(match outcome {
            SignUpOutcome::SignedIn(session) => SignUpResult::SignedIn(session.user),
            SignUpOutcome::ConfirmationRequired(_) => SignUpResult::ConfirmationRequired,
        })
    }

    fn oauth_request(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<OAuthRequest, AppError> {
        Ok(self.client.oauth_authorize_url(provider, redirect_to))
    }

    async fn complete_oauth(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<User, AppError> {
        let session = self
            .client
            .exchange_code_for_session(auth_code, code_verifier)
            .await?;
        Ok(session.user)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.client.sign_out().await.map_err(AppError::from)
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        let Some(session) = self.client.session() else {
            return Ok(None);
        };
        if session.is_expired(OffsetDateTime::now_utc()) {
            return self.refresh_or_forget().await;
        }

        match self.client.get_user().await {
            Ok(user) => Ok(user),
            Err(SupabaseError::Unauthorized) => self.refresh_or_forget().await,
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_account(&self, user_id: &str) -> Result<(), AppError> {
        self.client
            .delete_account(user_id)
            .await
            .map_err(AppError::from)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.client.subscribe()
    }

    fn export_session(&self) -> Option<String> {
        let session = self.client.session()?;
        serde_json::to_string(&session).ok()
    }
}

#[async_trait]
impl EntryGateway for SupabaseGateway {
    async fn list_entries(&self, user_id: &str) -> Result<EntryMap, AppError> {
        let client = &self.client;
        let rows = self.authorized(move || client.list_entries(user_id)).await?;
        Ok(rows.into_iter().filter_map(row_to_entry).collect())
    }

    async fn get_entry(&self, user_id: &str, key: &DateKey) -> Result<Option<Entry>, AppError> {
        let client = &self.client;
        let row = self
            .authorized(move || client.get_entry(user_id, key.as_str()))
            .await?;
        Ok(row.and_then(row_to_entry).map(|(_, entry)| entry))
    }

    async fn upsert_entry(
        &self,
        user_id: &str,
        key: &DateKey,
        happy: &str,
        sad: &str,
    ) -> Result<(), AppError> {
        let client = &self.client;
        self.authorized(move || client.upsert_entry(user_id, key.as_str(), happy, sad))
            .await
    }

    async fn delete_entry(&self, user_id: &str, key: &DateKey) -> Result<(), AppError> {
        let client = &self.client;
        self.authorized(move || client.delete_entry(user_id, key.as_str()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const REFRESHED_TOKEN: &str = r#"{
        "access_token": "new",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1900000000,
        "refresh_token": "refresh-2",
        "user": { "id": "u", "email": "a@b.co" }
    }"#;

    fn signed_in_gateway(base_url: &str, access_token: &str) -> SupabaseGateway {
        let gateway = SupabaseGateway::new(SupabaseClient::new(base_url, "anon").unwrap());
        let raw = format!(
            r#"{{"access_token":"{}","refresh_token":"refresh-1","expires_at":null,"user":{{"id":"u","email":"a@b.co"}}}}"#,
            access_token
        );
        assert!(gateway.restore_session(&raw));
        gateway
    }

    fn row(date: &str, happy: Option<&str>, sad: Option<&str>) -> EntryRow {
        EntryRow {
            user_id: "user-1".to_string(),
            date: date.to_string(),
            happy_content: happy.map(str::to_string),
            sad_content: sad.map(str::to_string),
        }
    }

    #[test]
    fn rows_map_to_entries_with_null_as_empty() {
        let (key, entry) = row_to_entry(row("2024-03-09", Some("sun"), None)).unwrap();
        assert_eq!(key.as_str(), "2024-03-09");
        assert_eq!(
            entry,
            Entry {
                happy: "sun".to_string(),
                sad: String::new(),
            }
        );
    }

    #[test]
    fn rows_with_bad_dates_are_skipped() {
        assert!(row_to_entry(row("2024-3-9", Some("x"), None)).is_none());
    }

    #[test]
    fn corrupt_stored_session_is_rejected() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").unwrap();
        let gateway = SupabaseGateway::new(client);
        assert!(!gateway.restore_session("{not json"));
        assert!(gateway.export_session().is_none());
    }

    #[test]
    fn restored_session_round_trips_for_persistence() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").unwrap();
        let gateway = SupabaseGateway::new(client);
        let raw = r#"{"access_token":"a","refresh_token":"r","expires_at":null,"user":{"id":"u","email":null}}"#;

        assert!(gateway.restore_session(raw));
        let exported: Session = serde_json::from_str(&gateway.export_session().unwrap()).unwrap();
        assert_eq!(exported.user.id, "u");
    }

    #[tokio::test]
    async fn rejected_token_is_refreshed_and_the_request_retried() {
        let mut server = mockito::Server::new_async().await;
        let stale = server
            .mock("GET", "/rest/v1/entries")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .with_body(r#"{"code":"PGRST301","message":"JWT expired"}"#)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded(
                "grant_type".into(),
                "refresh_token".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REFRESHED_TOKEN)
            .create_async()
            .await;
        let fresh = server
            .mock("GET", "/rest/v1/entries")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer new")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"user_id":"u","date":"2024-03-09","happy_content":"sun","sad_content":null}]"#)
            .create_async()
            .await;

        let gateway = signed_in_gateway(&server.url(), "old");
        let mut events = gateway.subscribe();

        let entries = gateway.list_entries("u").await.unwrap();

        stale.assert_async().await;
        refresh.assert_async().await;
        fresh.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::TokenRefreshed);
        let exported: Session = serde_json::from_str(&gateway.export_session().unwrap()).unwrap();
        assert_eq!(exported.access_token, "new");
    }

    #[tokio::test]
    async fn failed_refresh_surfaces_as_expired_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/rest/v1/entries")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":"PGRST301","message":"JWT expired"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error_code":"refresh_token_not_found","msg":"Invalid Refresh Token"}"#)
            .create_async()
            .await;

        let gateway = signed_in_gateway(&server.url(), "old");
        let key = DateKey::parse("2024-03-09").unwrap();

        let err = gateway.delete_entry("u", &key).await.unwrap_err();

        assert!(err.is_session_expired());
        assert!(gateway.export_session().is_none());
    }
}
