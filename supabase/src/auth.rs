use oauth2::PkceCodeChallenge;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::{SupabaseClient, SupabaseError};

/// An authenticated user as returned by GoTrue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens for a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at
            .map(|expires_at| expires_at <= now.unix_timestamp())
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|secs| OffsetDateTime::now_utc().unix_timestamp() + secs)
        });
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(User),
}

/// Result of a sign-up call.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    /// The project requires e-mail confirmation before the first login.
    ConfirmationRequired(User),
}

/// Session changes pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
    TokenRefreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Apple,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Apple => "apple",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = SupabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "apple" => Ok(OAuthProvider::Apple),
            other => Err(SupabaseError::Other(format!(
                "unsupported OAuth provider: {}",
                other
            ))),
        }
    }
}

/// Browser URL to open plus the PKCE verifier needed to redeem the returned code.
#[derive(Debug, Clone)]
pub struct OAuthRequest {
    pub url: String,
    pub code_verifier: String,
}

impl SupabaseClient {
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SupabaseError> {
        let url = self
            .url("/auth/v1/token")
            .with_query("grant_type", "password");
        let token: TokenResponse = self
            .fetch(
                self.anon_request(Method::POST, &url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let session = Session::from(token);
        self.store_session(session.clone(), AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SupabaseError> {
        let url = self.url("/auth/v1/signup");
        let response: SignUpResponse = self
            .fetch(
                self.anon_request(Method::POST, &url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        match response {
            SignUpResponse::Session(token) => {
                let session = Session::from(token);
                self.store_session(session.clone(), AuthEvent::SignedIn(session.user.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome::ConfirmationRequired(user)),
        }
    }

    /// Build the provider authorization URL for a PKCE OAuth flow.
    pub fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> OAuthRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let url = self
            .url("/auth/v1/authorize")
            .with_query("provider", provider.as_str())
            .with_query("redirect_to", redirect_to)
            .with_query("code_challenge", challenge.as_str())
            .with_query("code_challenge_method", "s256");

        OAuthRequest {
            url: url.as_ref().to_string(),
            code_verifier: verifier.secret().to_string(),
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, SupabaseError> {
        let url = self.url("/auth/v1/token").with_query("grant_type", "pkce");
        let token: TokenResponse = self
            .fetch(
                self.anon_request(Method::POST, &url).json(
                    &json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
                ),
            )
            .await?;

        let session = Session::from(token);
        self.store_session(session.clone(), AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    #[tracing::instrument(skip_all)]
    pub async fn refresh_session(&self) -> Result<Session, SupabaseError> {
        let current = self.session().ok_or(SupabaseError::NoSession)?;
        let url = self
            .url("/auth/v1/token")
            .with_query("grant_type", "refresh_token");
        let token: TokenResponse = self
            .fetch(
                self.anon_request(Method::POST, &url)
                    .json(&json!({ "refresh_token": current.refresh_token })),
            )
            .await?;

        let session = Session::from(token);
        self.store_session(session.clone(), AuthEvent::TokenRefreshed);
        Ok(session)
    }

    /// Drops the local session first, then revokes it remotely.
    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), SupabaseError> {
        let Some(session) = self.clear_session() else {
            return Ok(());
        };

        let url = self.url("/auth/v1/logout");
        self.send_without_body(
            self.anon_request(Method::POST, &url)
                .bearer_auth(session.access_token),
        )
        .await
    }

    /// The user behind the current session, or `None` when signed out.
    pub async fn get_user(&self) -> Result<Option<User>, SupabaseError> {
        if self.session().is_none() {
            return Ok(None);
        }

        let url = self.url("/auth/v1/user");
        let user: User = self.fetch(self.user_request(Method::GET, &url)?).await?;
        Ok(Some(user))
    }

    /// Calls the project's `delete_account` function, then signs out locally.
    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self, user_id: &str) -> Result<(), SupabaseError> {
        let url = self.url("/rest/v1/rpc/delete_account");
        self.send_without_body(
            self.user_request(Method::POST, &url)?
                .json(&json!({ "target_user_id": user_id })),
        )
        .await?;

        self.clear_session();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const TOKEN_BODY: &str = r#"{
        "access_token": "access-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1900000000,
        "refresh_token": "refresh-1",
        "user": { "id": "user-1", "email": "a@b.co" }
    }"#;

    fn session() -> Session {
        Session {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: Some(1_900_000_000),
            user: User {
                id: "user-1".to_string(),
                email: Some("a@b.co".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn password_sign_in_stores_session_and_notifies() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded(
                "grant_type".into(),
                "password".into(),
            ))
            .match_header("apikey", "anon")
            .match_body(Matcher::Json(
                json!({ "email": "a@b.co", "password": "secret1" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(TOKEN_BODY)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "anon").unwrap();
        let mut events = client.subscribe();

        let signed_in = client.sign_in_with_password("a@b.co", "secret1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(signed_in, session());
        assert_eq!(client.session(), Some(session()));
        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::SignedIn(session().user)
        );
    }

    #[tokio::test]
    async fn bad_password_maps_to_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .with_status(400)
            .with_body(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "anon").unwrap();
        let err = client.sign_in_with_password("a@b.co", "wrong1").await.unwrap_err();

        assert_eq!(err, SupabaseError::InvalidCredentials);
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn sign_up_without_session_requires_confirmation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/signup")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"user-2","email":"new@b.co","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "anon").unwrap();
        let outcome = client.sign_up("new@b.co", "secret1").await.unwrap();

        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationRequired(User {
                id: "user-2".to_string(),
                email: Some("new@b.co".to_string()),
            })
        );
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_session_even_when_remote_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/v1/logout")
            .with_status(500)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "anon").unwrap();
        client.restore_session(session());
        let mut events = client.subscribe();

        assert!(client.sign_out().await.is_err());
        assert!(client.session().is_none());
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn get_user_without_session_is_none() {
        let client = SupabaseClient::new("http://127.0.0.1:9", "anon").unwrap();
        assert_eq!(client.get_user().await.unwrap(), None);
    }

    #[test]
    fn authorize_url_carries_provider_and_pkce_challenge() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").unwrap();
        let request =
            client.oauth_authorize_url(OAuthProvider::Apple, "http://localhost:9876/callback");

        assert!(request
            .url
            .starts_with("https://abc.supabase.co/auth/v1/authorize?provider=apple"));
        assert!(request
            .url
            .contains("redirect_to=http%3A%2F%2Flocalhost%3A9876%2Fcallback"));
        assert!(request.url.contains("code_challenge_method=s256"));
        assert!(!request.code_verifier.is_empty());
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert!("github".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn session_expiry_uses_unix_seconds() {
        let session = session();
        let before = OffsetDateTime::from_unix_timestamp(1_899_999_999).unwrap();
        let after = OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap();
        assert!(!session.is_expired(before));
        assert!(session.is_expired(after));
    }
}
