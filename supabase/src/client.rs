use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::{AuthEvent, Session, SupabaseUrl};

const AUTH_EVENT_CAPACITY: usize = 16;

/// Client for a hosted Supabase project: GoTrue auth under `/auth/v1` and
/// PostgREST tables under `/rest/v1`.
///
/// Clones share the same session and event channel.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: SupabaseUrl,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, SupabaseError> {
        let base_url = SupabaseUrl::parse(base_url)?;
        if anon_key.trim().is_empty() {
            return Err(SupabaseError::Other("anon key is empty".to_string()));
        }

        let http = Client::builder()
            .build()
            .map_err(|e| SupabaseError::ResponseError(e.to_string()))?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.trim().to_string(),
            session: Arc::new(RwLock::new(None)),
            events,
        })
    }

    pub fn base_url(&self) -> &SupabaseUrl {
        &self.base_url
    }

    /// Push channel for sign-in, sign-out and token refresh events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// The session currently held by this client, if any.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a previously persisted session without emitting an event.
    pub fn restore_session(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub(crate) fn store_session(&self, session: Session, event: AuthEvent) {
        self.restore_session(session);
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }

    pub(crate) fn clear_session(&self) -> Option<Session> {
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
        previous
    }

    pub(crate) fn url(&self, path: &str) -> SupabaseUrl {
        self.base_url.append_path(path)
    }

    /// Request carrying only the project API key.
    pub(crate) fn anon_request(&self, method: Method, url: &SupabaseUrl) -> RequestBuilder {
        self.http
            .request(method, url.as_ref())
            .header("apikey", &self.anon_key)
    }

    /// Request on behalf of the signed-in user.
    pub(crate) fn user_request(
        &self,
        method: Method,
        url: &SupabaseUrl,
    ) -> Result<RequestBuilder, SupabaseError> {
        let session = self.session().ok_or(SupabaseError::NoSession)?;
        Ok(self
            .anon_request(method, url)
            .bearer_auth(session.access_token))
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = request
            .send()
            .await
            .map_err(|e| SupabaseError::ResponseError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SupabaseError::from_response(status, &body))
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            SupabaseError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }

    pub(crate) async fn send_without_body(
        &self,
        request: RequestBuilder,
    ) -> Result<(), SupabaseError> {
        let response = self.send(request).await?;
        let _ = response.bytes().await;
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupabaseError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("No active session")]
    NoSession,
    #[error("InvalidUrl: {0}")]
    InvalidUrl(String),
    #[error("Api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Union of the error shapes GoTrue and PostgREST return.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

impl SupabaseError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let text = parsed.text().unwrap_or(body).trim().to_string();
        let lowered = text.to_lowercase();

        match parsed.error_code.as_deref() {
            Some("invalid_credentials") => return Self::InvalidCredentials,
            Some("email_not_confirmed") => return Self::EmailNotConfirmed,
            _ => {}
        }
        if lowered.contains("invalid login credentials") {
            return Self::InvalidCredentials;
        }
        if lowered.contains("email not confirmed") {
            return Self::EmailNotConfirmed;
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Self::Unauthorized;
        }

        Self::Api {
            status: status.as_u16(),
            message: if text.is_empty() {
                status.to_string()
            } else {
                text
            },
        }
    }

    /// True for failures where the request never produced a usable answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ResponseError(_) | Self::ParsingError(_))
            || matches!(self, Self::Api { status, .. } if *status >= 500)
    }
}
