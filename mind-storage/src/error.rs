use supabase::SupabaseError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Failures that reach the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AppError {
    /// The backend is missing or misconfigured. Blocks every gateway call.
    #[error("backend is not configured: {0}")]
    Configuration(String),
    #[error(transparent)]
    Auth(#[from] AuthFailure),
    /// Caught before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Transient failure talking to the backend. Never retried automatically.
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthFailure {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email address has not been confirmed yet")]
    EmailNotConfirmed,
    #[error("session expired")]
    SessionExpired,
    #[error("{0}")]
    Rejected(String),
}

impl AppError {
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "Not configured",
            AppError::Auth(AuthFailure::InvalidCredentials) => "Login failed",
            AppError::Auth(_) => "Authentication",
            AppError::Validation(_) => "Check your input",
            AppError::Network(_) => "Connection problem",
        }
    }

    /// Text shown in the blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Configuration(detail) => format!(
                "The backend is not configured ({}). Set supabase_url and supabase_anon_key in the config file.",
                detail
            ),
            AppError::Auth(AuthFailure::InvalidCredentials) => {
                "Email or password is incorrect.".to_string()
            }
            AppError::Auth(AuthFailure::EmailNotConfirmed) => {
                "Please confirm your email address before logging in.".to_string()
            }
            AppError::Auth(AuthFailure::SessionExpired) => {
                "Your session has expired. Please log in again.".to_string()
            }
            AppError::Auth(AuthFailure::Rejected(reason)) => reason.clone(),
            AppError::Validation(err) => err.to_string(),
            AppError::Network(detail) => {
                format!("Could not reach the server, try again. ({})", detail)
            }
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Auth(AuthFailure::SessionExpired))
    }
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::InvalidCredentials => AuthFailure::InvalidCredentials.into(),
            SupabaseError::EmailNotConfirmed => AuthFailure::EmailNotConfirmed.into(),
            SupabaseError::Unauthorized | SupabaseError::NoSession => {
                AuthFailure::SessionExpired.into()
            }
            SupabaseError::InvalidUrl(detail) | SupabaseError::Other(detail) => {
                AppError::Configuration(detail)
            }
            ref transport if transport.is_transport() => AppError::Network(transport.to_string()),
            SupabaseError::Api { message, .. } => AuthFailure::Rejected(message).into(),
            other => AppError::Network(other.to_string()),
        }
    }
}
