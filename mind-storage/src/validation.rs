use std::fmt;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("email and password are required")]
    MissingFields,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
}

/// An address shaped like `local@domain.tld`. The backend still decides
/// whether it is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl TryFrom<&str> for Email {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        let invalid = || ValidationError::InvalidEmail(value.to_string());

        if value.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let mut parts = value.split('@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if parts.next().is_some() || local.is_empty() {
            return Err(invalid());
        }

        let Some((host, tld)) = domain.rsplit_once('.') else {
            return Err(invalid());
        };
        if host.is_empty() || host.starts_with('.') || host.ends_with('.') || tld.is_empty() {
            return Err(invalid());
        }

        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login or sign-up input that passed the client-side pre-checks.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn validate(email: &str, password: &str) -> Result<Self, ValidationError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        let email = Email::try_from(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }

        Ok(Self {
            email,
            password: password.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_addresses_are_accepted() {
        assert!(Email::try_from("test@example.com").is_ok());
        assert!(Email::try_from("first.last@mail.example.co.kr").is_ok());
        assert!(Email::try_from("  padded@example.com ").is_ok());
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for raw in [
            "testexample.com",
            "test@@example.com",
            "@example.com",
            "test@",
            "test@example",
            "test@.com",
            "test@example.",
            "te st@example.com",
        ] {
            assert_eq!(
                Email::try_from(raw).unwrap_err(),
                ValidationError::InvalidEmail(raw.to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn password_needs_six_characters() {
        assert_eq!(
            Credentials::validate("a@b.co", "12345").unwrap_err(),
            ValidationError::PasswordTooShort
        );
        assert!(Credentials::validate("a@b.co", "123456").is_ok());
        // Counted in characters, not bytes.
        assert_eq!(
            Credentials::validate("a@b.co", "비밀번호").unwrap_err(),
            ValidationError::PasswordTooShort
        );
    }

    #[test]
    fn empty_fields_are_reported_first() {
        assert_eq!(
            Credentials::validate("", "secret1").unwrap_err(),
            ValidationError::MissingFields
        );
        assert_eq!(
            Credentials::validate("not-an-email", "").unwrap_err(),
            ValidationError::MissingFields
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let credentials = Credentials::validate("a@b.co", "secret1").unwrap();
        assert!(!format!("{credentials:?}").contains("secret1"));
    }
}
