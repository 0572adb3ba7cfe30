use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::auth::CredentialHasher;

const EMAIL_REGEX: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// `None` only if `EMAIL_REGEX` fails to compile, which rejects every email.
static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(EMAIL_REGEX).ok());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password cannot exceed {max} bytes")]
    PasswordTooLong { max: usize },
}

/// Trim and lowercase an email, then check its shape.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    let valid = EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&email));
    if valid {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail(raw.trim().to_string()))
    }
}

pub fn normalize_name(
    field: &'static str,
    raw: &str,
) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(name.to_string())
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    if password.len() > CredentialHasher::MAX_SECRET_LEN {
        return Err(ValidationError::PasswordTooLong {
            max: CredentialHasher::MAX_SECRET_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_compiles() {
        assert!(Regex::new(EMAIL_REGEX).is_ok());
        assert!(EMAIL_PATTERN.is_some());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for raw in ["", "alice", "alice@", "@example.com", "a b@example.com", "alice@example"] {
            assert!(
                matches!(normalize_email(raw), Err(ValidationError::InvalidEmail(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn names_must_have_content() {
        assert_eq!(normalize_name("firstname", " Bob ").unwrap(), "Bob");
        assert_eq!(
            normalize_name("lastname", "   "),
            Err(ValidationError::EmptyField("lastname"))
        );
    }

    #[test]
    fn password_bounds() {
        assert!(check_password("p1").is_ok());
        assert_eq!(check_password(""), Err(ValidationError::EmptyPassword));
        assert!(matches!(
            check_password(&"x".repeat(5000)),
            Err(ValidationError::PasswordTooLong { .. })
        ));
    }
}
