//! Input validation shared by the domain models.

use thiserror::Error;

/// A user-visible validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

/// Unknown value for a stored or submitted enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Reject empty or whitespace-only required text.
pub(crate) fn require(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// Loose email check: one `@` with something on both sides and a dot in the domain.
pub(crate) fn check_email(field: &'static str, value: Option<&str>) -> ValidationResult {
    let Some(email) = value else {
        return Ok(());
    };
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, format!("'{}' is not an email address", email)))
    }
}
