//! Identifier validator.
//!
//! Table and column names are always quoted before they reach SQL; this
//! validator rejects the names that quoting cannot make safe or that no
//! supported dialect accepts.

use crate::errors::AppError;

/// Longest identifier accepted by any supported dialect.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Validates table and column names.
pub struct IdentifierValidator;

impl IdentifierValidator {
    /// Validates an identifier.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the name is empty, too long, or
    /// contains control characters.
    pub fn validate(kind: &str, name: &str) -> Result<(), AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation(format!("{} name must not be empty", kind)));
        }
        if name.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(AppError::Validation(format!(
                "{} name exceeds {} characters",
                kind, MAX_IDENTIFIER_LEN
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::Validation(format!(
                "{} name contains control characters",
                kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_allowed() {
        assert!(IdentifierValidator::validate("table", "account").is_ok());
        assert!(IdentifierValidator::validate("table", "Account History").is_ok());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(IdentifierValidator::validate("table", "").is_err());
        assert!(IdentifierValidator::validate("table", "   ").is_err());
    }

    #[test]
    fn test_control_characters_are_rejected() {
        assert!(IdentifierValidator::validate("column", "id\0").is_err());
        assert!(IdentifierValidator::validate("column", &"x".repeat(129)).is_err());
    }
}
