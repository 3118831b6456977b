//! Field-level validation for the login and account forms.
//!
//! Rules mirror the backend's: usernames and passwords must be at least
//! four characters. Validation failures never reach the network; forms
//! surface them inline against the offending field.

/// Minimum length for usernames and passwords
const MIN_FIELD_LENGTH: usize = 4;

/// A validation failure pinned to a specific form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    if username.chars().count() < MIN_FIELD_LENGTH {
        return Err(FieldError::new(
            "username",
            format!("Username must be at least {} characters", MIN_FIELD_LENGTH),
        ));
    }
    Ok(())
}

fn validate_password_field(field: &'static str, password: &str) -> Result<(), FieldError> {
    if password.chars().count() < MIN_FIELD_LENGTH {
        return Err(FieldError::new(
            field,
            format!("Password must be at least {} characters", MIN_FIELD_LENGTH),
        ));
    }
    Ok(())
}

pub fn validate_login(username: &str, password: &str) -> Result<(), FieldError> {
    validate_username(username)?;
    validate_password_field("password", password)?;
    Ok(())
}

/// Validate the account-creation form. A password/confirmation mismatch is
/// reported against the confirmation field only.
pub fn validate_create_user(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), FieldError> {
    validate_username(username)?;
    validate_password_field("password", password)?;
    validate_password_field("confirm_password", confirm_password)?;
    if password != confirm_password {
        return Err(FieldError::new("confirm_password", "Passwords do not match"));
    }
    Ok(())
}

pub fn validate_update_user(username: &str) -> Result<(), FieldError> {
    validate_username(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_fields_are_rejected() {
        assert_eq!(validate_username("bob").unwrap_err().field, "username");
        assert_eq!(
            validate_login("alice", "abc").unwrap_err().field,
            "password"
        );
        assert!(validate_login("alice", "secret1").is_ok());
    }

    #[test]
    fn test_password_mismatch_pins_confirmation_field() {
        let err = validate_create_user("alice", "secret1", "secret2").unwrap_err();
        assert_eq!(err.field, "confirm_password");
        assert_eq!(err.message, "Passwords do not match");
    }

    #[test]
    fn test_matching_passwords_pass() {
        assert!(validate_create_user("alice", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_short_confirmation_reported_before_mismatch() {
        let err = validate_create_user("alice", "secret1", "s").unwrap_err();
        assert_eq!(err.field, "confirm_password");
    }

    #[test]
    fn test_update_checks_username_only() {
        assert!(validate_update_user("alice").is_ok());
        assert_eq!(validate_update_user("al").unwrap_err().field, "username");
    }
}
