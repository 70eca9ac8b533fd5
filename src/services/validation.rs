//! Field rules shared by the account services.

use crate::constants::auth::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH};

pub fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

/// Usernames are compared case-sensitively and stored exactly as given.
pub fn validate_username(username: &str) -> Result<(), String> {
    require_non_empty("Username", username)?;

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be {MAX_USERNAME_LENGTH} characters or less"
        ));
    }

    if username.chars().any(char::is_control) {
        return Err("Username cannot contain control characters".to_string());
    }

    Ok(())
}

pub fn validate_new_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Alice Smith").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username("bad\nname").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("12345678").is_ok());
        assert!(validate_new_password("1234567").is_err());
        assert!(validate_new_password("").is_err());
    }

    #[test]
    fn test_require_non_empty() {
        assert_eq!(
            require_non_empty("Password", " ").unwrap_err(),
            "Password is required"
        );
        assert!(require_non_empty("Password", "x").is_ok());
    }
}
