// src/utils/validation.rs

use validator::ValidationError;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=";

/// At least 6 characters with one special, one digit, one upper and one lower case.
pub fn is_password_strong(password: &str) -> bool {
    if password.chars().count() < 6 {
        return false;
    }

    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());

    has_special && has_digit && has_upper && has_lower
}

/// `local@domain.tld`: one `@`, non-empty parts, exactly one dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || domain.is_empty() {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() == 2 && labels.iter().all(|l| !l.is_empty())
}

/// Trimmed, lower-cased form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_strong_password(password: &str) -> Result<(), ValidationError> {
    if !is_password_strong(password.trim()) {
        return Err(ValidationError::new("weak_password").with_message("weak password".into()));
    }
    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if !is_valid_email(&normalize_email(email)) {
        return Err(ValidationError::new("invalid_email").with_message("invalid email".into()));
    }
    Ok(())
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be empty".into()));
    }
    Ok(())
}
