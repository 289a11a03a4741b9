//! Input validation helpers
//!
//! Text length limits for catalog and admin input. SQLite TEXT has no
//! built-in length enforcement.

use shared::error::AppError;

/// Dish names, kind names, admin names
pub const MAX_NAME_LEN: usize = 200;

/// Dish and offer descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    validate_text(value, field, max_len)
}

/// Validate that a possibly-empty string is within the length limit.
pub fn validate_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Validate that an amount is strictly positive.
pub fn validate_positive(value: i64, field: &str) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::validation(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(())
}

/// Validate that an amount is zero or more.
pub fn validate_non_negative(value: i64, field: &str) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}
