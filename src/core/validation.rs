//! Hand-rolled input validation
//!
//! Field checks shared by the API layer. Each failure carries the exact
//! message reported to clients, so handlers can forward errors verbatim in
//! a 400 body.

use crate::core::db::models::Category;

/// A failed field check, carrying the client-facing message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Username: 3-30 characters, non-empty
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("User name is required."));
    }
    if username.chars().count() < 3 {
        return Err(ValidationError::new(
            "User name must be at least 3 characters.",
        ));
    }
    if username.chars().count() > 30 {
        return Err(ValidationError::new(
            "User name must not exceed 30 characters.",
        ));
    }
    Ok(())
}

/// Email: local@domain with a dotted, non-empty domain
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("Email is required."));
    }

    let invalid = || ValidationError::new("Please provide a valid email address.");

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(invalid());
    }

    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(invalid());
    }

    // Every dot-separated domain label must be non-empty
    if domain.split('.').any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

/// Password: minimum 8 characters
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("Password is required."));
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::new(
            "Password must be at least 8 characters long.",
        ));
    }
    Ok(())
}

/// Title (note or expense): non-empty, at most 255 characters
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("Title cannot be empty."));
    }
    if title.chars().count() > 255 {
        return Err(ValidationError::new(
            "Title must not exceed 255 characters.",
        ));
    }
    Ok(())
}

/// Description: non-empty
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new("Description cannot be empty."));
    }
    Ok(())
}

/// Expense/budget category: must be one of the fixed list
pub fn parse_category(value: &str) -> Result<Category, ValidationError> {
    value.parse().map_err(|_| {
        let valid = Category::ALL.map(|c| c.to_string()).join(", ");
        ValidationError::new(format!("Category must be one of {}.", valid))
    })
}

/// Expense/budget amount: positive, at most 2 decimal places
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::new("Amount must be a number."));
    }
    if amount <= 0.0 {
        return Err(ValidationError::new("Amount must be greater than zero."));
    }

    let cents = amount * 100.0;
    if (cents - cents.round()).abs() > 1e-9 {
        return Err(ValidationError::new(
            "Amount must have at most 2 decimal places.",
        ));
    }

    Ok(())
}
