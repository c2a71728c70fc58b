use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

/// Rejects missing or whitespace-only values for a required field.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    require("name", name)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::BadRequest(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    require("email", email)?;
    if email.len() > MAX_EMAIL_LEN {
        return Err(Error::BadRequest(format!(
            "email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(Error::BadRequest("email cannot contain whitespace".to_string()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(Error::BadRequest("email is not a valid address".to_string())),
    }
}

/// Scores and prices must be ordinary non-negative numbers.
pub fn validate_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::BadRequest(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}
