//! Request field validation
//!
//! Agent fields are checked and normalized here before they reach the store.
//! Each function returns the normalized value or a `VALIDATION_FAILED` error
//! naming the field.

use crate::error::{ApiError, ApiResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// E.164-style mobile number: `+`, a non-zero digit, then 1 to 14 digits.
static MOBILE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").ok());

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

/// Trim a name and require 2 to 50 characters.
pub fn validate_name(name: &str) -> ApiResult<String> {
    let trimmed = name.trim();
    let chars = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(ApiError::invalid_field(
            "name",
            format!(
                "Name must be between {} and {} characters",
                NAME_MIN_CHARS, NAME_MAX_CHARS
            ),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim and lower-case an email address, then check its shape.
pub fn validate_email(email: &str) -> ApiResult<String> {
    let normalized = email.trim().to_lowercase();
    if !matches(&EMAIL_RE, &normalized) {
        return Err(ApiError::invalid_field("email", "Please enter a valid email"));
    }
    Ok(normalized)
}

/// Require a mobile number with country code, e.g. `+15550100`.
pub fn validate_mobile(mobile: &str) -> ApiResult<String> {
    let trimmed = mobile.trim();
    if !matches(&MOBILE_RE, trimmed) {
        return Err(ApiError::invalid_field(
            "mobile",
            "Valid mobile with country code required",
        ));
    }
    Ok(trimmed.to_string())
}

fn matches(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    re.as_ref().map_or(false, |re| re.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_name_bounds() {
        assert_eq!(validate_name("  Jo ").ok(), Some("Jo".to_string()));
        assert!(validate_name("J").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(50)).is_ok());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(
            validate_email(" Ada@Example.COM ").ok(),
            Some("ada@example.com".to_string())
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_mobile_requires_country_code() {
        assert!(validate_mobile("+15550100").is_ok());
        assert!(validate_mobile("+919876543210").is_ok());
        assert!(validate_mobile("5550100").is_err());
        assert!(validate_mobile("+05550100").is_err());
        assert!(validate_mobile("+1").is_err());
        assert!(validate_mobile("+1234567890123456").is_err());
    }

    #[test]
    fn test_errors_name_the_field() {
        let err = validate_mobile("nope").err();
        assert_eq!(err.as_ref().map(|e| e.code), Some(ErrorCode::ValidationFailed));
        assert_eq!(
            err.and_then(|e| e.details).and_then(|d| d.get("field").cloned()),
            Some(serde_json::json!("mobile"))
        );
    }
}
