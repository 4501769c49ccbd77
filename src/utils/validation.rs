use crate::utils::error::{OffboardError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// Covers both user principal names and SMTP forwarding targets.
static ADDRESS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn address_pattern() -> &'static Regex {
    ADDRESS_PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern compiles"))
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(OffboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(OffboardError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(OffboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_address(field_name: &str, address: &str) -> Result<()> {
    if address_pattern().is_match(address) {
        Ok(())
    } else {
        Err(OffboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: "Not a valid address (expected user@domain)".to_string(),
        })
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OffboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| OffboardError::MissingConfigError {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("directory.base_url", "https://example.com").is_ok());
        assert!(validate_url("directory.base_url", "http://example.com").is_ok());
        assert!(validate_url("directory.base_url", "").is_err());
        assert!(validate_url("directory.base_url", "invalid-url").is_err());
        assert!(validate_url("directory.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("user", "alice@contoso.com").is_ok());
        assert!(validate_address("forward_to", "team.shared@contoso.co.uk").is_ok());
        assert!(validate_address("user", "alice").is_err());
        assert!(validate_address("user", "alice@contoso").is_err());
        assert!(validate_address("user", "alice contoso.com").is_err());
        assert!(validate_address("user", "").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("user", "alice@contoso.com").is_ok());
        assert!(validate_non_empty_string("user", "   ").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("value".to_string());
        let absent: Option<String> = None;
        assert!(validate_required_field("field", &present).is_ok());
        assert!(validate_required_field("field", &absent).is_err());
    }
}
