//! API key format checks.
//!
//! Keys come from an external secret store. This layer only checks their
//! shape and masks them for display; it never persists them.

use crate::ValidationError;

/// Prefixes issued by the platform for personal and team keys.
pub const API_KEY_PREFIXES: [&str; 2] = ["ap_user_", "ap_team_"];

/// Minimum number of characters required after the prefix.
pub const API_KEY_MIN_SUFFIX: usize = 8;

/// Check that a key carries a known prefix and enough material after it.
pub fn validate_api_key_format(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::MissingApiKey);
    }

    let suffix_ok = API_KEY_PREFIXES
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .is_some_and(|rest| rest.chars().count() >= API_KEY_MIN_SUFFIX);

    if suffix_ok {
        Ok(())
    } else {
        Err(ValidationError::MalformedApiKey {
            min: API_KEY_MIN_SUFFIX,
        })
    }
}

/// Mask a key for logs and display, keeping only the prefix.
///
/// `"ap_user_abc123xyz890"` becomes `"ap_user_***"`; an empty key stays empty
/// and a key without a known prefix is fully masked.
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }

    match API_KEY_PREFIXES.iter().find(|prefix| key.starts_with(**prefix)) {
        Some(prefix) => format!("{prefix}***"),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_api_key_format("ap_user_abcdefgh").is_ok());
        assert!(validate_api_key_format("ap_team_0123456789abcdef").is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(
            validate_api_key_format(""),
            Err(ValidationError::MissingApiKey)
        );
        // one character short
        assert!(validate_api_key_format("ap_user_abcdefg").is_err());
        assert!(validate_api_key_format("ap_admin_abcdefgh").is_err());
        assert!(validate_api_key_format("AP_USER_abcdefgh").is_err());
        assert!(validate_api_key_format("sk_live_abcdefghijk").is_err());
        assert!(validate_api_key_format("ap_user_").is_err());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask_api_key("ap_user_abc123xyz890"), "ap_user_***");
        assert_eq!(mask_api_key("ap_team_abc123xyz890"), "ap_team_***");
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("something-else"), "***");
    }
}
