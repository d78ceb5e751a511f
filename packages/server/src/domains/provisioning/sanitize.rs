//! Owner sanitization and custom-domain label derivation.

use super::error::ProvisionError;

/// Subdomains that would collide with platform-internal services and
/// cannot be used directly as a domain label.
pub const RESERVED_SUBDOMAINS: [&str; 3] = ["app", "engine", "waha"];

/// Maximum length of a sanitized owner identity.
pub const MAX_OWNER_LEN: usize = 20;

/// Sanitize an owner identity: lowercase, keep only `[a-z0-9]`.
///
/// Fails when nothing survives sanitization or the result is longer
/// than [`MAX_OWNER_LEN`]. Idempotent: sanitizing a sanitized owner is
/// a no-op.
pub fn sanitize_owner(owner: &str) -> Result<String, ProvisionError> {
    let sanitized: String = owner
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if sanitized.is_empty() {
        return Err(ProvisionError::Validation(
            "owner must be non-empty after sanitization".into(),
        ));
    }

    if sanitized.len() > MAX_OWNER_LEN {
        return Err(ProvisionError::Validation(format!(
            "owner name too long (max {MAX_OWNER_LEN} characters after sanitization)"
        )));
    }

    Ok(sanitized)
}

/// Derive the domain label for an owner and optional app-name hint.
///
/// Without a hint the label is the sanitized owner. A hint is
/// sanitized the same way; if it lands on a reserved subdomain it is
/// prefixed with the owner to disambiguate.
///
/// `sanitized_owner` must already have passed [`sanitize_owner`].
pub fn domain_label(
    sanitized_owner: &str,
    app_name: Option<&str>,
) -> Result<String, ProvisionError> {
    let Some(hint) = app_name else {
        return Ok(sanitized_owner.to_string());
    };

    let sanitized_hint = sanitize_owner(hint)?;
    if RESERVED_SUBDOMAINS.contains(&sanitized_hint.as_str()) {
        return Ok(format!("{sanitized_owner}{sanitized_hint}"));
    }

    Ok(sanitized_hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(sanitize_owner("Alice_01!").unwrap(), "alice01");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["Alice_01!", "Bob Smith", "x-y-z", "UPPER99"] {
            let once = sanitize_owner(raw).unwrap();
            let twice = sanitize_owner(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_empty_owner() {
        let err = sanitize_owner("").unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn rejects_symbol_only_owner() {
        assert!(sanitize_owner("!!!---").is_err());
    }

    #[test]
    fn rejects_overlong_owner() {
        let err = sanitize_owner(&"a".repeat(21)).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn accepts_owner_at_max_length() {
        assert!(sanitize_owner(&"a".repeat(20)).is_ok());
    }

    #[test]
    fn label_defaults_to_owner() {
        assert_eq!(domain_label("alice01", None).unwrap(), "alice01");
    }

    #[test]
    fn reserved_hint_is_prefixed_with_owner() {
        assert_eq!(domain_label("alice01", Some("app")).unwrap(), "alice01app");
    }

    #[test]
    fn non_reserved_hint_is_used_directly() {
        assert_eq!(domain_label("alice01", Some("My Shop")).unwrap(), "myshop");
    }

    #[test]
    fn reserved_check_applies_after_sanitization() {
        // "En-Gine" sanitizes to the reserved word "engine"
        assert_eq!(
            domain_label("alice01", Some("En-Gine")).unwrap(),
            "alice01engine"
        );
    }

    #[test]
    fn empty_hint_is_a_validation_error() {
        assert!(domain_label("alice01", Some("--")).is_err());
    }
}
