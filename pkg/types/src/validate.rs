use anyhow::{Result, bail};
use pkg_constants::policy::MAX_NAME_LENGTH;

/// Validate a Kubernetes-style resource name (DNS-1123 label).
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > MAX_NAME_LENGTH {
        bail!(
            "name '{}' exceeds {} characters (got {})",
            name,
            MAX_NAME_LENGTH,
            name.len()
        );
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Whether `value` is usable as a Kubernetes label value.
/// Rules: max 63 chars, `[A-Za-z0-9._-]`, alphanumeric at both ends. Empty is allowed.
pub fn is_valid_label_value(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if value.len() > MAX_NAME_LENGTH {
        return false;
    }
    let first_last_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    first_last_ok(value.chars().next())
        && first_last_ok(value.chars().last())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Coerce an arbitrary string into a valid label value.
///
/// Disallowed characters become `-`, the result is cut to 63 chars and
/// stripped of non-alphanumeric ends.
pub fn sanitize_label_value(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .take(MAX_NAME_LENGTH)
        .collect();
    replaced
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("nginx").is_ok());
        assert!(validate_name("my-app").is_ok());
        assert!(validate_name("app-123").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("My-App").is_err());
        assert!(validate_name("my_app").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("special!char").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn label_values() {
        assert!(is_valid_label_value("alice"));
        assert!(is_valid_label_value("user_1.dev"));
        assert!(is_valid_label_value(""));
        assert!(!is_valid_label_value("alice@example.com"));
        assert!(!is_valid_label_value("-alice"));
        assert!(!is_valid_label_value(&"a".repeat(64)));
    }

    #[test]
    fn sanitized_values_are_valid() {
        for raw in ["alice@example.com", "--x--", "Bob Smith", &"z".repeat(80)] {
            let clean = sanitize_label_value(raw);
            assert!(is_valid_label_value(&clean), "{raw:?} -> {clean:?}");
        }
        assert_eq!(sanitize_label_value("alice@example.com"), "alice-example.com");
    }
}
