//! Host name checks.
//!
//! IDN validation reports every problem it finds as a marker token so one
//! failure message can carry several independent conditions, e.g.
//! `[LABEL_TOO_LONG, DOMAIN_NAME_TOO_LONG]`.

use std::collections::BTreeSet;

use url::Host;

pub const LABEL_TOO_LONG: &str = "LABEL_TOO_LONG";
pub const DOMAIN_NAME_TOO_LONG: &str = "DOMAIN_NAME_TOO_LONG";
pub const LESS_THAN_TWO_LABELS: &str = "LESS_THAN_TWO_LABELS";
pub const EMPTY_LABEL: &str = "EMPTY_LABEL";
pub const LEADING_HYPHEN: &str = "LEADING_HYPHEN";
pub const TRAILING_HYPHEN: &str = "TRAILING_HYPHEN";
pub const PUNYCODE: &str = "PUNYCODE";
pub const DISALLOWED: &str = "DISALLOWED";

const MAX_LABEL: usize = 63;
const MAX_NAME: usize = 253;

/// Problems with an IDN host name, empty when it is valid.
pub fn idn_errors(subject: &str) -> BTreeSet<&'static str> {
    let mut errors = BTreeSet::new();
    let trimmed = subject.strip_suffix('.').unwrap_or(subject);

    let ascii = match Host::parse(trimmed) {
        Ok(Host::Domain(ascii)) => ascii,
        Ok(_) => {
            // An address literal is not a host name.
            errors.insert(DISALLOWED);
            trimmed.to_ascii_lowercase()
        }
        Err(_) => {
            if trimmed.split('.').any(|l| l.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("xn--"))) {
                errors.insert(PUNYCODE);
            } else {
                errors.insert(DISALLOWED);
            }
            trimmed.to_string()
        }
    };

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.len() < 2 {
        errors.insert(LESS_THAN_TWO_LABELS);
    }
    for label in &labels {
        if label.is_empty() {
            errors.insert(EMPTY_LABEL);
        } else if label.len() > MAX_LABEL {
            errors.insert(LABEL_TOO_LONG);
        }
        if label.starts_with('-') {
            errors.insert(LEADING_HYPHEN);
        }
        if label.ends_with('-') {
            errors.insert(TRAILING_HYPHEN);
        }
    }
    if ascii.len() > MAX_NAME {
        errors.insert(DOMAIN_NAME_TOO_LONG);
    }
    errors
}

/// Problems with an LDH host name: letters, digits and hyphens only, label
/// lengths 1..=63, total length at most 253.
pub fn ldh_errors(subject: &str) -> BTreeSet<&'static str> {
    let mut errors = BTreeSet::new();
    let trimmed = subject.strip_suffix('.').unwrap_or(subject);
    if trimmed.len() > MAX_NAME {
        errors.insert(DOMAIN_NAME_TOO_LONG);
    }
    for label in trimmed.split('.') {
        if label.is_empty() {
            errors.insert(EMPTY_LABEL);
        } else if label.len() > MAX_LABEL {
            errors.insert(LABEL_TOO_LONG);
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            errors.insert(DISALLOWED);
        }
        if label.starts_with('-') {
            errors.insert(LEADING_HYPHEN);
        }
        if label.ends_with('-') {
            errors.insert(TRAILING_HYPHEN);
        }
    }
    errors
}

/// `[A, B]` rendering of a marker set.
pub fn render_markers(errors: &BTreeSet<&'static str>) -> String {
    let joined: Vec<&str> = errors.iter().copied().collect();
    format!("[{}]", joined.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_have_no_errors() {
        assert!(idn_errors("example.com").is_empty());
        assert!(idn_errors("xn--bcher-kva.example").is_empty());
        assert!(idn_errors("bücher.example").is_empty());
        assert!(ldh_errors("ns1.example.com.").is_empty());
    }

    #[test]
    fn long_label_and_long_name_both_reported() {
        let label = "a".repeat(64);
        let name = vec![label.as_str(); 5].join(".");
        let errors = idn_errors(&name);
        assert!(errors.contains(LABEL_TOO_LONG));
        assert!(errors.contains(DOMAIN_NAME_TOO_LONG));
    }

    #[test]
    fn single_label_is_reported() {
        assert!(idn_errors("localhost").contains(LESS_THAN_TWO_LABELS));
    }

    #[test]
    fn ldh_rejects_underscores() {
        assert!(ldh_errors("foo_bar.example").contains(DISALLOWED));
        assert!(ldh_errors("-foo.example").contains(LEADING_HYPHEN));
    }

    #[test]
    fn markers_render_sorted() {
        let errors: BTreeSet<&'static str> = [LESS_THAN_TWO_LABELS, LABEL_TOO_LONG].into_iter().collect();
        assert_eq!(render_markers(&errors), "[LABEL_TOO_LONG, LESS_THAN_TWO_LABELS]");
    }
}
