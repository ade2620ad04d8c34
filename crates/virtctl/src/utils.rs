use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use thiserror::Error;

/// Characters used for generated names; vowels and look-alike digits are
/// left out so generated names never spell words.
const RANDOM_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const DNS1123_LABEL_MAX_LENGTH: usize = 63;

/// Returns `len` random lowercase alphanumeric characters.
pub(crate) fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| RANDOM_ALPHABET[rng.random_range(0..RANDOM_ALPHABET.len())] as char)
        .collect()
}

/// Generates `<prefix>-xxxxx`.
pub(crate) fn generate_name(prefix: &str) -> String {
    format!("{prefix}-{}", random_suffix(5))
}

#[derive(Debug, Error)]
#[error("invalid name \"{name}\": {reason}")]
pub(crate) struct InvalidNameError {
    name: String,
    reason: String,
}

fn dns1123_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{DNS1123_LABEL_FMT}$")).unwrap())
}

/// Validate a name as an RFC 1123 DNS label, which is what volume and disk
/// names must be.
pub(crate) fn validate_dns1123_label(name: &str) -> Result<(), InvalidNameError> {
    let reason = if name.contains('.') {
        "must not contain dots".to_owned()
    } else if name.len() > DNS1123_LABEL_MAX_LENGTH {
        format!("must be no more than {DNS1123_LABEL_MAX_LENGTH} characters")
    } else if !dns1123_label_regex().is_match(name) {
        format!(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character (e.g. 'my-name',  or '123-abc', \
             regex used for validation is '{DNS1123_LABEL_FMT}')"
        )
    } else {
        return Ok(());
    };
    Err(InvalidNameError {
        name: name.to_owned(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_name() {
        let name = generate_name("vm");
        assert_eq!(name.len(), 8);
        assert!(name.starts_with("vm-"));
        assert!(name[3..].bytes().all(|b| RANDOM_ALPHABET.contains(&b)));
        validate_dns1123_label(&name).unwrap();
    }

    #[test]
    fn test_valid_labels() {
        let longest = "x".repeat(63);
        for name in ["a", "my-volume", "123-abc", longest.as_str()] {
            validate_dns1123_label(name).unwrap();
        }
    }

    #[test]
    fn test_invalid_labels() {
        let err = validate_dns1123_label("my.volume").unwrap_err();
        assert_eq!(err.to_string(), "invalid name \"my.volume\": must not contain dots");

        let long = "x".repeat(64);
        let err = validate_dns1123_label(&long).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("invalid name \"{long}\": must be no more than 63 characters")
        );

        for name in ["-notallowed", "UPPER", "trailing-", ""] {
            let err = validate_dns1123_label(name).unwrap_err().to_string();
            assert!(
                err.contains("a lowercase RFC 1123 label must consist of"),
                "{name}: {err}"
            );
        }
    }
}
