//! Kubernetes resource quantities such as `512Mi`, `1.5G` or `100m`.
//!
//! Only validation is performed here; the quantity is kept in the exact
//! textual form the user passed so manifests read the way they were asked for.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const QUANTITY_PATTERN: &str = r"^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$";

const BINARY_SUFFIXES: &[&str] = &["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: &[&str] = &["n", "u", "m", "", "k", "M", "G", "T", "P", "E"];

/// Errors produced when parsing a [`Quantity`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantities must match the regular expression '{}'", QUANTITY_PATTERN)]
    Format,
    #[error("unable to parse quantity's numeric part")]
    Numeric,
    #[error("unable to parse quantity's suffix")]
    Suffix,
}

/// A validated resource quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quantity(String);

fn quantity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(QUANTITY_PATTERN).unwrap())
}

fn is_valid_suffix(suffix: &str) -> bool {
    if BINARY_SUFFIXES.contains(&suffix) || DECIMAL_SUFFIXES.contains(&suffix) {
        return true;
    }
    // Decimal exponent, e.g. 1e3 or 5E-2
    suffix
        .strip_prefix(['e', 'E'])
        .is_some_and(|exp| exp.parse::<i32>().is_ok())
}

impl Quantity {
    /// The quantity as it was given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the quantity is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        quantity_regex()
            .captures(&self.0)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .is_some_and(|n| n > 0.0)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let caps = quantity_regex()
            .captures(s)
            .ok_or(QuantityError::Format)?;
        if !is_valid_suffix(&caps[2]) {
            return Err(QuantityError::Suffix);
        }
        let digits = caps[1].trim_start_matches(['+', '-']);
        if digits.matches('.').count() > 1 || !digits.contains(|c: char| c.is_ascii_digit()) {
            return Err(QuantityError::Numeric);
        }
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_quantities() {
        for q in ["512Mi", "1Gi", "10G", "1.5Ti", "100m", "1", "+3k", "1e3", "5E-2", "0"] {
            let parsed: Quantity = q.parse().unwrap();
            assert_eq!(parsed.as_str(), q);
        }
    }

    #[test]
    fn test_quantity_is_trimmed() {
        let parsed: Quantity = " 2Gi ".parse().unwrap();
        assert_eq!(parsed.to_string(), "2Gi");
    }

    #[test]
    fn test_invalid_format() {
        for q in ["", "Gi", "invalid", "1 Gi", "1Xi"] {
            assert_eq!(q.parse::<Quantity>(), Err(QuantityError::Format), "{q}");
        }
        assert_eq!(
            QuantityError::Format.to_string(),
            "quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'"
        );
    }

    #[test]
    fn test_invalid_suffix() {
        for q in ["1iG", "1Mii", "2Kk", "1mu"] {
            assert_eq!(q.parse::<Quantity>(), Err(QuantityError::Suffix), "{q}");
        }
    }

    #[test]
    fn test_invalid_number() {
        assert_eq!("1.2.3Gi".parse::<Quantity>(), Err(QuantityError::Numeric));
        assert_eq!("..Gi".parse::<Quantity>(), Err(QuantityError::Numeric));
    }

    #[test]
    fn test_is_positive() {
        assert!("1Gi".parse::<Quantity>().unwrap().is_positive());
        assert!("0.5".parse::<Quantity>().unwrap().is_positive());
        assert!(!"0Mi".parse::<Quantity>().unwrap().is_positive());
        assert!(!"-1Gi".parse::<Quantity>().unwrap().is_positive());
    }
}
