//! US zip code normalization and validation.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Matches a 5-digit zip with an optional `-dddd` extension.
pub const ZIP_PATTERN: &str = r"^(\d{5})(?:-\d{4})?$";

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ZIP_PATTERN).expect("valid regex"));

/// Maximum number of zip codes accepted in a single bulk request.
pub const MAX_BULK_ZIP_CODES: usize = 1_000;

/// Normalize a zip (or ZIP+4) to its 5-digit form.
pub fn normalize_zip_code(input: &str) -> Result<String, CoreError> {
    let trimmed = input.trim();
    ZIP_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CoreError::Validation(format!("Invalid zip code: '{trimmed}'")))
}

/// Whether `input` is a 5-digit zip or ZIP+4.
pub fn is_valid_zip_code(input: &str) -> bool {
    ZIP_RE.is_match(input.trim())
}

/// Normalize a list of zips, de-duplicating and sorting the result.
///
/// Every invalid entry is reported in a single validation error.
pub fn normalize_zip_codes(inputs: &[String]) -> Result<Vec<String>, CoreError> {
    if inputs.is_empty() {
        return Err(CoreError::Validation(
            "At least one zip code is required".to_string(),
        ));
    }
    if inputs.len() > MAX_BULK_ZIP_CODES {
        return Err(CoreError::Validation(format!(
            "At most {MAX_BULK_ZIP_CODES} zip codes per request (got {})",
            inputs.len()
        )));
    }

    let mut valid = BTreeSet::new();
    let mut invalid = Vec::new();
    for input in inputs {
        match normalize_zip_code(input) {
            Ok(zip) => {
                valid.insert(zip);
            }
            Err(_) => invalid.push(input.trim().to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(CoreError::Validation(format!(
            "Invalid zip codes: {}",
            invalid.join(", ")
        )));
    }
    Ok(valid.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_five_digits() {
        assert_eq!(normalize_zip_code("90210").unwrap(), "90210");
        assert_eq!(normalize_zip_code(" 02134 ").unwrap(), "02134");
    }

    #[test]
    fn strips_plus_four() {
        assert_eq!(normalize_zip_code("90210-1234").unwrap(), "90210");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "9021", "902100", "abcde", "90210-12", "90210 1234"] {
            assert!(normalize_zip_code(bad).is_err(), "{bad:?} should be rejected");
            assert!(!is_valid_zip_code(bad));
        }
    }

    #[test]
    fn bulk_dedups_and_sorts() {
        let input = vec!["90212".into(), "90210".into(), "90210-0001".into()];
        assert_eq!(normalize_zip_codes(&input).unwrap(), vec!["90210", "90212"]);
    }

    #[test]
    fn bulk_reports_every_invalid_entry() {
        let input = vec!["90210".into(), "x".into(), "123".into()];
        let err = normalize_zip_codes(&input).unwrap_err().to_string();
        assert!(err.contains("x, 123"), "got: {err}");
    }

    #[test]
    fn bulk_requires_entries() {
        assert!(normalize_zip_codes(&[]).is_err());
    }
}
