//! Name Normalization
//!
//! Permission actions, permission resources and role names share one format:
//! trimmed, upper-cased, and made only of `A-Z` and `_`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::errors::NameError;

lazy_static! {
    /// Regex for validating normalized names
    static ref NAME_REGEX: Regex = Regex::new(r"^[A-Z_]+$").expect("valid regex");
}

/// Normalize a raw name and validate its format.
///
/// # Errors
///
/// Returns `NameError::Empty` if nothing is left after trimming.
/// Returns `NameError::InvalidFormat` if the upper-cased value contains
/// anything other than `A-Z` or `_`.
pub fn normalize(raw: &str) -> Result<String, NameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }

    let normalized = trimmed.to_uppercase();
    if NAME_REGEX.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(NameError::InvalidFormat(raw.to_string()))
    }
}

/// Normalize a name used as a lookup key, without validating it.
///
/// Invalid keys simply never match a stored name.
#[must_use]
pub fn lookup_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}
