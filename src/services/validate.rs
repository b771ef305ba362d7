//! Form validation shared by the account, profile and event services.
//!
//! Validation always runs before any backend call; a non-empty
//! [`FieldErrors`] means nothing was sent.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Field name -> user-facing message.
pub type FieldErrors = BTreeMap<&'static str, String>;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("EMAIL_REGEX pattern is valid"));

/// Unanchored `\S+@\S+\.\S+`: some non-blank run, an `@`, another run, a
/// dot and a final run, anywhere in the value.
#[must_use]
pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_REGEX.is_match(raw)
}

/// Trimmed, non-empty value or `None`.
#[must_use]
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

/// Record `message` under `field` when `raw` is blank. Returns the trimmed
/// value when present.
pub fn require<'a>(errors: &mut FieldErrors, field: &'static str, raw: Option<&'a str>, message: &str) -> Option<&'a str> {
    let value = non_empty(raw);
    if value.is_none() {
        errors.insert(field, message.to_owned());
    }
    value
}

/// Email field with the sign-up/login messages.
pub fn check_email(errors: &mut FieldErrors, raw: Option<&str>) {
    match non_empty(raw) {
        None => {
            errors.insert("email", "Email is required".into());
        }
        Some(email) if !is_valid_email(email) => {
            errors.insert("email", "Email is invalid".into());
        }
        Some(_) => {}
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
