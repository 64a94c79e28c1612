//! Pure validation predicates for candidate form fields.
//!
//! No side effects, no errors: each predicate returns a plain `bool`.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{7,15}$").expect("phone regex"));

/// Syntactic email check: non-empty local part, `@`, and a dotted domain.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Phone check: 7 to 15 decimal digits after stripping spaces and hyphens.
pub fn is_valid_phone(s: &str) -> bool {
    let stripped: String = s.chars().filter(|c| *c != ' ' && *c != '-').collect();
    PHONE_RE.is_match(&stripped)
}

/// Experience check: parses as a non-negative integer.
pub fn is_valid_experience(s: &str) -> bool {
    s.trim().parse::<u32>().is_ok()
}
