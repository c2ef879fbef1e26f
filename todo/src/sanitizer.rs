//! Title sanitization and validation.
//!
//! Sanitizing trims the input and replaces the HTML-reserved characters
//! `& < > " ' /` with entities. It is plain character substitution, no
//! parsing.
//!
//! The XSS and SQL detectors are best-effort regular expressions run against
//! the raw input. They catch the known patterns below and nothing else;
//! false negatives are expected. They are a filter, not a security boundary.

use crate::types::MAX_TITLE_LENGTH;
use serde_json::{Map, Value};

/// Title was not a string
pub const TITLE_NOT_STRING: &str = "TODO title must be a string.";
/// Title was empty after trimming
pub const TITLE_REQUIRED: &str = "TODO title is required.";
/// Title exceeded [`MAX_TITLE_LENGTH`] after sanitizing
pub const TITLE_TOO_LONG: &str = "TODO title must be 30 characters or fewer.";
/// Title contained one of `< > " ' &`
pub const TITLE_FORBIDDEN_CHARACTERS: &str = "TODO title contains characters that are not allowed.";
/// Title consisted of whitespace only
pub const TITLE_WHITESPACE_ONLY: &str = "TODO title cannot consist of whitespace only.";
/// Title looked like an SQL fragment
pub const TITLE_SQL_PATTERN: &str = "TODO title contains a disallowed keyword or comment marker.";
/// Title looked like markup or script
pub const TITLE_XSS_PATTERN: &str = "TODO title contains a disallowed script or markup pattern.";

/// Generic input was not a string
pub const INPUT_NOT_STRING: &str = "Input must be a string.";
/// Generic input was empty
pub const INPUT_REQUIRED: &str = "Input is required.";
/// Generic input had content that sanitized away to nothing
pub const INPUT_UNPROCESSABLE: &str = "Input contains invalid characters and cannot be processed.";
/// Generic input matched an XSS pattern
pub const INPUT_XSS_PATTERN: &str = "Input contains a disallowed pattern.";
/// Diagnostic attached to inputs matching an XSS pattern
pub const XSS_WARNING: &str = "XSS attack pattern detected.";

mod patterns {
    #![allow(clippy::expect_used)] // literal patterns, checked by tests

    use once_cell::sync::Lazy;
    use regex::Regex;

    pub static FORBIDDEN_CHARACTERS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"[<>"'&]"#).expect("valid forbidden character regex"));

    pub static WHITESPACE_ONLY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\s+$").expect("valid whitespace regex"));

    pub static SQL: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC|EXECUTE)\b",
            r"(--|#|/\*|\*/)",
            r#"(?i)\b(OR|AND)\b.*['"]"#,
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("valid sql regex"))
        .collect()
    });

    pub static XSS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?is)<script\b.*?</script>",
            r"(?i)javascript:",
            r"(?i)on\w+\s*=",
            r"(?i)<iframe\b",
            r"(?i)<object\b",
            r"(?i)<embed\b",
            r"(?i)<form\b",
            r"(?i)expression\s*\(",
            r"(?i)vbscript:",
            r"(?i)data:text/html",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("valid xss regex"))
        .collect()
    });
}

/// Replace `& < > " ' /` with their HTML entities
///
/// ```
/// assert_eq!(todo::sanitizer::escape_html("a<b>/c"), "a&lt;b&gt;&#x2F;c");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Trim, then escape
#[must_use]
pub fn sanitize(text: &str) -> String {
    escape_html(text.trim())
}

/// Whether `text` matches a known script, handler, or embedding pattern
#[must_use]
pub fn detect_xss_patterns(text: &str) -> bool {
    patterns::XSS.iter().any(|pattern| pattern.is_match(text))
}

/// Whether `text` matches a known SQL keyword or comment pattern
#[must_use]
pub fn detect_sql_patterns(text: &str) -> bool {
    patterns::SQL.iter().any(|pattern| pattern.is_match(text))
}

/// Outcome of title validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleValidation {
    /// Whether `errors` is empty
    pub is_valid: bool,
    /// The sanitized title, usable only when valid
    pub sanitized_title: String,
    /// User-facing reasons for rejection, in check order
    pub errors: Vec<String>,
}

/// Validate and sanitize a todo title
///
/// Length is counted in characters on the sanitized text. Pattern checks
/// run against the raw text, so each problem gets its own message.
#[must_use]
pub fn validate_title(raw: &str) -> TitleValidation {
    let sanitized = sanitize(raw);
    let mut errors = Vec::new();

    let length = sanitized.chars().count();
    if length == 0 {
        errors.push(TITLE_REQUIRED.to_string());
    } else if length > MAX_TITLE_LENGTH {
        errors.push(TITLE_TOO_LONG.to_string());
    }

    if patterns::FORBIDDEN_CHARACTERS.is_match(raw) {
        errors.push(TITLE_FORBIDDEN_CHARACTERS.to_string());
    }

    if patterns::WHITESPACE_ONLY.is_match(raw) {
        errors.push(TITLE_WHITESPACE_ONLY.to_string());
    }

    if detect_sql_patterns(raw) {
        errors.push(TITLE_SQL_PATTERN.to_string());
    }

    if detect_xss_patterns(raw) {
        errors.push(TITLE_XSS_PATTERN.to_string());
    }

    TitleValidation {
        is_valid: errors.is_empty(),
        sanitized_title: sanitized,
        errors,
    }
}

/// Validate an untyped title, rejecting anything but a JSON string
#[must_use]
pub fn validate_title_value(raw: &Value) -> TitleValidation {
    match raw {
        Value::String(title) => validate_title(title),
        _ => TitleValidation {
            is_valid: false,
            sanitized_title: String::new(),
            errors: vec![TITLE_NOT_STRING.to_string()],
        },
    }
}

/// Outcome of generic input validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputValidation {
    /// Whether `errors` is empty
    pub is_valid: bool,
    /// The sanitized input
    pub sanitized_value: String,
    /// Problems that block submission
    pub errors: Vec<String>,
    /// Diagnostics only; an XSS match also adds an error
    pub security_warnings: Vec<String>,
}

/// Type, XSS, and length checks for an arbitrary input field
#[must_use]
pub fn comprehensive_input_validation(input: &Value, max_length: usize) -> InputValidation {
    let Value::String(text) = input else {
        return InputValidation {
            is_valid: false,
            sanitized_value: String::new(),
            errors: vec![INPUT_NOT_STRING.to_string()],
            security_warnings: Vec::new(),
        };
    };

    let mut errors = Vec::new();
    let mut security_warnings = Vec::new();

    if detect_xss_patterns(text) {
        tracing::warn!(input_len = text.len(), "XSS pattern detected in input");
        security_warnings.push(XSS_WARNING.to_string());
        errors.push(INPUT_XSS_PATTERN.to_string());
    }

    let sanitized_value = sanitize(text);
    let length = sanitized_value.chars().count();

    if length == 0 && !text.is_empty() {
        errors.push(INPUT_UNPROCESSABLE.to_string());
    } else if length == 0 {
        errors.push(INPUT_REQUIRED.to_string());
    } else if length > max_length {
        errors.push(format!("Input must be {max_length} characters or fewer."));
    }

    InputValidation {
        is_valid: errors.is_empty(),
        sanitized_value,
        errors,
        security_warnings,
    }
}

/// Sanitize every string field of a form payload in place
pub fn sanitize_form_data(form: &mut Map<String, Value>) {
    for value in form.values_mut() {
        if let Value::String(text) = value {
            *text = sanitize(text);
        }
    }
}
