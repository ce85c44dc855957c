//! Synchronous field validation.
//!
//! Validation runs before any I/O. A failed check produces a [`FieldErrors`]
//! list that the workflow turns into inline annotations; no request is sent.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid literal")
});

/// Whether `email` has the `local@domain.tld` shape.
///
/// Exactly one `@`, no whitespace anywhere, and at least one `.` after the
/// `@` with something on both sides of it. This is a shape check only.
///
/// ```
/// use sitekit_client::validation::is_valid_email;
///
/// assert!(is_valid_email("a@b.co"));
/// assert!(!is_valid_email("a@b"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether a field value counts as missing (empty after trimming).
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A single failed check, tied to the field it should be shown next to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of failed checks for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError {
            field: field.to_owned(),
            message: message.to_owned(),
        });
    }

    /// Record `message` against `field` when `value` is blank.
    ///
    /// Returns `true` if the value was present.
    pub fn require(&mut self, field: &str, value: &str, message: &str) -> bool {
        if is_blank(value) {
            self.push(field, message);
            false
        } else {
            true
        }
    }

    /// Required-then-shape check for an email field. At most one error is
    /// recorded per field.
    pub fn require_email(&mut self, field: &str, value: &str, required: &str, invalid: &str) {
        if self.require(field, value, required) && !is_valid_email(value) {
            self.push(field, invalid);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// First recorded failure, used for single-line status rendering.
    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// `Ok(())` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one check failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}
