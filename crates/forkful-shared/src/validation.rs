//! Field-level validation results.
//!
//! Each entity has a pure `validate_*` function that either returns a
//! cleaned-up value or a [`ValidationErrors`] list. Nothing reaches the
//! store until validation has passed.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$")
        .expect("phone pattern is valid")
});

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one input, in the order they were detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a list holding exactly one error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Rename every field, e.g. to nest a sub-entity's errors under a prefix.
    pub fn map_fields(self, rename: impl Fn(&str) -> String) -> Self {
        Self {
            errors: self
                .errors
                .into_iter()
                .map(|e| FieldError {
                    field: rename(&e.field),
                    message: e.message,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        if messages.is_empty() {
            write!(f, "Validation failed")
        } else {
            write!(f, "{}", messages.join("; "))
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim an optional string and drop it if nothing is left.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value.trim())
}
