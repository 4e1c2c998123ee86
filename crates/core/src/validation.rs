// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-level validation with JSON pointer locations.
//!
//! A [`Validator`] accumulates [`FieldError`]s instead of failing on the first
//! problem, so callers can report every invalid field of a payload at once.

use serde::Serialize;
use std::fmt;

pub const MAX_NAME_LENGTH: usize = 100;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON pointer to the field, e.g. `/private_key`.
    pub pointer: String,
    /// Machine-readable code such as `missing_value` or `invalid_uri`.
    pub code: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Pointers of every invalid field, in report order.
    pub fn pointers(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.pointer.as_str()).collect()
    }

    pub fn contains(&self, pointer: &str) -> bool {
        self.0.iter().any(|e| e.pointer == pointer)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid data")?;
        for (i, error) in self.0.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field errors under a pointer prefix.
#[derive(Debug, Default)]
pub struct Validator {
    prefix: String,
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator whose pointers are nested under `prefix` (e.g. `/data`).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), errors: Vec::new() }
    }

    fn pointer(&self, key: &str) -> String {
        format!("{}/{}", self.prefix, key)
    }

    /// Record an error when `ok` is false. Returns `ok`.
    pub fn check(&mut self, key: &str, ok: bool, code: &str, message: impl Into<String>) -> bool {
        if !ok {
            self.add(key, code, message);
        }
        ok
    }

    pub fn add(&mut self, key: &str, code: &str, message: impl Into<String>) {
        let pointer = self.pointer(key);
        self.errors.push(FieldError { pointer, code: code.to_string(), message: message.into() });
    }

    pub fn check_string_not_empty(&mut self, key: &str, value: &str) -> bool {
        self.check(key, !value.is_empty(), "missing_value", "missing or empty value")
    }

    /// Absolute URI with a scheme, as accepted by `url::Url::parse`.
    pub fn check_uri(&mut self, key: &str, value: &str) -> bool {
        if !self.check_string_not_empty(key, value) {
            return false;
        }
        match url::Url::parse(value) {
            Ok(_) => true,
            Err(e) => {
                self.add(key, "invalid_uri", format!("invalid uri: {e}"));
                false
            }
        }
    }

    pub fn check_optional_uri(&mut self, key: &str, value: Option<&str>) -> bool {
        match value {
            Some(value) => self.check_uri(key, value),
            None => true,
        }
    }

    pub fn check_array_not_empty<T>(&mut self, key: &str, values: &[T]) -> bool {
        self.check(key, !values.is_empty(), "empty_array", "array must contain at least one element")
    }

    pub fn check_int_min_max(&mut self, key: &str, value: i64, min: i64, max: i64) -> bool {
        self.check(
            key,
            (min..=max).contains(&value),
            "out_of_range",
            format!("integer must be between {min} and {max}"),
        )
    }

    pub fn check_float_min_max(&mut self, key: &str, value: f64, min: f64, max: f64) -> bool {
        self.check(
            key,
            (min..=max).contains(&value),
            "out_of_range",
            format!("number must be between {min} and {max}"),
        )
    }

    pub fn check_string_value(&mut self, key: &str, value: &str, allowed: &[&str]) -> bool {
        self.check(
            key,
            allowed.contains(&value),
            "invalid_value",
            format!("value must be one of: {}", allowed.join(", ")),
        )
    }

    pub fn check_absolute_path(&mut self, key: &str, value: &str) -> bool {
        if !self.check_string_not_empty(key, value) {
            return false;
        }
        self.check(key, value.starts_with('/'), "relative_path", "path must be absolute")
    }

    /// Lower case alphanumeric names with `-` or `_`, starting with an alphanumeric.
    pub fn check_name(&mut self, key: &str, value: &str) -> bool {
        if !self.check_string_not_empty(key, value) {
            return false;
        }
        if !self.check(
            key,
            value.chars().count() <= MAX_NAME_LENGTH,
            "string_too_long",
            format!("names must contain at most {MAX_NAME_LENGTH} characters"),
        ) {
            return false;
        }
        let mut chars = value.chars();
        let first_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        self.check(
            key,
            first_ok && rest_ok,
            "invalid_format",
            "names must only contain lower case alphanumeric characters, '-' or '_', \
             and must start with an alphanumeric character",
        )
    }

    /// Merge errors from a nested validator.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.0);
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors(self.errors)
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
