//! Short code generation and validation utilities.
//!
//! Generated codes draw their length uniformly from a configured range and
//! fill each position uniformly from a 62-symbol alphabet. Custom codes are
//! validated against the same alphabet (optionally extended with `-` and `_`).

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Symbols used for generated codes.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Shortest accepted custom code.
pub const CUSTOM_CODE_MIN_LENGTH: usize = 2;

/// Longest accepted custom code.
pub const CUSTOM_CODE_MAX_LENGTH: usize = 20;

/// Codes that would shadow service routes.
const RESERVED_CODES: &[&str] = &["shorten", "health", "api"];

/// Random code generator over [`ALPHABET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenerator {
    min_length: usize,
    max_length: usize,
}

impl CodeGenerator {
    /// Creates a generator drawing lengths uniformly from `min_length..=max_length`.
    ///
    /// # Panics
    ///
    /// Panics if `min_length` is zero or greater than `max_length`.
    pub fn new(min_length: usize, max_length: usize) -> Self {
        assert!(
            min_length >= 1 && min_length <= max_length,
            "invalid code length range {min_length}..={max_length}"
        );
        Self {
            min_length,
            max_length,
        }
    }

    /// Creates a generator that always produces codes of `length` symbols.
    pub fn fixed(length: usize) -> Self {
        Self::new(length, length)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Generates a random code.
    ///
    /// The result is NOT checked against the store; uniqueness is decided by
    /// the store's insert.
    pub fn generate(&self) -> String {
        let mut rng = rand::rng();
        let length = rng.random_range(self.min_length..=self.max_length);

        (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Whether a code of `length` symbols could have come from this generator.
    ///
    /// Codes outside the range are necessarily custom.
    pub fn is_generated_length(&self, length: usize) -> bool {
        (self.min_length..=self.max_length).contains(&length)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::fixed(6)
    }
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - Length: 2-20 characters
/// - Allowed characters: ASCII letters and digits, plus `-` and `_` when
///   `allow_punctuation` is set
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::InvalidCode`] if any rule is violated.
pub fn validate_custom_code(code: &str, allow_punctuation: bool) -> Result<(), AppError> {
    let length = code.chars().count();
    if !(CUSTOM_CODE_MIN_LENGTH..=CUSTOM_CODE_MAX_LENGTH).contains(&length) {
        return Err(AppError::invalid_code(
            format!(
                "Custom code must be {CUSTOM_CODE_MIN_LENGTH}-{CUSTOM_CODE_MAX_LENGTH} characters"
            ),
            json!({ "provided_length": length }),
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || (allow_punctuation && (c == '-' || c == '_'));
    if !code.chars().all(allowed) {
        let message = if allow_punctuation {
            "Custom code can only contain letters, digits, hyphens and underscores"
        } else {
            "Custom code can only contain letters and digits"
        };
        return Err(AppError::invalid_code(message, json!({ "code": code })));
    }

    if RESERVED_CODES.iter().any(|r| r.eq_ignore_ascii_case(code)) {
        return Err(AppError::invalid_code(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
