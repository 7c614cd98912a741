//! Key validation for Strata
//!
//! This module defines key validation rules that are enforced by all API layers.
//! Keys are Unicode strings with specific constraints.
//!
//! ## Contract
//!
//! After stabilization, these validation rules are FROZEN:
//! - Keys must be valid UTF-8 (guaranteed by Rust's &str type)
//! - Keys must not be empty
//! - Keys must not contain NUL bytes (\0)
//! - Keys must not start with reserved prefix `_strata/`
//! - Keys must not exceed `max_key_bytes` (default: 1024)

use crate::limits::Limits;
use thiserror::Error;

/// Reserved system prefix for internal keys
pub const RESERVED_PREFIX: &str = "_strata/";

/// Validate a key using default limits
///
/// This is the primary validation function for user-facing APIs.
/// It validates all key rules: non-empty, no NUL, no reserved prefix, length.
///
/// # Examples
///
/// ```
/// use strata_core::key::validate_key;
///
/// // Valid keys
/// assert!(validate_key("mykey").is_ok());
/// assert!(validate_key("user:123").is_ok());
/// assert!(validate_key("æ—¥æœ¬èªž").is_ok());
///
/// // Invalid keys
/// assert!(validate_key("").is_err()); // empty
/// assert!(validate_key("a\x00b").is_err()); // contains NUL
/// assert!(validate_key("_strata/internal").is_err()); // reserved prefix
/// ```
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    validate_key_with_limits(key, &Limits::default())
}

/// Validate a key with custom limits
///
/// This is useful when the database is opened with custom limits.
pub fn validate_key_with_limits(key: &str, limits: &Limits) -> Result<(), KeyError> {
    // Rule 1: Key cannot be empty
    if key.is_empty() {
        return Err(KeyError::Empty);
    }

    // Rule 2: Key cannot contain NUL bytes
    if key.contains('\x00') {
        return Err(KeyError::ContainsNul);
    }

    // Rule 3: Key cannot use reserved prefix
    if key.starts_with(RESERVED_PREFIX) {
        return Err(KeyError::ReservedPrefix);
    }

    // Rule 4: Key cannot exceed max length
    let len = key.len();
    if len > limits.max_key_bytes {
        return Err(KeyError::TooLong {
            actual: len,
            max: limits.max_key_bytes,
        });
    }

    // Note: UTF-8 validity is guaranteed by Rust's &str type

    Ok(())
}

/// Key validation errors
///
/// These errors map to `InvalidKey` error code in the wire protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key is empty (length 0)
    #[error("Key cannot be empty")]
    Empty,

    /// Key contains NUL byte (\0)
    #[error("Key cannot contain NUL bytes")]
    ContainsNul,

    /// Key uses reserved system prefix `_strata/`
    #[error("Key cannot use reserved prefix '{}'", RESERVED_PREFIX)]
    ReservedPrefix,

    /// Key exceeds maximum length
    #[error("Key too long: {actual} bytes exceeds maximum {max}")]
    TooLong {
        /// Actual key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },
}

impl KeyError {
    /// Get the reason code for wire protocol
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::Empty => "empty_key",
            KeyError::ContainsNul => "contains_nul",
            KeyError::ReservedPrefix => "reserved_prefix",
            KeyError::TooLong { .. } => "key_too_long",
        }
    }
}
