//! Run name type
//!
//! Runs have dual identity:
//! - **RunId**: Internal, immutable UUID assigned by the system
//! - **RunName**: User-facing, semantic identifier set by the user
//!
//! RunName is the "what" (semantic purpose), RunId is the "which" (unique instance).
//!
//! ## Examples
//!
//! - RunName: "training-gpt-v3-2024"
//! - RunId: 550e8400-e29b-41d4-a716-446655440000
//!
//! ## Validation
//!
//! Run names must:
//! - Be 1-256 characters
//! - Contain only alphanumeric, dash, underscore, dot
//! - Not start with a dash or dot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a run name
pub const MAX_RUN_NAME_LENGTH: usize = 256;

/// User-facing semantic identifier for a run
///
/// RunName is the human-readable, meaningful name for a run.
/// Unlike RunId (which is a UUID), RunName captures the semantic
/// purpose of the run.
///
/// ## Validation Rules
///
/// - Length: 1-256 characters
/// - Characters: `[a-zA-Z0-9_.-]`
/// - Cannot start with `-` or `.`
///
/// ## Examples
///
/// Valid names:
/// - "training-run-1"
/// - "experiment.v2"
/// - "prod_agent_2024"
///
/// Invalid names:
/// - "" (empty)
/// - "-starts-with-dash"
/// - ".hidden"
/// - "has spaces"
/// - "has@special"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunName(String);

/// Error when validating a run name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunNameError {
    /// Name is empty
    Empty,
    /// Name exceeds maximum length
    TooLong {
        /// Actual length of the name
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Name contains invalid character
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },
    /// Name starts with invalid character
    InvalidStart {
        /// The invalid starting character
        char: char,
    },
}

impl std::fmt::Display for RunNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunNameError::Empty => write!(f, "run name cannot be empty"),
            RunNameError::TooLong { length, max } => {
                write!(f, "run name too long: {} chars (max {})", length, max)
            }
            RunNameError::InvalidChar { char, position } => {
                write!(
                    f,
                    "invalid character '{}' at position {} (only alphanumeric, dash, underscore, dot allowed)",
                    char, position
                )
            }
            RunNameError::InvalidStart { char } => {
                write!(
                    f,
                    "run name cannot start with '{}' (must start with alphanumeric or underscore)",
                    char
                )
            }
        }
    }
}

impl std::error::Error for RunNameError {}

impl RunName {
    /// Create a new RunName, validating the input
    ///
    /// # Errors
    ///
    /// Returns `RunNameError` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self, RunNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(RunName(name))
    }

    /// Create a RunName without validation
    ///
    /// # Safety
    ///
    /// The caller must ensure the name is valid. Use `new()` for untrusted input.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        RunName(name.into())
    }

    /// Validate a run name
    pub fn validate(name: &str) -> Result<(), RunNameError> {
        // Check empty
        if name.is_empty() {
            return Err(RunNameError::Empty);
        }

        // Check length
        if name.len() > MAX_RUN_NAME_LENGTH {
            return Err(RunNameError::TooLong {
                length: name.len(),
                max: MAX_RUN_NAME_LENGTH,
            });
        }

        // Check first character
        let first = name.chars().next().unwrap();
        if !first.is_ascii_alphanumeric() && first != '_' {
            return Err(RunNameError::InvalidStart { char: first });
        }

        // Check all characters
        for (pos, ch) in name.chars().enumerate() {
            if !Self::is_valid_char(ch) {
                return Err(RunNameError::InvalidChar {
                    char: ch,
                    position: pos,
                });
            }
        }

        Ok(())
    }

    /// Check if a character is valid in a run name
    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Check if this name matches a pattern (simple prefix match)
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Check if this name matches a pattern (simple suffix match)
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }

    /// Check if this name contains a substring
    pub fn contains(&self, substr: &str) -> bool {
        self.0.contains(substr)
    }
}

impl AsRef<str> for RunName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RunName {
    type Error = RunNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RunName::new(value)
    }
}

impl TryFrom<&str> for RunName {
    type Error = RunNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RunName::new(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
