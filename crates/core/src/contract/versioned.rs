//! Generic versioned wrapper type
//!
//! This type expresses Invariant 2: Everything is Versioned.
//! Every read operation returns data wrapped in `Versioned<T>`.
//!
//! ## The Contract
//!
//! ```text
//! fn get(&self, ...) -> Result<Option<Versioned<T>>>
//! fn put(&self, ...) -> Result<Version>
//! ```
//!
//! - Reads return `Versioned<T>` (value + version + timestamp)
//! - Writes return `Version` (the version that was created)
//!
//! ## Migration from VersionedValue
//!
//! The old `VersionedValue` type is replaced by `Versioned<Value>`.
//! This generic version allows any type to be versioned.

use super::{Timestamp, Version};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value with its version information
///
/// This wrapper adds version metadata to any value type.
/// Every read operation in the database returns `Versioned<T>`.
///
/// ## Fields
///
/// - `value`: The actual data
/// - `version`: The version identifier (TxnId, Sequence, or Counter)
/// - `timestamp`: When this version was created (microseconds since epoch)
///
/// ## Invariants
///
/// - `version` always matches the mutation that created this data
/// - `timestamp` is always the creation time of this version
/// - Value is never modified after creation (immutable versions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The actual value
    pub value: T,

    /// Version identifier
    pub version: Version,

    /// Creation timestamp (microseconds since epoch)
    pub timestamp: Timestamp,
}

impl<T> Versioned<T> {
    /// Create a new versioned value with current timestamp
    pub fn new(value: T, version: Version) -> Self {
        Versioned {
            value,
            version,
            timestamp: Timestamp::now(),
        }
    }

    /// Create a versioned value with explicit timestamp
    pub fn with_timestamp(value: T, version: Version, timestamp: Timestamp) -> Self {
        Versioned {
            value,
            version,
            timestamp,
        }
    }

    /// Map the inner value to a new type
    pub fn map<U, F>(self, f: F) -> Versioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Versioned {
            value: f(self.value),
            version: self.version,
            timestamp: self.timestamp,
        }
    }

    /// Get a reference to the inner value
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Get a mutable reference to the inner value
    #[inline]
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Consume and return the inner value
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get the version
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the timestamp
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Check if this version is older than a duration
    pub fn is_older_than(&self, duration: Duration) -> bool {
        let now = Timestamp::now();
        if let Some(age) = now.duration_since(self.timestamp) {
            age > duration
        } else {
            false
        }
    }

    /// Get the age of this version
    pub fn age(&self) -> Option<Duration> {
        Timestamp::now().duration_since(self.timestamp)
    }

    /// Extract value and version as a tuple
    pub fn into_parts(self) -> (T, Version, Timestamp) {
        (self.value, self.version, self.timestamp)
    }
}

impl<T: Default> Default for Versioned<T> {
    fn default() -> Self {
        Versioned::new(T::default(), Version::default())
    }
}

impl<T> AsRef<T> for Versioned<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> AsMut<T> for Versioned<T> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

// ============================================================================
// VersionedValue type alias for backwards compatibility
// ============================================================================

use crate::value::Value;

/// Versioned value for the Value enum
///
/// This is the most common use case - versioned arbitrary values.
/// Equivalent to the old `VersionedValue` struct.
pub type VersionedValue = Versioned<Value>;

// ============================================================================
// Tests
// ============================================================================
