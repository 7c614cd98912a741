//! Metadata filtering for vector search
//!
//! Supports only equality filtering on top-level scalar fields.
//! Complex filters (ranges, nested paths, arrays) are deferred to future versions.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Metadata filter for search (equality only)
///
/// Supports only top-level field equality filtering.
/// Complex filters (ranges, nested paths, arrays) are deferred to future versions.
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    /// Top-level field equality (scalar values only)
    /// All conditions must match (AND semantics)
    pub equals: HashMap<String, JsonScalar>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            equals: HashMap::new(),
        }
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonScalar>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Check if metadata matches this filter
    ///
    /// Returns true if all conditions match.
    /// Returns false if metadata is None and filter is non-empty.
    pub fn matches(&self, metadata: &Option<JsonValue>) -> bool {
        if self.equals.is_empty() {
            return true;
        }

        let Some(meta) = metadata else {
            return false;
        };

        let Some(obj) = meta.as_object() else {
            return false;
        };

        for (key, expected) in &self.equals {
            let Some(actual) = obj.get(key) else {
                return false;
            };
            if !expected.matches_json(actual) {
                return false;
            }
        }

        true
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    /// Get the number of conditions in the filter
    pub fn len(&self) -> usize {
        self.equals.len()
    }
}

/// JSON scalar value for filtering
///
/// Only scalar values can be used in equality filters.
/// Complex types (arrays, objects) are not supported.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonScalar {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (stored as f64)
    Number(f64),
    /// String value
    String(String),
}

impl JsonScalar {
    /// Check if this scalar matches a JSON value
    pub fn matches_json(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (JsonScalar::Null, JsonValue::Null) => true,
            (JsonScalar::Bool(a), JsonValue::Bool(b)) => a == b,
            (JsonScalar::Number(a), JsonValue::Number(b)) => {
                b.as_f64().is_some_and(|n| (a - n).abs() < f64::EPSILON)
            }
            (JsonScalar::String(a), JsonValue::String(b)) => a == b,
            _ => false,
        }
    }
}

// Convenience conversions
impl From<bool> for JsonScalar {
    fn from(b: bool) -> Self {
        JsonScalar::Bool(b)
    }
}

impl From<i32> for JsonScalar {
    fn from(n: i32) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<i64> for JsonScalar {
    fn from(n: i64) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<f64> for JsonScalar {
    fn from(n: f64) -> Self {
        JsonScalar::Number(n)
    }
}

impl From<f32> for JsonScalar {
    fn from(n: f32) -> Self {
        JsonScalar::Number(n as f64)
    }
}

impl From<String> for JsonScalar {
    fn from(s: String) -> Self {
        JsonScalar::String(s)
    }
}

impl From<&str> for JsonScalar {
    fn from(s: &str) -> Self {
        JsonScalar::String(s.to_string())
    }
}
