//! Value types and versioning for in-mem
//!
//! This module defines:
//! - Value: Unified enum for all primitive data types
//! - VersionedValue: Wrapper with version, timestamp, and TTL
//! - RunMetadataEntry: Metadata for agent runs
//! - Associated types for structured data (events, traces, etc.)

use crate::types::RunId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Get current timestamp in milliseconds since Unix epoch
///
/// Used for run metadata timestamps.
pub fn now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Metadata entry for an agent run
///
/// Tracks the lifecycle and metadata of a run, including:
/// - Creation and completion timestamps
/// - Version range (first_version to last_version)
/// - Parent run (for forked runs)
/// - Custom tags for categorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadataEntry {
    /// Unique identifier for this run
    pub run_id: RunId,
    /// Parent run ID (if this run was forked)
    pub parent_run_id: Option<RunId>,
    /// Current status (e.g., "running", "completed", "failed")
    pub status: String,
    /// Timestamp when the run was created (millis since epoch)
    pub created_at: u64,
    /// Timestamp when the run completed (millis since epoch)
    pub completed_at: Option<u64>,
    /// First version assigned during this run
    pub first_version: u64,
    /// Last version assigned during this run
    pub last_version: u64,
    /// Custom tags for categorization
    pub tags: Vec<(String, String)>,
}

/// Timestamp type (Unix timestamp in seconds)
pub type Timestamp = i64;

/// Unified value type for all primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit floating point
    F64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Map of string keys to values
    Map(std::collections::HashMap<String, Value>),
    /// Run metadata entry
    RunMetadata(RunMetadataEntry),
}

/// Versioned value with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// The actual value
    pub value: Value,
    /// Monotonically increasing version number
    pub version: u64,
    /// Unix timestamp when the value was created
    pub timestamp: Timestamp,
    /// Optional time-to-live duration
    pub ttl: Option<Duration>,
}

impl VersionedValue {
    /// Create a new versioned value
    pub fn new(value: Value, version: u64, ttl: Option<Duration>) -> Self {
        Self {
            value,
            version,
            timestamp: Utc::now().timestamp(),
            ttl,
        }
    }

    /// Check if the value has expired based on TTL
    pub fn is_expired(&self) -> bool {
        if let Some(ttl) = self.ttl {
            let now = Utc::now().timestamp();
            let elapsed = now - self.timestamp;
            elapsed as u64 >= ttl.as_secs()
        } else {
            false
        }
    }
}
