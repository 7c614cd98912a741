//! StateCell: CAS-based versioned cells for coordination
//!
//! ## Design Principles
//!
//! 1. **Versioned Updates**: Every update increments the version.
//! 2. **CAS Semantics**: Compare-and-swap ensures safe concurrent updates.
//!
//! ## API
//!
//! All operations go through `db.transaction()` for consistency:
//! - `init`, `read`, `set`, `cas`
//!
//! ## Key Design
//!
//! - TypeTag: State (0x03)
//! - Key format: `<namespace>:<TypeTag::State>:<cell_name>`

use crate::database::{Database, RetryConfig};
use crate::primitives::extensions::StateCellExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strata_concurrency::TransactionContext;
use strata_core::contract::{Version, Versioned};
use strata_core::types::{BranchId, Key, Namespace};
use strata_core::value::Value;
use strata_core::Timestamp;
use strata_core::{StrataResult, VersionedHistory};

// Re-export State from core
pub use strata_core::primitives::State;

/// Serialize a struct to Value::String for storage
fn to_stored_value<T: Serialize>(v: &T) -> StrataResult<Value> {
    serde_json::to_string(v)
        .map(Value::String)
        .map_err(|e| strata_core::StrataError::serialization(e.to_string()))
}

/// Deserialize from Value::String storage
fn from_stored_value<T: for<'de> Deserialize<'de>>(
    v: &Value,
) -> std::result::Result<T, serde_json::Error> {
    match v {
        Value::String(s) => serde_json::from_str(s),
        _ => serde_json::from_str("null"), // Will fail with appropriate error
    }
}

/// CAS-based versioned cells for coordination
///
/// ## Design
///
/// Each cell has a value and monotonically increasing version.
/// Updates via CAS ensure safe concurrent access.
///
/// ## Example
///
/// ```text
/// use strata_primitives::StateCell;
/// use strata_core::value::Value;
///
/// let sc = StateCell::new(db.clone());
/// let branch_id = BranchId::new();
///
/// // Initialize a counter
/// sc.init(&branch_id, "counter", Value::Int(0))?;
///
/// // Read current state
/// let state = sc.get(&branch_id, "counter")?.unwrap();
/// assert_eq!(state.value.version, Version::counter(1));
///
/// // CAS update (only succeeds if version matches)
/// sc.cas(&branch_id, "counter", Version::counter(1), Value::Int(1))?;
///
/// // Unconditional set
/// sc.set(&branch_id, "counter", Value::Int(10))?;
/// ```
#[derive(Clone)]
pub struct StateCell {
    db: Arc<Database>,
}

impl StateCell {
    /// Create new StateCell instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Build namespace for branch+space-scoped operations
    fn namespace_for(&self, branch_id: &BranchId, space: &str) -> Namespace {
        Namespace::for_branch_space(*branch_id, space)
    }

    /// Build key for state cell
    fn key_for(&self, branch_id: &BranchId, space: &str, name: &str) -> Key {
        Key::new_state(self.namespace_for(branch_id, space), name)
    }

    // ========== Read/Init Operations ==========

    /// Initialize a cell with a value (only if it doesn't exist)
    ///
    /// Returns the `Version` assigned to the cell.
    /// The version uses `Version::Counter` type.
    pub fn init(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
        value: Value,
    ) -> StrataResult<Version> {
        self.db.transaction(*branch_id, |txn| {
            let key = self.key_for(branch_id, space, name);

            // Idempotent: if cell already exists, return existing version
            if let Some(existing) = txn.get(&key)? {
                let state: State = from_stored_value(&existing)?;
                return Ok(state.version);
            }

            // Create new state
            let state = State::new(value);
            txn.put(key, to_stored_value(&state)?)?;
            Ok(state.version)
        })
    }

    /// Read current state value.
    ///
    /// Returns the user value, or `None` if the cell doesn't exist.
    /// Use `getv()` to access version metadata and history.
    pub fn get(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
    ) -> StrataResult<Option<Value>> {
        let key = self.key_for(branch_id, space, name);

        self.db.transaction(*branch_id, |txn| match txn.get(&key)? {
            Some(v) => {
                let state: State = from_stored_value(&v)
                    .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                Ok(Some(state.value))
            }
            None => Ok(None),
        })
    }

    /// Read current state value with version metadata.
    ///
    /// Reads directly from the committed store (non-transactional) to
    /// retrieve the user value together with its counter version and timestamp.
    /// Returns `None` if the cell doesn't exist.
    pub fn get_versioned(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
    ) -> StrataResult<Option<Versioned<Value>>> {
        let key = self.key_for(branch_id, space, name);
        use strata_core::Storage;
        match self.db.storage().get(&key)? {
            Some(vv) => {
                let state: State = from_stored_value(&vv.value)
                    .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                Ok(Some(Versioned::with_timestamp(
                    state.value,
                    state.version,
                    Timestamp::from_micros(state.updated_at),
                )))
            }
            None => Ok(None),
        }
    }

    /// Get full version history for a state cell.
    ///
    /// Returns `None` if the cell doesn't exist. Index with `[0]` = latest,
    /// `[1]` = previous, etc. Reads directly from storage (non-transactional).
    ///
    /// Returns `VersionedHistory<Value>` â€” the internal `State` wrapper is
    /// unwrapped so callers see the user value with storage-layer version/timestamp.
    pub fn getv(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
    ) -> StrataResult<Option<VersionedHistory<Value>>> {
        let key = self.key_for(branch_id, space, name);
        let history = self.db.get_history(&key, None, None)?;
        let versions: Vec<Versioned<Value>> = history
            .iter()
            .filter_map(|vv| {
                let state: State = from_stored_value(&vv.value).ok()?;
                Some(Versioned::with_timestamp(
                    state.value,
                    state.version,
                    Timestamp::from_micros(state.updated_at),
                ))
            })
            .collect();
        Ok(VersionedHistory::new(versions))
    }

    // ========== CAS & Set Operations ==========

    /// Compare-and-swap: Update only if version matches
    ///
    /// Returns the new `Version` on success.
    /// Uses `Version::Counter` type.
    pub fn cas(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
        expected_version: Version,
        new_value: Value,
    ) -> StrataResult<Version> {
        let retry_config = RetryConfig::default()
            .with_max_retries(50)
            .with_base_delay_ms(1)
            .with_max_delay_ms(50);
        self.db
            .transaction_with_retry(*branch_id, retry_config, |txn| {
                let key = self.key_for(branch_id, space, name);

                let current: State = match txn.get(&key)? {
                    Some(v) => from_stored_value(&v)
                        .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?,
                    None => {
                        return Err(strata_core::StrataError::invalid_input(format!(
                            "StateCell '{}' not found",
                            name
                        )))
                    }
                };

                if current.version != expected_version {
                    return Err(strata_core::StrataError::conflict(format!(
                        "Version mismatch: expected {:?}, got {:?}",
                        expected_version, current.version
                    )));
                }

                let new_version = current.version.increment();
                let new_state = State {
                    value: new_value.clone(),
                    version: new_version,
                    updated_at: State::now(),
                };

                txn.put(key, to_stored_value(&new_state)?)?;
                Ok(new_state.version)
            })
    }

    /// Unconditional set (force write)
    ///
    /// Always succeeds, overwrites any existing value.
    /// Creates the cell if it doesn't exist.
    ///
    /// Returns the new `Version` assigned to the cell.
    pub fn set(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
        value: Value,
    ) -> StrataResult<Version> {
        let retry_config = RetryConfig::default()
            .with_max_retries(50)
            .with_base_delay_ms(1)
            .with_max_delay_ms(50);
        let value_for_index = value.clone();
        let result = self
            .db
            .transaction_with_retry(*branch_id, retry_config, |txn| {
                let key = self.key_for(branch_id, space, name);

                let new_version = match txn.get(&key)? {
                    Some(v) => {
                        let current: State = from_stored_value(&v)
                            .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                        current.version.increment()
                    }
                    None => Version::counter(1),
                };

                let new_state = State {
                    value: value.clone(),
                    version: new_version,
                    updated_at: State::now(),
                };

                txn.put(key, to_stored_value(&new_state)?)?;
                Ok(new_state.version)
            })?;

        // Update inverted index (zero overhead when disabled)
        let index = self.db.extension::<crate::search::InvertedIndex>()?;
        if index.is_enabled() {
            let text = format!(
                "{} {}",
                name,
                serde_json::to_string(&value_for_index).unwrap_or_default()
            );
            let entity_ref = crate::search::EntityRef::State {
                branch_id: *branch_id,
                name: name.to_string(),
            };
            index.index_document(&entity_ref, &text, None);
        }

        Ok(result)
    }

    // ========== Delete & List Operations ==========

    /// Delete a state cell.
    ///
    /// Returns `true` if the cell existed and was deleted, `false` if it didn't exist.
    pub fn delete(&self, branch_id: &BranchId, space: &str, name: &str) -> StrataResult<bool> {
        self.db.transaction(*branch_id, |txn| {
            let key = self.key_for(branch_id, space, name);
            let exists = txn.get(&key)?.is_some();
            if exists {
                txn.delete(key)?;
            }
            Ok(exists)
        })
    }

    /// List state cell names with optional prefix filter.
    ///
    /// Returns all cell names matching the prefix (or all cells if prefix is None).
    pub fn list(
        &self,
        branch_id: &BranchId,
        space: &str,
        prefix: Option<&str>,
    ) -> StrataResult<Vec<String>> {
        self.db.transaction(*branch_id, |txn| {
            let ns = self.namespace_for(branch_id, space);
            let scan_prefix = Key::new_state(ns, prefix.unwrap_or(""));

            let results = txn.scan_prefix(&scan_prefix)?;

            Ok(results
                .into_iter()
                .filter_map(|(key, _)| key.user_key_string())
                .collect())
        })
    }
    // ========== Time-Travel API ==========

    /// Get a state cell value as of a past timestamp (microseconds since epoch).
    ///
    /// Returns the value at the given timestamp, or None if the cell didn't exist then.
    /// This is a non-transactional read directly from the storage version chain.
    pub fn get_at(
        &self,
        branch_id: &BranchId,
        space: &str,
        name: &str,
        as_of_ts: u64,
    ) -> StrataResult<Option<Value>> {
        let key = self.key_for(branch_id, space, name);
        let result = self.db.get_at_timestamp(&key, as_of_ts)?;
        match result {
            Some(vv) => {
                let state: State = from_stored_value(&vv.value)
                    .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                Ok(Some(state.value))
            }
            None => Ok(None),
        }
    }

    /// List state cell names as of a past timestamp.
    pub fn list_at(
        &self,
        branch_id: &BranchId,
        space: &str,
        prefix: Option<&str>,
        as_of_ts: u64,
    ) -> StrataResult<Vec<String>> {
        let ns = self.namespace_for(branch_id, space);
        let scan_prefix = Key::new_state(ns, prefix.unwrap_or(""));
        let results = self.db.scan_prefix_at_timestamp(&scan_prefix, as_of_ts)?;
        Ok(results
            .into_iter()
            .filter_map(|(key, _)| key.user_key_string())
            .collect())
    }
}

// ========== Searchable Trait Implementation ==========

impl crate::search::Searchable for StateCell {
    fn search(
        &self,
        _req: &crate::SearchRequest,
    ) -> strata_core::StrataResult<crate::SearchResponse> {
        // StateCell does not support search in MVP
        Ok(crate::SearchResponse::empty())
    }

    fn primitive_kind(&self) -> strata_core::PrimitiveType {
        strata_core::PrimitiveType::State
    }
}

// ========== StateCellExt Implementation ==========

impl StateCellExt for TransactionContext {
    fn state_get(&mut self, name: &str) -> StrataResult<Option<Value>> {
        let ns = Namespace::for_branch(self.branch_id);
        let key = Key::new_state(ns, name);

        match self.get(&key)? {
            Some(v) => {
                let state: State = from_stored_value(&v)
                    .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                Ok(Some(state.value))
            }
            None => Ok(None),
        }
    }

    fn state_cas(
        &mut self,
        name: &str,
        expected_version: Version,
        new_value: Value,
    ) -> StrataResult<Version> {
        let ns = Namespace::for_branch(self.branch_id);
        let key = Key::new_state(ns, name);

        let current: State = match self.get(&key)? {
            Some(v) => from_stored_value(&v)
                .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?,
            None => {
                return Err(strata_core::StrataError::invalid_input(format!(
                    "StateCell '{}' not found",
                    name
                )))
            }
        };

        if current.version != expected_version {
            return Err(strata_core::StrataError::conflict(format!(
                "Version mismatch: expected {:?}, got {:?}",
                expected_version, current.version
            )));
        }

        let new_version = current.version.increment();
        let new_state = State {
            value: new_value,
            version: new_version,
            updated_at: State::now(),
        };

        self.put(key, to_stored_value(&new_state)?)?;
        Ok(new_version)
    }

    fn state_set(&mut self, name: &str, value: Value) -> StrataResult<Version> {
        let ns = Namespace::for_branch(self.branch_id);
        let key = Key::new_state(ns, name);

        let new_version = match self.get(&key)? {
            Some(v) => {
                let current: State = from_stored_value(&v)
                    .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                current.version.increment()
            }
            None => Version::counter(1),
        };

        let new_state = State {
            value,
            version: new_version,
            updated_at: State::now(),
        };

        self.put(key, to_stored_value(&new_state)?)?;
        Ok(new_version)
    }
}
