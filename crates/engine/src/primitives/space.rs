//! SpaceIndex: Space lifecycle management within branches
//!
//! SpaceIndex tracks which spaces exist within each branch. Spaces are
//! organizational namespaces that provide data isolation within a branch.
//!
//! ## Methods
//!
//! - `register(branch_id, space)` - Idempotent registration of a space
//! - `exists(branch_id, space)` - Check if a space exists ("default" always true)
//! - `list(branch_id)` - List all spaces (always includes "default")
//! - `delete(branch_id, space)` - Delete space metadata key only
//! - `is_empty(branch_id, space)` - Check if a space has any data
//!
//! ## Key Design
//!
//! - Space metadata is stored in the branch-level namespace (not space-scoped)
//!   to avoid circular dependency.
//! - Key format: `<branch_namespace>:<TypeTag::Space>:<space_name>`

use crate::database::Database;
use std::sync::Arc;
use strata_core::types::{BranchId, Key, Namespace, TypeTag};
use strata_core::value::Value;
use strata_core::StrataResult;

/// Space lifecycle management primitive.
///
/// SpaceIndex is a stateless facade over the Database engine, holding only
/// an `Arc<Database>` reference. It tracks which spaces exist within each
/// branch and can check whether a space contains any data.
#[derive(Clone)]
pub struct SpaceIndex {
    db: Arc<Database>,
}

impl SpaceIndex {
    /// Create a new SpaceIndex instance.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Idempotent registration of a space.
    ///
    /// Writes a metadata key for the space if it doesn't already exist.
    /// Safe to call repeatedly — only the first call writes.
    pub fn register(&self, branch_id: BranchId, space: &str) -> StrataResult<()> {
        self.db.transaction(branch_id, |txn| {
            let key = Key::new_space(branch_id, space);
            if txn.get(&key)?.is_none() {
                txn.put(key, Value::String("{}".to_string()))?;
            }
            Ok(())
        })
    }

    /// Check if a space exists.
    ///
    /// Returns `true` for "default" without hitting storage.
    pub fn exists(&self, branch_id: BranchId, space: &str) -> StrataResult<bool> {
        if space == "default" {
            return Ok(true);
        }
        self.db.transaction(branch_id, |txn| {
            let key = Key::new_space(branch_id, space);
            Ok(txn.get(&key)?.is_some())
        })
    }

    /// List all spaces in a branch.
    ///
    /// Always includes "default" in the result, even if not explicitly registered.
    pub fn list(&self, branch_id: BranchId) -> StrataResult<Vec<String>> {
        self.db.transaction(branch_id, |txn| {
            let prefix = Key::new_space_prefix(branch_id);
            let results = txn.scan_prefix(&prefix)?;

            let mut spaces: Vec<String> = results
                .into_iter()
                .filter_map(|(k, _)| String::from_utf8(k.user_key.clone()).ok())
                .collect();

            // Always include "default"
            if !spaces.contains(&"default".to_string()) {
                spaces.insert(0, "default".to_string());
            }

            Ok(spaces)
        })
    }

    /// Delete the space metadata key only.
    ///
    /// The caller is responsible for cleaning up data in the space before
    /// calling this method.
    pub fn delete(&self, branch_id: BranchId, space: &str) -> StrataResult<()> {
        self.db.transaction(branch_id, |txn| {
            let key = Key::new_space(branch_id, space);
            txn.delete(key)?;
            Ok(())
        })
    }

    /// Check if a space has any data.
    ///
    /// Scans all data TypeTags (KV, Event, State, Json, Vector) in the
    /// space's namespace to determine if any keys exist.
    pub fn is_empty(&self, branch_id: BranchId, space: &str) -> StrataResult<bool> {
        self.db.transaction(branch_id, |txn| {
            let ns = Namespace::for_branch_space(branch_id, space);

            for type_tag in [
                TypeTag::KV,
                TypeTag::Event,
                TypeTag::State,
                TypeTag::Json,
                TypeTag::Vector,
                TypeTag::VectorConfig,
            ] {
                let prefix = Key::new(ns.clone(), type_tag, vec![]);
                let entries = txn.scan_prefix(&prefix)?;
                if !entries.is_empty() {
                    return Ok(false);
                }
            }

            Ok(true)
        })
    }
}

// ========== Tests ==========
