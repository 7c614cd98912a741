//! JsonStore: JSON document storage primitive
//!
//! ## Design: STATELESS FACADE
//!
//! JsonStore holds ONLY `Arc<Database>`. No internal state, no caches,
//! no maps, no locks. All data lives in ShardedStore via Key::new_json().
//!
//! ## Branch Isolation
//!
//! All operations are scoped to a branch_id. Keys are prefixed with the
//! branch's namespace, ensuring complete isolation between branches.
//!
//! ## Thread Safety
//!
//! JsonStore is `Send + Sync` and can be safely shared across threads.
//! Multiple JsonStore instances on the same Database are safe.
//!
//! ## API
//!
//! All operations go through `db.transaction()` for consistency:
//! - `create`, `get`, `set`, `delete_at_path`, `destroy`, `list`, `exists`
//!
//! ## Architectural Rules
//!
//! This implementation follows the architectural rules:
//! 1. JSON lives in ShardedStore via Key::new_json()
//! 2. JsonStore is stateless (Arc<Database> only)
//! 3. JSON extends TransactionContext (no separate type)
//! 4. Path semantics in API layer (not storage)
//! 5. WAL remains unified (entry types 0x20-0x23)
//! 6. JSON API feels like other primitives

use crate::database::Database;
use crate::primitives::extensions::JsonStoreExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use strata_concurrency::TransactionContext;
use strata_core::contract::{Timestamp, Version, Versioned};
use strata_core::primitives::json::{
    delete_at_path, get_at_path, set_at_path, JsonLimitError, JsonPath, JsonValue,
};
use strata_core::types::{BranchId, Key, Namespace};
use strata_core::value::Value;
use strata_core::StrataError;
use strata_core::{StrataResult, VersionedHistory};

// =============================================================================
// Limit Validation Helpers
// =============================================================================

/// Convert a JsonLimitError to a StrataError
fn limit_error_to_error(e: JsonLimitError) -> StrataError {
    StrataError::invalid_input(e.to_string())
}

// =============================================================================
// JsonDoc - Internal Document Representation
// =============================================================================

/// Internal representation of a JSON document
///
/// Stored as serialized bytes in ShardedStore.
/// Version is used for optimistic concurrency control.
///
/// # Design
///
/// - **Document-level versioning**: Single version for entire document
/// - **Timestamps**: Track creation and modification times
/// - **Serializable**: Uses MessagePack for efficient storage
///
/// # Example
///
/// ```rust,ignore
/// use strata_engine::JsonDoc;
/// use strata_core::primitives::json::JsonValue;
///
/// let doc = JsonDoc::new("my-document", JsonValue::from(42i64));
/// assert_eq!(doc.version, 1);
/// assert_eq!(doc.id, "my-document");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDoc {
    /// Document unique identifier (user-provided string key)
    pub id: String,
    /// The JSON value (root of document)
    pub value: JsonValue,
    /// Document version (increments on any change)
    pub version: u64,
    /// Creation timestamp (microseconds since epoch)
    pub created_at: u64,
    /// Last modification timestamp (microseconds since epoch)
    pub updated_at: u64,
}

/// Result of listing JSON documents
///
/// Contains document IDs and an optional cursor for pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonListResult {
    /// Document IDs returned (user-provided string keys)
    pub doc_ids: Vec<String>,
    /// Cursor for next page, if more results exist
    pub next_cursor: Option<String>,
}

impl JsonDoc {
    /// Create a new document with initial value
    ///
    /// Initializes version to 1 and sets timestamps to current time.
    pub fn new(id: impl Into<String>, value: JsonValue) -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_micros() as u64;

        JsonDoc {
            id: id.into(),
            value,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Increment version and update timestamp
    ///
    /// Call this after any modification to the document.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_micros() as u64;
    }
}

/// JSON document storage primitive
///
/// STATELESS FACADE over Database - all state lives in unified ShardedStore.
/// Multiple JsonStore instances on same Database are safe.
///
/// # Design
///
/// JsonStore does NOT own storage. It is a facade that:
/// - Uses `Arc<Database>` for all operations
/// - Stores documents via `Key::new_json()` in ShardedStore
/// - Uses SnapshotView for fast path reads
/// - Participates in cross-primitive transactions
///
/// # Example
///
/// ```ignore
/// use strata_primitives::JsonStore;
/// use crate::database::Database;
/// use strata_core::types::BranchId;
/// use strata_core::primitives::json::JsonValue;
///
/// let db = Database::cache()?;
/// let json = JsonStore::new(db);
/// let branch_id = BranchId::new();
///
/// // Create and read document
/// json.create(&branch_id, "my-doc", JsonValue::object())?;
/// let value = json.get(&branch_id, "my-doc", &JsonPath::root())?;
/// ```
#[derive(Clone)]
pub struct JsonStore {
    db: Arc<Database>, // ONLY state: reference to database
}

impl JsonStore {
    /// Create new JsonStore instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the underlying database reference
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Build namespace for branch-scoped operations
    fn namespace_for_branch(&self, branch_id: &BranchId) -> Namespace {
        Namespace::for_branch(*branch_id)
    }

    /// Build key for JSON document
    fn key_for(&self, branch_id: &BranchId, doc_id: &str) -> Key {
        Key::new_json(self.namespace_for_branch(branch_id), doc_id)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize document for storage
    ///
    /// Uses MessagePack for efficient binary serialization.
    pub(crate) fn serialize_doc(doc: &JsonDoc) -> StrataResult<Value> {
        let bytes =
            rmp_serde::to_vec(doc).map_err(|e| StrataError::serialization(e.to_string()))?;
        Ok(Value::Bytes(bytes))
    }

    /// Deserialize document from storage
    ///
    /// Expects Value::Bytes containing MessagePack-encoded JsonDoc.
    pub(crate) fn deserialize_doc(value: &Value) -> StrataResult<JsonDoc> {
        match value {
            Value::Bytes(bytes) => {
                rmp_serde::from_slice(bytes).map_err(|e| StrataError::serialization(e.to_string()))
            }
            _ => Err(StrataError::invalid_input("expected bytes for JsonDoc")),
        }
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// Create a new JSON document
    ///
    /// Creates a new document with version 1. Fails if a document with
    /// the same ID already exists.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `doc_id` - Unique document identifier
    /// * `value` - Initial JSON value for the document
    ///
    /// # Returns
    ///
    /// * `Ok(Version)` - Document created with version
    /// * `Err(InvalidOperation)` - Document already exists
    ///
    /// # Example
    ///
    /// ```ignore
    /// let version = json.create(&branch_id, &doc_id, JsonValue::object())?;
    /// assert_eq!(version, Version::counter(1));
    /// ```
    pub fn create(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        value: JsonValue,
    ) -> StrataResult<Version> {
        // Validate document limits (Issue #440)
        value.validate().map_err(limit_error_to_error)?;

        let key = self.key_for(branch_id, doc_id);
        let doc = JsonDoc::new(doc_id, value.clone());

        self.db.transaction(*branch_id, |txn| {
            // Check if document already exists
            if txn.get(&key)?.is_some() {
                return Err(StrataError::invalid_input(format!(
                    "JSON document {} already exists",
                    doc_id
                )));
            }

            let serialized = Self::serialize_doc(&doc)?;
            txn.put(key.clone(), serialized)?;
            Ok(Version::counter(doc.version))
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get value at path in a document.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `doc_id` - Document to read from
    /// * `path` - Path within the document (use JsonPath::root() for whole doc)
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - Value at path
    /// * `Ok(None)` - Document doesn't exist or path not found
    /// * `Err` - On deserialization error
    ///
    /// Use `getv()` to access version metadata and history.
    pub fn get(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        path: &JsonPath,
    ) -> StrataResult<Option<JsonValue>> {
        // Validate path limits (Issue #440)
        path.validate().map_err(limit_error_to_error)?;

        let key = self.key_for(branch_id, doc_id);

        self.db.transaction(*branch_id, |txn| match txn.get(&key)? {
            Some(value) => {
                let doc = Self::deserialize_doc(&value)?;
                Ok(get_at_path(&doc.value, path).cloned())
            }
            None => Ok(None),
        })
    }

    /// Get value at path in a document, with version metadata.
    ///
    /// Reads directly from the committed store (non-transactional) to
    /// retrieve the document value together with its version and timestamp.
    /// Returns `None` if the document doesn't exist or path not found.
    pub fn get_versioned(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        path: &JsonPath,
    ) -> StrataResult<Option<Versioned<JsonValue>>> {
        use strata_core::contract::Versioned;

        let key = self.key_for(branch_id, doc_id);
        use strata_core::Storage;
        match self.db.storage().get(&key)? {
            Some(vv) => {
                let doc = Self::deserialize_doc(&vv.value)?;
                match get_at_path(&doc.value, path).cloned() {
                    Some(json_val) => Ok(Some(Versioned::with_timestamp(
                        json_val,
                        strata_core::contract::Version::counter(doc.version),
                        strata_core::contract::Timestamp::from_micros(doc.updated_at),
                    ))),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Get full version history for a JSON document.
    ///
    /// Returns `None` if the document doesn't exist. Index with `[0]` = latest,
    /// `[1]` = previous, etc. Reads directly from storage (non-transactional).
    ///
    /// History is per-document (not per-path). To inspect a path within a
    /// specific version, index into the result and navigate the `JsonValue`.
    pub fn getv(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
    ) -> StrataResult<Option<VersionedHistory<JsonValue>>> {
        let key = self.key_for(branch_id, doc_id);
        let history = self.db.get_history(&key, None, None)?;
        let versions: Vec<Versioned<JsonValue>> = history
            .iter()
            .filter_map(|vv| {
                let doc = Self::deserialize_doc(&vv.value).ok()?;
                Some(Versioned::with_timestamp(
                    doc.value,
                    Version::counter(doc.version),
                    Timestamp::from_micros(doc.updated_at),
                ))
            })
            .collect();
        Ok(VersionedHistory::new(versions))
    }

    /// Set value at path, creating the document if it doesn't exist.
    ///
    /// Combines exists-check, create, and set into a single atomic transaction,
    /// producing exactly 1 WAL append regardless of whether the document exists.
    ///
    /// - If doc doesn't exist and path is root: creates document with value
    /// - If doc doesn't exist and path is non-root: creates with empty object, sets at path
    /// - If doc exists: sets value at path
    pub fn set_or_create(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        path: &JsonPath,
        value: JsonValue,
    ) -> StrataResult<Version> {
        path.validate().map_err(limit_error_to_error)?;
        value.validate().map_err(limit_error_to_error)?;

        let key = self.key_for(branch_id, doc_id);

        self.db.transaction(*branch_id, |txn| {
            match txn.get(&key)? {
                Some(stored) => {
                    // Document exists — set at path
                    let mut doc = Self::deserialize_doc(&stored)?;
                    set_at_path(&mut doc.value, path, value)
                        .map_err(|e| StrataError::invalid_input(format!("Path error: {}", e)))?;
                    doc.touch();
                    let serialized = Self::serialize_doc(&doc)?;
                    txn.put(key.clone(), serialized)?;
                    Ok(Version::counter(doc.version))
                }
                None => {
                    // Document doesn't exist — create with value at path
                    let initial = if path.is_root() {
                        value
                    } else {
                        let mut obj = JsonValue::object();
                        set_at_path(&mut obj, path, value)
                            .map_err(|e| StrataError::invalid_input(format!("Path error: {}", e)))?;
                        obj
                    };
                    let doc = JsonDoc::new(doc_id, initial);
                    let serialized = Self::serialize_doc(&doc)?;
                    txn.put(key.clone(), serialized)?;
                    Ok(Version::counter(doc.version))
                }
            }
        })
    }

    /// Check if document exists.
    pub fn exists(&self, branch_id: &BranchId, doc_id: &str) -> StrataResult<bool> {
        let key = self.key_for(branch_id, doc_id);
        self.db
            .transaction(*branch_id, |txn| Ok(txn.get(&key)?.is_some()))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Set value at path in a document
    ///
    /// Uses transaction for atomic read-modify-write.
    /// Increments document version on success.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `doc_id` - Document to modify
    /// * `path` - Path to set value at (creates intermediate objects/arrays)
    /// * `value` - New value to set
    ///
    /// # Returns
    ///
    /// * `Ok(Version)` - New document version after modification
    /// * `Err(InvalidOperation)` - Document doesn't exist
    /// * `Err` - On path error or serialization error
    pub fn set(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        path: &JsonPath,
        value: JsonValue,
    ) -> StrataResult<Version> {
        // Validate path and value limits (Issue #440)
        path.validate().map_err(limit_error_to_error)?;
        value.validate().map_err(limit_error_to_error)?;

        let key = self.key_for(branch_id, doc_id);

        self.db.transaction(*branch_id, |txn| {
            // Load existing document
            let stored = txn.get(&key)?.ok_or_else(|| {
                StrataError::invalid_input(format!("JSON document {} not found", doc_id))
            })?;
            let mut doc = Self::deserialize_doc(&stored)?;

            // Apply mutation
            set_at_path(&mut doc.value, path, value)
                .map_err(|e| StrataError::invalid_input(format!("Path error: {}", e)))?;
            doc.touch();

            // Store updated document
            let serialized = Self::serialize_doc(&doc)?;
            txn.put(key.clone(), serialized)?;

            Ok(Version::counter(doc.version))
        })
    }

    /// Delete value at path in a document
    ///
    /// Uses transaction for atomic read-modify-write.
    /// Increments document version on success.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `doc_id` - Document to modify
    /// * `path` - Path to delete (must not be root)
    ///
    /// # Returns
    ///
    /// * `Ok(Version)` - New document version after deletion
    /// * `Err(InvalidOperation)` - Document doesn't exist or path error
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Remove a field from an object
    /// json.delete_at_path(&branch_id, &doc_id, &"user.temp".parse().unwrap())?;
    /// ```
    pub fn delete_at_path(
        &self,
        branch_id: &BranchId,
        doc_id: &str,
        path: &JsonPath,
    ) -> StrataResult<Version> {
        // Validate path limits (Issue #440)
        path.validate().map_err(limit_error_to_error)?;

        let key = self.key_for(branch_id, doc_id);

        self.db.transaction(*branch_id, |txn| {
            // Load existing document
            let stored = txn.get(&key)?.ok_or_else(|| {
                StrataError::invalid_input(format!("JSON document {} not found", doc_id))
            })?;
            let mut doc = Self::deserialize_doc(&stored)?;

            // Apply deletion
            delete_at_path(&mut doc.value, path)
                .map_err(|e| StrataError::invalid_input(format!("Path error: {}", e)))?;
            doc.touch();

            // Store updated document
            let serialized = Self::serialize_doc(&doc)?;
            txn.put(key.clone(), serialized)?;

            Ok(Version::counter(doc.version))
        })
    }

    /// Destroy (delete) an entire document
    ///
    /// Removes the document from storage. This operation is final.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `doc_id` - Document to destroy
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Document existed and was destroyed
    /// * `Ok(false)` - Document did not exist
    ///
    /// # Example
    ///
    /// ```ignore
    /// let existed = json.destroy(&branch_id, &doc_id)?;
    /// assert!(existed);
    /// ```
    pub fn destroy(&self, branch_id: &BranchId, doc_id: &str) -> StrataResult<bool> {
        let key = self.key_for(branch_id, doc_id);

        self.db.transaction(*branch_id, |txn| {
            // Check if document exists
            if txn.get(&key)?.is_none() {
                return Ok(false);
            }

            // Delete the document
            txn.delete(key.clone())?;
            Ok(true)
        })
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// List documents in the store with cursor-based pagination
    ///
    /// Supports Primitive Contract Invariant 6: Introspectable.
    /// Returns document IDs for a branch, optionally filtered by prefix.
    ///
    /// # Arguments
    ///
    /// * `branch_id` - BranchId for namespace isolation
    /// * `prefix` - Optional prefix to filter document IDs (compared as strings)
    /// * `cursor` - Resume pagination from this cursor (doc_id to start after)
    /// * `limit` - Maximum number of results to return
    ///
    /// # Returns
    ///
    /// * `Ok(JsonListResult)` - Document IDs and optional next cursor
    ///
    /// # Example
    ///
    /// ```ignore
    /// // List first 10 documents
    /// let result = json.list(&branch_id, None, None, 10)?;
    ///
    /// // List documents with prefix "user:"
    /// let result = json.list(&branch_id, Some("user:"), None, 10)?;
    ///
    /// // Paginate through results
    /// let page1 = json.list(&branch_id, None, None, 10)?;
    /// if let Some(cursor) = page1.next_cursor {
    ///     let page2 = json.list(&branch_id, None, Some(&cursor), 10)?;
    /// }
    /// ```
    pub fn list(
        &self,
        branch_id: &BranchId,
        prefix: Option<&str>,
        cursor: Option<&str>,
        limit: usize,
    ) -> StrataResult<JsonListResult> {
        let ns = self.namespace_for_branch(branch_id);
        let scan_prefix = Key::new_json_prefix(ns);

        self.db.transaction(*branch_id, |txn| {
            let mut doc_ids = Vec::with_capacity(limit + 1);

            // Cursor is now a simple string key (no UUID parsing needed)
            let cursor_doc_id: Option<&str> = cursor;

            let mut past_cursor = cursor_doc_id.is_none();

            for (_key, value) in txn.scan_prefix(&scan_prefix)? {
                // Deserialize to get doc_id
                let doc = match Self::deserialize_doc(&value) {
                    Ok(d) => d,
                    Err(_) => continue, // Skip invalid documents
                };

                // Handle cursor: skip until we're past the cursor
                if !past_cursor {
                    if cursor_doc_id == Some(doc.id.as_str()) {
                        past_cursor = true;
                    }
                    continue;
                }

                // Apply prefix filter if specified
                if let Some(p) = prefix {
                    if !doc.id.starts_with(p) {
                        continue;
                    }
                }

                doc_ids.push(doc.id);

                // Collect limit + 1 to detect if there are more
                if doc_ids.len() > limit {
                    break;
                }
            }

            // If we have more than limit, pop the last and use it as cursor
            let next_cursor = if doc_ids.len() > limit {
                doc_ids.pop(); // Remove the extra item
                doc_ids.last().cloned()
            } else {
                None
            };

            Ok(JsonListResult {
                doc_ids,
                next_cursor,
            })
        })
    }
}

// ========== Searchable Trait Implementation ==========

impl crate::search::Searchable for JsonStore {
    fn search(
        &self,
        _req: &crate::SearchRequest,
    ) -> strata_core::StrataResult<crate::SearchResponse> {
        // Search is handled by the intelligence layer, not the primitive
        Ok(crate::SearchResponse::empty())
    }

    fn primitive_kind(&self) -> strata_core::PrimitiveType {
        strata_core::PrimitiveType::Json
    }
}

// =============================================================================
// JsonStoreExt Implementation
// =============================================================================
//
// Extension trait implementation for cross-primitive transactions.
// Allows JSON operations within a TransactionContext.

impl JsonStoreExt for TransactionContext {
    fn json_get(&mut self, doc_id: &str, path: &JsonPath) -> StrataResult<Option<JsonValue>> {
        // Validate path limits (Issue #440)
        path.validate().map_err(limit_error_to_error)?;

        let key = Key::new_json(Namespace::for_branch(self.branch_id), doc_id);

        // Read from transaction context (respects read-your-writes)
        match self.get(&key)? {
            Some(value) => {
                let doc = JsonStore::deserialize_doc(&value)?;
                Ok(get_at_path(&doc.value, path).cloned())
            }
            None => Ok(None),
        }
    }

    fn json_set(
        &mut self,
        doc_id: &str,
        path: &JsonPath,
        value: JsonValue,
    ) -> StrataResult<Version> {
        // Validate path and value limits (Issue #440)
        path.validate().map_err(limit_error_to_error)?;
        value.validate().map_err(limit_error_to_error)?;

        let key = Key::new_json(Namespace::for_branch(self.branch_id), doc_id);

        // Load existing document from transaction context
        let stored = self.get(&key)?.ok_or_else(|| {
            StrataError::invalid_input(format!("JSON document {} not found", doc_id))
        })?;
        let mut doc = JsonStore::deserialize_doc(&stored)?;

        // Apply mutation
        set_at_path(&mut doc.value, path, value)
            .map_err(|e| StrataError::invalid_input(format!("Path error: {}", e)))?;
        doc.touch();

        // Store updated document in transaction write set
        let serialized = JsonStore::serialize_doc(&doc)?;
        self.put(key, serialized)?;

        Ok(Version::counter(doc.version))
    }

    fn json_create(&mut self, doc_id: &str, value: JsonValue) -> StrataResult<Version> {
        // Validate document limits (Issue #440)
        value.validate().map_err(limit_error_to_error)?;

        let key = Key::new_json(Namespace::for_branch(self.branch_id), doc_id);
        let doc = JsonDoc::new(doc_id, value);

        // Check if document already exists
        if self.get(&key)?.is_some() {
            return Err(StrataError::invalid_input(format!(
                "JSON document {} already exists",
                doc_id
            )));
        }

        // Store new document
        let serialized = JsonStore::serialize_doc(&doc)?;
        self.put(key, serialized)?;

        Ok(Version::counter(doc.version))
    }
}
