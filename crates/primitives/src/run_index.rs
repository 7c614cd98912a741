//! RunIndex: First-class run lifecycle management
//!
//! ## Design Principles
//!
//! 1. **Status Transitions**: Valid transitions are enforced (no resurrection).
//! 2. **Terminal State**: Archived is terminal - no transitions allowed.
//! 3. **Cascading Delete**: `delete_run()` removes ALL data for a run.
//!
//! ## Status Transitions
//!
//! Valid transitions:
//! - Active → Completed, Failed, Cancelled, Paused, Archived
//! - Paused → Active, Cancelled, Archived
//! - Completed → Archived
//! - Failed → Archived
//! - Cancelled → Archived
//!
//! Invalid transitions (will error):
//! - Completed → Active (no resurrection)
//! - Failed → Active (no resurrection)
//! - Archived → * (terminal state)
//!
//! ## Key Design
//!
//! - TypeTag: Run (0x05)
//! - Primary key format: `<global_namespace>:<TypeTag::Run>:<run_id>`
//! - Index key format: `<global_namespace>:<TypeTag::Run>:__idx_{type}__{value}__{run_id}`
//!
//! RunIndex uses a global namespace (not run-scoped) since it manages runs themselves.

use strata_concurrency::TransactionContext;
use strata_core::contract::{Timestamp, Version, Versioned};
use strata_core::error::{Error, Result};
use strata_core::types::{Key, Namespace, RunId, TypeTag};
use strata_core::value::Value;
use strata_durability::run_bundle::{
    filter_wal_for_run, BundleRunInfo, BundleVerifyInfo, ExportOptions, ImportedRunInfo,
    RunBundleError, RunBundleReader, RunBundleResult, RunBundleWriter, RunExportInfo,
};
use strata_durability::wal::WALEntry;
use strata_core::traits::Storage;
use strata_engine::Database;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

// ========== Global Run ID for RunIndex Operations ==========

/// Get the global RunId used for RunIndex operations
///
/// RunIndex is a global index (not scoped to any particular run),
/// so we use a nil UUID as a sentinel value.
fn global_run_id() -> RunId {
    RunId::from_bytes([0; 16])
}

/// Get the global namespace for RunIndex operations
fn global_namespace() -> Namespace {
    Namespace::for_run(global_run_id())
}

// ========== RunStatus Enum (Story #191) ==========

/// Run lifecycle status
///
/// Each run progresses through these states with enforced transitions.
/// The status determines what operations are valid on the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is currently executing
    Active,
    /// Run completed successfully
    Completed,
    /// Run failed with error
    Failed,
    /// Run was cancelled
    Cancelled,
    /// Run is paused (can resume)
    Paused,
    /// Run is archived (terminal, soft delete)
    Archived,
}

impl RunStatus {
    /// Check if this is a terminal status
    ///
    /// Only Archived is truly terminal - no transitions allowed from it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Archived)
    }

    /// Check if this is a "finished" status (completed, failed, or cancelled)
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    /// Check if transition from current to target is valid
    ///
    /// ## Valid Transitions
    /// - Active: can go anywhere
    /// - Paused: can resume (Active), cancel, or archive
    /// - Completed/Failed/Cancelled: can only archive
    /// - Archived: terminal (no transitions)
    pub fn can_transition_to(&self, target: RunStatus) -> bool {
        match (self, target) {
            // From Active: can go anywhere
            (RunStatus::Active, _) => true,

            // From Paused: can resume, cancel, or archive
            (RunStatus::Paused, RunStatus::Active) => true,
            (RunStatus::Paused, RunStatus::Cancelled) => true,
            (RunStatus::Paused, RunStatus::Archived) => true,

            // From terminal-ish states: can only archive
            (RunStatus::Completed, RunStatus::Archived) => true,
            (RunStatus::Failed, RunStatus::Archived) => true,
            (RunStatus::Cancelled, RunStatus::Archived) => true,

            // Archived is terminal - no transitions allowed
            (RunStatus::Archived, _) => false,

            // All other transitions are invalid (no resurrection)
            _ => false,
        }
    }

    /// Get the string representation for indexing
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Active => "Active",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
            RunStatus::Paused => "Paused",
            RunStatus::Archived => "Archived",
        }
    }
}

// ========== RunMetadata Struct (Story #191) ==========

/// Metadata about a run
///
/// Contains all information about a run's lifecycle,
/// relationships, and custom metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    /// User-provided name/key for the run (used for lookups)
    pub name: String,
    /// Unique run identifier (UUID) for internal use and namespacing
    pub run_id: String,
    /// Parent run name if forked
    pub parent_run: Option<String>,
    /// Current status
    pub status: RunStatus,
    /// Creation timestamp (milliseconds since epoch)
    pub created_at: i64,
    /// Last update timestamp (milliseconds since epoch)
    pub updated_at: i64,
    /// Completion timestamp (if finished)
    pub completed_at: Option<i64>,
    /// User-defined tags
    pub tags: Vec<String>,
    /// Custom metadata
    pub metadata: Value,
    /// Error message if failed
    pub error: Option<String>,
    /// Internal version counter for CAS operations
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_version() -> u64 {
    1
}

impl RunMetadata {
    /// Create new run metadata with Active status
    ///
    /// Generates a new UUID for the run_id automatically.
    pub fn new(name: &str) -> Self {
        let now = Self::now();
        let run_id = RunId::new();
        Self {
            name: name.to_string(),
            run_id: run_id.to_string(),
            parent_run: None,
            status: RunStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
            tags: vec![],
            metadata: Value::Null,
            error: None,
            version: 1,
        }
    }

    /// Wrap this metadata in a Versioned container
    pub fn into_versioned(self) -> Versioned<RunMetadata> {
        let version = self.version;
        let timestamp = self.updated_at;
        Versioned::with_timestamp(
            self,
            Version::counter(version),
            Timestamp::from_micros((timestamp * 1000) as u64),
        )
    }

    /// Increment version and update timestamp
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Self::now();
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }
}

// ========== Serialization Helpers ==========

/// Serialize a struct to Value::String for storage
fn to_stored_value<T: Serialize>(v: &T) -> Value {
    match serde_json::to_string(v) {
        Ok(s) => Value::String(s),
        Err(_) => Value::Null,
    }
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

// ========== RunIndex Core (Story #191) ==========

/// Run lifecycle management primitive
///
/// ## Design
///
/// RunIndex provides first-class run lifecycle management.
/// It is a stateless facade over the Database engine, holding only
/// an `Arc<Database>` reference.
///
/// ## Key Features
///
/// - Status transition validation (no resurrection)
/// - Cascading delete (removes ALL run data)
/// - Secondary indices (by-status, by-tag, by-parent)
/// - Soft archive vs hard delete
///
/// ## Example
///
/// ```rust,ignore
/// use strata_primitives::{RunIndex, RunStatus};
///
/// let ri = RunIndex::new(db.clone());
///
/// // Create a run
/// let meta = ri.create_run("my-run")?;
/// assert_eq!(meta.value.status, RunStatus::Active);
///
/// // Complete the run
/// let meta = ri.complete_run("my-run")?;
/// assert_eq!(meta.value.status, RunStatus::Completed);
///
/// // Archive it (soft delete)
/// let meta = ri.archive_run("my-run")?;
/// assert_eq!(meta.value.status, RunStatus::Archived);
/// ```
#[derive(Clone)]
pub struct RunIndex {
    db: Arc<Database>,
}

impl RunIndex {
    /// Create new RunIndex instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the underlying database reference
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Build key for run metadata
    fn key_for(&self, run_id: &str) -> Key {
        Key::new_run_with_id(global_namespace(), run_id)
    }

    // ========== Create & Get Operations (Story #192) ==========

    /// Create a new run
    ///
    /// Creates a run with Active status and no parent.
    pub fn create_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.create_run_with_options(run_id, None, vec![], Value::Null)
    }

    /// Create a new run with options
    ///
    /// ## Arguments
    /// - `run_id`: Unique identifier for the run
    /// - `parent_run`: Optional parent run ID (for forked runs)
    /// - `tags`: User-defined tags for filtering
    /// - `metadata`: Custom metadata
    ///
    /// ## Errors
    /// - `InvalidOperation` if run already exists
    /// - `InvalidOperation` if parent doesn't exist
    pub fn create_run_with_options(
        &self,
        run_id: &str,
        parent_run: Option<String>,
        tags: Vec<String>,
        metadata: Value,
    ) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            // Check if run already exists
            if txn.get(&key)?.is_some() {
                return Err(Error::InvalidOperation(format!(
                    "Run '{}' already exists",
                    run_id
                )));
            }

            // Validate parent exists if specified
            if let Some(ref parent_id) = parent_run {
                let parent_key = self.key_for(parent_id);
                if txn.get(&parent_key)?.is_none() {
                    return Err(Error::InvalidOperation(format!(
                        "Parent run '{}' not found",
                        parent_id
                    )));
                }
            }

            let mut run_meta = RunMetadata::new(run_id);
            run_meta.parent_run = parent_run.clone();
            run_meta.tags = tags.clone();
            run_meta.metadata = metadata;

            txn.put(key, to_stored_value(&run_meta))?;

            // Write indices
            Self::write_indices_internal(txn, &run_meta)?;

            Ok(run_meta.into_versioned())
        })
    }

    /// Get run metadata
    ///
    /// ## Returns
    /// - `Some(Versioned<metadata>)` if run exists
    /// - `None` if run doesn't exist
    pub fn get_run(&self, run_id: &str) -> Result<Option<Versioned<RunMetadata>>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);
            match txn.get(&key)? {
                Some(v) => {
                    let meta: RunMetadata = from_stored_value(&v)
                        .map_err(|e| Error::SerializationError(e.to_string()))?;
                    Ok(Some(meta.into_versioned()))
                }
                None => Ok(None),
            }
        })
    }

    /// Check if a run exists
    pub fn exists(&self, run_id: &str) -> Result<bool> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);
            Ok(txn.get(&key)?.is_some())
        })
    }

    /// List all run IDs
    pub fn list_runs(&self) -> Result<Vec<String>> {
        self.db.transaction(global_run_id(), |txn| {
            let prefix = Key::new_run_with_id(global_namespace(), "");
            let results = txn.scan_prefix(&prefix)?;

            // Filter out index keys (they contain "__idx_")
            Ok(results
                .into_iter()
                .filter_map(|(k, _)| {
                    let key_str = String::from_utf8(k.user_key.clone()).ok()?;
                    if key_str.contains("__idx_") {
                        None
                    } else {
                        Some(key_str)
                    }
                })
                .collect())
        })
    }

    /// Count all runs
    pub fn count(&self) -> Result<usize> {
        Ok(self.list_runs()?.len())
    }

    // ========== Status Update & Transitions (Story #193) ==========

    /// Update run status with transition validation
    ///
    /// ## Errors
    /// - `InvalidOperation` if run doesn't exist
    /// - `InvalidOperation` if transition is invalid
    pub fn update_status(&self, run_id: &str, new_status: RunStatus) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            let mut run_meta: RunMetadata = match txn.get(&key)? {
                Some(v) => {
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?
                }
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' not found",
                        run_id
                    )))
                }
            };

            // Validate transition
            if !run_meta.status.can_transition_to(new_status) {
                return Err(Error::InvalidOperation(format!(
                    "Invalid status transition: {:?} -> {:?}",
                    run_meta.status, new_status
                )));
            }

            let old_status = run_meta.status;
            run_meta.status = new_status;
            run_meta.touch(); // Increment version and update timestamp

            // Set completed_at for finished states
            if new_status.is_finished() {
                run_meta.completed_at = Some(run_meta.updated_at);
            }

            txn.put(key, to_stored_value(&run_meta))?;

            // Update status index
            Self::update_status_index_internal(txn, run_id, old_status, new_status)?;

            Ok(run_meta.into_versioned())
        })
    }

    /// Complete a run successfully
    pub fn complete_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.update_status(run_id, RunStatus::Completed)
    }

    /// Fail a run with error message
    pub fn fail_run(&self, run_id: &str, error: &str) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            let mut run_meta: RunMetadata = match txn.get(&key)? {
                Some(v) => {
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?
                }
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' not found",
                        run_id
                    )))
                }
            };

            if !run_meta.status.can_transition_to(RunStatus::Failed) {
                return Err(Error::InvalidOperation(format!(
                    "Invalid status transition: {:?} -> Failed",
                    run_meta.status
                )));
            }

            let old_status = run_meta.status;
            run_meta.status = RunStatus::Failed;
            run_meta.error = Some(error.to_string());
            run_meta.touch(); // Increment version and update timestamp
            run_meta.completed_at = Some(run_meta.updated_at);

            txn.put(key, to_stored_value(&run_meta))?;
            Self::update_status_index_internal(txn, run_id, old_status, RunStatus::Failed)?;

            Ok(run_meta.into_versioned())
        })
    }

    /// Pause a run
    pub fn pause_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.update_status(run_id, RunStatus::Paused)
    }

    /// Resume a paused run
    pub fn resume_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.update_status(run_id, RunStatus::Active)
    }

    /// Cancel a run
    pub fn cancel_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.update_status(run_id, RunStatus::Cancelled)
    }

    // ========== Secondary Indices (Story #194) ==========

    /// Write secondary indices for a run
    fn write_indices_internal(txn: &mut TransactionContext, meta: &RunMetadata) -> Result<()> {
        let ns = global_namespace();

        // Index by status - use name for both key suffix and value (for lookups)
        let status_key =
            Key::new_run_index(ns.clone(), "by-status", meta.status.as_str(), &meta.name);
        txn.put(status_key, Value::String(meta.name.clone()))?;

        // Index by each tag
        for tag in &meta.tags {
            let tag_key = Key::new_run_index(ns.clone(), "by-tag", tag, &meta.name);
            txn.put(tag_key, Value::String(meta.name.clone()))?;
        }

        // Index by parent
        if let Some(ref parent) = meta.parent_run {
            let parent_key = Key::new_run_index(ns.clone(), "by-parent", parent, &meta.name);
            txn.put(parent_key, Value::String(meta.name.clone()))?;
        }

        Ok(())
    }

    /// Update status index on transition
    fn update_status_index_internal(
        txn: &mut TransactionContext,
        run_id: &str,
        old_status: RunStatus,
        new_status: RunStatus,
    ) -> Result<()> {
        let ns = global_namespace();

        // Remove old status index
        let old_key = Key::new_run_index(ns.clone(), "by-status", old_status.as_str(), run_id);
        txn.delete(old_key)?;

        // Add new status index
        let new_key = Key::new_run_index(ns, "by-status", new_status.as_str(), run_id);
        txn.put(new_key, Value::String(run_id.to_string()))?;

        Ok(())
    }

    /// Query runs by status
    pub fn query_by_status(&self, status: RunStatus) -> Result<Vec<RunMetadata>> {
        let ids = self.scan_index("by-status", status.as_str())?;
        self.get_many(&ids)
    }

    /// Query runs by tag
    pub fn query_by_tag(&self, tag: &str) -> Result<Vec<RunMetadata>> {
        let ids = self.scan_index("by-tag", tag)?;
        self.get_many(&ids)
    }

    /// Get child runs
    pub fn get_child_runs(&self, parent_id: &str) -> Result<Vec<RunMetadata>> {
        let ids = self.scan_index("by-parent", parent_id)?;
        self.get_many(&ids)
    }

    /// Scan an index and return run IDs
    fn scan_index(&self, index_type: &str, index_value: &str) -> Result<Vec<String>> {
        self.db.transaction(global_run_id(), |txn| {
            let prefix = Key::new_run_index(global_namespace(), index_type, index_value, "");

            let results = txn.scan_prefix(&prefix)?;
            Ok(results
                .into_iter()
                .filter_map(|(_, v)| {
                    if let Value::String(s) = v {
                        Some(s)
                    } else {
                        None
                    }
                })
                .collect())
        })
    }

    /// Get multiple runs by IDs
    fn get_many(&self, ids: &[String]) -> Result<Vec<RunMetadata>> {
        let mut runs = Vec::new();
        for id in ids {
            if let Some(versioned) = self.get_run(id)? {
                runs.push(versioned.value);
            }
        }
        Ok(runs)
    }

    // ========== Delete & Archive Operations (Story #195) ==========

    /// Archive a run (soft delete - status change to Archived)
    ///
    /// The run metadata is preserved but marked as archived.
    /// Archived runs cannot transition to any other status.
    pub fn archive_run(&self, run_id: &str) -> Result<Versioned<RunMetadata>> {
        self.update_status(run_id, RunStatus::Archived)
    }

    /// Delete a run (HARD DELETE - removes ALL data for this run)
    ///
    /// This is a cascading delete that removes:
    /// - Run metadata
    /// - All secondary indices
    /// - All run-scoped data (KV, Events, States)
    ///
    /// USE WITH CAUTION - this is irreversible!
    pub fn delete_run(&self, run_id: &str) -> Result<()> {
        // First get the run metadata to know what indices to delete
        let run_meta = self
            .get_run(run_id)?
            .ok_or_else(|| Error::InvalidOperation(format!("Run '{}' not found", run_id)))?
            .value;

        // Use run_meta.run_id (the internal UUID) for namespace.
        // All primitives (KV, State, etc.) use the UUID for namespacing via Namespace::for_run().
        let actual_run_id = RunId::from_string(&run_meta.run_id).ok_or_else(|| {
            Error::InvalidOperation(format!("Invalid run UUID: {}", run_meta.run_id))
        })?;

        // First, delete all run-scoped data (cascading delete)
        self.delete_run_data_internal(actual_run_id)?;

        // Then delete the RunIndex metadata and indices
        self.db.transaction(global_run_id(), |txn| {
            // Delete run metadata
            let meta_key = self.key_for(run_id);
            txn.delete(meta_key)?;

            // Delete status index
            let status_key = Key::new_run_index(
                global_namespace(),
                "by-status",
                run_meta.status.as_str(),
                run_id,
            );
            txn.delete(status_key)?;

            // Delete tag indices
            for tag in &run_meta.tags {
                let tag_key = Key::new_run_index(global_namespace(), "by-tag", tag, run_id);
                txn.delete(tag_key)?;
            }

            // Delete parent index
            if let Some(ref parent) = run_meta.parent_run {
                let parent_key =
                    Key::new_run_index(global_namespace(), "by-parent", parent, run_id);
                txn.delete(parent_key)?;
            }

            Ok(())
        })
    }

    /// Internal helper to delete all run-scoped data
    ///
    /// Deletes all data for the given run from all type tags:
    /// - KV entries
    /// - Events
    /// - State cells
    /// - JSON documents
    /// - Vector entries
    fn delete_run_data_internal(&self, run_id: RunId) -> Result<()> {
        let ns = Namespace::for_run(run_id);

        // Delete data for each type tag (including deprecated Trace for backwards compatibility)
        #[allow(deprecated)]
        for type_tag in [
            TypeTag::KV,
            TypeTag::Event,
            TypeTag::State,
            TypeTag::Trace,
            TypeTag::Json,
            TypeTag::Vector,
        ] {
            self.db.transaction(run_id, |txn| {
                let prefix = Key::new(ns.clone(), type_tag, vec![]);
                let entries = txn.scan_prefix(&prefix)?;

                for (key, _) in entries {
                    txn.delete(key)?;
                }

                Ok(())
            })?;
        }

        Ok(())
    }

    /// Add tags to a run
    pub fn add_tags(&self, run_id: &str, new_tags: Vec<String>) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            let mut meta: RunMetadata = match txn.get(&key)? {
                Some(v) => {
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?
                }
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' not found",
                        run_id
                    )))
                }
            };

            // Add new tags
            let ns = global_namespace();
            for tag in &new_tags {
                if !meta.tags.contains(tag) {
                    meta.tags.push(tag.clone());

                    // Add tag index
                    let tag_key = Key::new_run_index(ns.clone(), "by-tag", tag, run_id);
                    txn.put(tag_key, Value::String(run_id.to_string()))?;
                }
            }

            meta.touch();
            txn.put(key, to_stored_value(&meta))?;

            Ok(meta.into_versioned())
        })
    }

    /// Remove tags from a run
    pub fn remove_tags(&self, run_id: &str, tags_to_remove: Vec<String>) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            let mut meta: RunMetadata = match txn.get(&key)? {
                Some(v) => {
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?
                }
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' not found",
                        run_id
                    )))
                }
            };

            // Remove tags
            let ns = global_namespace();
            for tag in &tags_to_remove {
                if let Some(pos) = meta.tags.iter().position(|t| t == tag) {
                    meta.tags.remove(pos);

                    // Remove tag index
                    let tag_key = Key::new_run_index(ns.clone(), "by-tag", tag, run_id);
                    txn.delete(tag_key)?;
                }
            }

            meta.touch();
            txn.put(key, to_stored_value(&meta))?;

            Ok(meta.into_versioned())
        })
    }

    /// Update custom metadata
    pub fn update_metadata(&self, run_id: &str, metadata: Value) -> Result<Versioned<RunMetadata>> {
        self.db.transaction(global_run_id(), |txn| {
            let key = self.key_for(run_id);

            let mut meta: RunMetadata = match txn.get(&key)? {
                Some(v) => {
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?
                }
                None => {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' not found",
                        run_id
                    )))
                }
            };

            meta.metadata = metadata;
            meta.touch();
            txn.put(key, to_stored_value(&meta))?;

            Ok(meta.into_versioned())
        })
    }

    // ========== Search API (M6) ==========

    /// Search runs
    ///
    /// Searches run ID, status, and metadata. Respects budget constraints.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use strata_core::SearchRequest;
    ///
    /// let response = run_index.search(&SearchRequest::new(run_id, "active"))?;
    /// for hit in response.hits {
    ///     println!("Found run {:?} with score {}", hit.doc_ref, hit.score);
    /// }
    /// ```
    pub fn search(
        &self,
        req: &strata_core::SearchRequest,
    ) -> strata_core::error::Result<strata_core::SearchResponse> {
        use crate::searchable::{build_search_response, SearchCandidate};
        use strata_core::search_types::DocRef;
        use strata_core::traits::SnapshotView;
        use std::time::Instant;

        let start = Instant::now();
        let snapshot = self.db.storage().create_snapshot();
        let prefix = Key::new_run_with_id(global_namespace(), "");

        let mut candidates = Vec::new();
        let mut truncated = false;

        // Scan all runs
        for (key, versioned_value) in snapshot.scan_prefix(&prefix)? {
            // Filter out index keys
            let key_str = String::from_utf8(key.user_key.clone()).unwrap_or_default();
            if key_str.contains("__idx_") {
                continue;
            }

            // Check budget constraints
            if start.elapsed().as_micros() as u64 >= req.budget.max_wall_time_micros {
                truncated = true;
                break;
            }
            if candidates.len() >= req.budget.max_candidates_per_primitive {
                truncated = true;
                break;
            }

            // Deserialize run metadata
            let meta: RunMetadata = match from_stored_value(&versioned_value.value) {
                Ok(m) => m,
                Err(_) => continue,
            };

            // Time range filter
            if let Some((start_ts, end_ts)) = req.time_range {
                if meta.created_at < start_ts as i64 || meta.created_at > end_ts as i64 {
                    continue;
                }
            }

            // Extract searchable text
            let text = self.extract_run_text(&meta);

            candidates.push(SearchCandidate::new(
                DocRef::Run {
                    run_id: strata_core::types::RunId::from_string(&meta.run_id)
                        .unwrap_or_default(),
                },
                text,
                Some(meta.created_at as u64),
            ));
        }

        Ok(build_search_response(
            candidates,
            &req.query,
            req.k,
            truncated,
            start.elapsed().as_micros() as u64,
        ))
    }

    /// Extract searchable text from a run
    fn extract_run_text(&self, meta: &RunMetadata) -> String {
        let status_str = match meta.status {
            RunStatus::Active => "active",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Paused => "paused",
            RunStatus::Archived => "archived",
        };
        let mut parts = vec![meta.run_id.clone(), status_str.to_string()];
        parts.extend(meta.tags.clone());
        if let Ok(s) = serde_json::to_string(&meta.metadata) {
            parts.push(s);
        }
        parts.join(" ")
    }

    // ========== RunBundle Export API ==========

    /// Export a terminal run as a portable bundle
    ///
    /// Exports the run to a `.runbundle.tar.zst` archive containing:
    /// - `MANIFEST.json`: Bundle metadata and checksums
    /// - `RUN.json`: Run metadata (state, tags, error)
    /// - `WAL.runlog`: Run-scoped WAL entries
    ///
    /// ## Terminal States
    ///
    /// Only runs in terminal states can be exported:
    /// - Completed
    /// - Failed
    /// - Cancelled
    /// - Archived
    ///
    /// ## Example
    ///
    /// ```ignore
    /// let run_index = RunIndex::new(db.clone());
    ///
    /// // Complete the run first
    /// run_index.complete_run("my-run")?;
    ///
    /// // Export to bundle
    /// let info = run_index.export_run("my-run", Path::new("./my-run.runbundle.tar.zst"))?;
    /// println!("Exported {} WAL entries", info.wal_entry_count);
    /// ```
    ///
    /// ## Errors
    ///
    /// - `RunNotFound`: Run doesn't exist
    /// - `NotTerminal`: Run is not in a terminal state (Active or Paused)
    pub fn export_run(&self, run_id: &str, path: &Path) -> RunBundleResult<RunExportInfo> {
        self.export_run_with_options(run_id, path, &ExportOptions::default())
    }

    /// Export a run with custom options
    ///
    /// Same as [`export_run`](Self::export_run) but with configurable options
    /// like compression level.
    pub fn export_run_with_options(
        &self,
        run_id: &str,
        path: &Path,
        options: &ExportOptions,
    ) -> RunBundleResult<RunExportInfo> {
        // 1. Get run metadata and verify terminal state
        let run_meta = self
            .get_run(run_id)
            .map_err(|e| RunBundleError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
            .ok_or_else(|| RunBundleError::RunNotFound(run_id.to_string()))?;

        // Check terminal state (Completed, Failed, Cancelled, Archived)
        if !is_exportable_status(&run_meta.value.status) {
            return Err(RunBundleError::NotTerminal(
                run_meta.value.status.as_str().to_string(),
            ));
        }

        // 2. Get WAL entries for this run
        let run_uuid = RunId::from_string(&run_meta.value.run_id).ok_or_else(|| {
            RunBundleError::InvalidBundle(format!("Invalid run UUID: {}", run_meta.value.run_id))
        })?;

        let wal_entries = self.get_wal_entries_for_run(&run_uuid)?;

        // 3. Build bundle components
        let run_info = metadata_to_bundle_run_info(&run_meta.value);

        // 4. Write bundle using RunBundleWriter
        let writer = RunBundleWriter::new(options);
        writer.write(&run_info, &wal_entries, path)
    }

    /// Get all WAL entries for a specific run
    fn get_wal_entries_for_run(&self, run_id: &RunId) -> RunBundleResult<Vec<WALEntry>> {
        // Lock WAL and read all entries
        let wal = self.db.wal();
        let wal_guard = wal.lock();

        let all_entries = wal_guard.read_all().map_err(|e| {
            RunBundleError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to read WAL: {}", e),
            ))
        })?;

        // Filter entries for this run
        Ok(filter_wal_for_run(&all_entries, run_id))
    }

    // ========== RunBundle Import API ==========

    /// Import a run from a bundle into this database
    ///
    /// Imports a previously exported run from a `.runbundle.tar.zst` archive.
    /// The bundle's WAL entries are replayed to restore the run's state.
    ///
    /// ## MVP Constraints
    ///
    /// - Fails if a run with the same ID already exists
    /// - Use only with fresh/empty databases for now
    /// - No conflict resolution (post-MVP feature)
    ///
    /// ## Example
    ///
    /// ```ignore
    /// let run_index = RunIndex::new(db.clone());
    ///
    /// // Import from bundle
    /// let info = run_index.import_run(Path::new("./my-run.runbundle.tar.zst"))?;
    /// println!("Imported run {} with {} WAL entries", info.run_id, info.wal_entries_replayed);
    ///
    /// // Verify the run exists
    /// let meta = run_index.get_run(&info.run_id)?;
    /// assert_eq!(meta.value.status, RunStatus::Completed);
    /// ```
    ///
    /// ## Errors
    ///
    /// - `InvalidBundle`: Bundle format is invalid or corrupted
    /// - `ChecksumMismatch`: Bundle checksums don't match
    /// - `RunAlreadyExists`: A run with the same ID already exists
    /// - `WalReplay`: Error replaying WAL entries
    pub fn import_run(&self, path: &Path) -> RunBundleResult<ImportedRunInfo> {
        // 1. Validate bundle and read contents
        let _verify_info = RunBundleReader::validate(path)?;
        let run_info = RunBundleReader::read_run_info(path)?;
        let wal_entries = RunBundleReader::read_wal_entries(path)?;

        // 2. Check run doesn't already exist (MVP: fail on conflict)
        if self.exists(&run_info.name).map_err(|e| {
            RunBundleError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))
        })? {
            return Err(RunBundleError::RunAlreadyExists(run_info.run_id.clone()));
        }

        // 3. Apply WAL entries to storage and WAL
        let entries_replayed = self.replay_imported_entries(&wal_entries)?;

        // 4. Create run metadata in RunIndex
        self.create_imported_run(&run_info)?;

        Ok(ImportedRunInfo {
            run_id: run_info.run_id,
            wal_entries_replayed: entries_replayed,
        })
    }

    // ========== RunBundle Verification API ==========

    /// Verify a bundle's integrity without importing
    ///
    /// Validates that a `.runbundle.tar.zst` archive is well-formed and intact
    /// without actually importing the run. Use this to check bundles before
    /// importing, or to verify bundles after copying/transferring them.
    ///
    /// ## Validation Checks
    ///
    /// - Archive can be decompressed
    /// - Required files exist (MANIFEST.json, RUN.json, WAL.runlog)
    /// - Format version is supported
    /// - Checksums match manifest
    /// - WAL.runlog header is valid
    ///
    /// ## Example
    ///
    /// ```ignore
    /// let run_index = RunIndex::new(db.clone());
    ///
    /// // Verify before importing
    /// let verify_info = run_index.verify_bundle(Path::new("./my-run.runbundle.tar.zst"))?;
    /// println!("Bundle contains run {} with {} WAL entries",
    ///     verify_info.run_id, verify_info.wal_entry_count);
    ///
    /// if verify_info.checksums_valid {
    ///     // Safe to import
    ///     run_index.import_run(Path::new("./my-run.runbundle.tar.zst"))?;
    /// }
    /// ```
    ///
    /// ## Errors
    ///
    /// - `InvalidBundle`: Bundle format is invalid or corrupted
    /// - `MissingFile`: Required file is missing from archive
    /// - `UnsupportedVersion`: Bundle was created with an incompatible version
    /// - `ChecksumMismatch`: File checksums don't match (returned in result, not as error)
    pub fn verify_bundle(&self, path: &Path) -> RunBundleResult<BundleVerifyInfo> {
        RunBundleReader::validate(path)
    }

    /// Replay imported WAL entries to storage and WAL
    fn replay_imported_entries(&self, entries: &[WALEntry]) -> RunBundleResult<u64> {
        let storage = self.db.storage();
        let wal = self.db.wal();

        let mut entries_applied = 0u64;

        // Group entries by transaction for proper replay
        // For MVP, we apply all committed transactions
        let mut current_txn: Option<(u64, RunId, Vec<WALEntry>)> = None;
        let mut committed_txns: Vec<(u64, RunId, Vec<WALEntry>)> = Vec::new();

        for entry in entries {
            match entry {
                WALEntry::BeginTxn { txn_id, run_id, .. } => {
                    // Start a new transaction
                    current_txn = Some((*txn_id, *run_id, Vec::new()));
                }
                WALEntry::CommitTxn { txn_id, run_id } => {
                    // Commit current transaction
                    if let Some((tid, rid, txn_entries)) = current_txn.take() {
                        if tid == *txn_id && rid == *run_id {
                            committed_txns.push((tid, rid, txn_entries));
                        }
                    }
                }
                WALEntry::AbortTxn { .. } => {
                    // Discard current transaction
                    current_txn = None;
                }
                WALEntry::Checkpoint { .. } => {
                    // Skip checkpoints during import
                }
                _ => {
                    // Add entry to current transaction
                    if let Some((_, _, ref mut txn_entries)) = current_txn {
                        txn_entries.push(entry.clone());
                    }
                }
            }
        }

        // Lock WAL for writing
        let mut wal_guard = wal.lock();

        // Apply each committed transaction
        for (_txn_id, _run_id, txn_entries) in committed_txns {
            for entry in &txn_entries {
                // Apply to storage
                match entry {
                    WALEntry::Write { key, value, version, .. } => {
                        storage
                            .put_with_version(key.clone(), value.clone(), *version, None)
                            .map_err(|e| {
                                RunBundleError::WalReplay(format!("Write failed: {}", e))
                            })?;
                        entries_applied += 1;
                    }
                    WALEntry::Delete { key, version, .. } => {
                        storage.delete_with_version(key, *version).map_err(|e| {
                            RunBundleError::WalReplay(format!("Delete failed: {}", e))
                        })?;
                        entries_applied += 1;
                    }
                    WALEntry::JsonCreate { run_id, doc_id, value_bytes, version, .. } => {
                        // For JSON, create the key and store
                        let key = Key::new_json(
                            Namespace::for_run(*run_id),
                            doc_id,
                        );
                        // Decode msgpack value
                        let json_value: serde_json::Value = rmp_serde::from_slice(value_bytes)
                            .unwrap_or(serde_json::Value::Null);
                        let core_value = json_to_value(&json_value);
                        storage
                            .put_with_version(key, core_value, *version, None)
                            .map_err(|e| {
                                RunBundleError::WalReplay(format!("JsonCreate failed: {}", e))
                            })?;
                        entries_applied += 1;
                    }
                    WALEntry::JsonSet { run_id, doc_id, value_bytes, version, .. } => {
                        let key = Key::new_json(
                            Namespace::for_run(*run_id),
                            doc_id,
                        );
                        let json_value: serde_json::Value = rmp_serde::from_slice(value_bytes)
                            .unwrap_or(serde_json::Value::Null);
                        let core_value = json_to_value(&json_value);
                        storage
                            .put_with_version(key, core_value, *version, None)
                            .map_err(|e| {
                                RunBundleError::WalReplay(format!("JsonSet failed: {}", e))
                            })?;
                        entries_applied += 1;
                    }
                    WALEntry::JsonDelete { run_id, doc_id, version, .. } => {
                        let key = Key::new_json(
                            Namespace::for_run(*run_id),
                            doc_id,
                        );
                        storage.delete_with_version(&key, *version).map_err(|e| {
                            RunBundleError::WalReplay(format!("JsonDelete failed: {}", e))
                        })?;
                        entries_applied += 1;
                    }
                    WALEntry::JsonDestroy { run_id, doc_id } => {
                        let key = Key::new_json(
                            Namespace::for_run(*run_id),
                            doc_id,
                        );
                        // Use version 0 for destroy - it's a deletion without version
                        storage.delete_with_version(&key, 0).map_err(|e| {
                            RunBundleError::WalReplay(format!("JsonDestroy failed: {}", e))
                        })?;
                        entries_applied += 1;
                    }
                    // Vector operations - skip for MVP (complex in-memory state)
                    WALEntry::VectorCollectionCreate { .. } |
                    WALEntry::VectorCollectionDelete { .. } |
                    WALEntry::VectorUpsert { .. } |
                    WALEntry::VectorDelete { .. } => {
                        // Vector operations require rebuilding in-memory indices
                        // Skip for MVP - vectors need special handling
                        entries_applied += 1;
                    }
                    _ => {}
                }

                // Also write to WAL for durability
                wal_guard.append(entry).map_err(|e| {
                    RunBundleError::WalReplay(format!("WAL append failed: {}", e))
                })?;
            }
        }

        // Flush WAL
        wal_guard.flush().map_err(|e| {
            RunBundleError::WalReplay(format!("WAL flush failed: {}", e))
        })?;

        Ok(entries_applied)
    }

    /// Create run metadata from imported bundle info
    ///
    /// This directly creates the RunMetadata with the original run_id from the bundle,
    /// preserving identity across export/import.
    fn create_imported_run(&self, info: &BundleRunInfo) -> RunBundleResult<()> {
        // Convert state to RunStatus
        let status = match info.state.as_str() {
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "archived" => RunStatus::Archived,
            _ => RunStatus::Completed,
        };

        // Convert serde_json::Value metadata to core::Value
        let metadata = json_to_value(&info.metadata);

        // Create RunMetadata directly with the original run_id from bundle
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        let run_meta = RunMetadata {
            name: info.name.clone(),
            run_id: info.run_id.clone(), // Preserve original run_id!
            parent_run: info.parent_run_id.clone(),
            status,
            created_at: now, // Use current time for imported run
            updated_at: now,
            completed_at: Some(now), // Terminal runs have completed_at
            tags: info.tags.clone(),
            metadata,
            error: info.error.clone(),
            version: 1,
        };

        // Store the run metadata directly
        self.db
            .transaction(global_run_id(), |txn| {
                let key = self.key_for(&info.name);

                // Double-check run doesn't exist
                if txn.get(&key)?.is_some() {
                    return Err(Error::InvalidOperation(format!(
                        "Run '{}' already exists",
                        info.name
                    )));
                }

                txn.put(key, to_stored_value(&run_meta))?;

                // Write indices
                Self::write_indices_internal(txn, &run_meta)?;

                Ok(())
            })
            .map_err(|e| RunBundleError::WalReplay(format!("Failed to create run: {}", e)))?;

        Ok(())
    }
}

/// Check if a run status is exportable (terminal)
fn is_exportable_status(status: &RunStatus) -> bool {
    matches!(
        status,
        RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Archived
    )
}

/// Convert RunMetadata to BundleRunInfo for export
fn metadata_to_bundle_run_info(meta: &RunMetadata) -> BundleRunInfo {
    let state_str = match meta.status {
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
        RunStatus::Cancelled => "cancelled",
        RunStatus::Archived => "archived",
        RunStatus::Active => "active",     // Should not happen for export
        RunStatus::Paused => "paused",     // Should not happen for export
    };

    // Convert timestamps from millis to ISO 8601
    let created_at = format_timestamp_iso8601(meta.created_at);
    let closed_at = meta
        .completed_at
        .map(format_timestamp_iso8601)
        .unwrap_or_else(|| created_at.clone());

    // Convert metadata from core::Value to serde_json::Value
    let metadata_json = value_to_json(&meta.metadata);

    BundleRunInfo {
        run_id: meta.run_id.clone(),
        name: meta.name.clone(),
        state: state_str.to_string(),
        created_at,
        closed_at,
        parent_run_id: meta.parent_run.clone(),
        tags: meta.tags.clone(),
        metadata: metadata_json,
        error: meta.error.clone(),
    }
}

/// Format a timestamp (milliseconds since epoch) as ISO 8601
fn format_timestamp_iso8601(millis: i64) -> String {
    let secs = (millis / 1000) as u64;

    // Calculate date components
    let days = secs / 86400;
    let time_secs = secs % 86400;
    let hours = time_secs / 3600;
    let minutes = (time_secs % 3600) / 60;
    let seconds = time_secs % 60;

    // Approximate year/month/day calculation
    let years = 1970 + (days / 365);
    let day_of_year = days % 365;
    let month = (day_of_year / 30).min(11) + 1;
    let day = (day_of_year % 30) + 1;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        years, month, day, hours, minutes, seconds
    )
}

/// Convert core::Value to serde_json::Value
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::json!(*f),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => {
            // Encode bytes as base64
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(b);
            serde_json::Value::String(encoded)
        }
        Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(value_to_json).collect())
        }
        Value::Object(map) => {
            let obj: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
    }
}

/// Convert serde_json::Value to core::Value
fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Value::Array(arr.iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => {
            let obj: std::collections::HashMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect();
            Value::Object(obj)
        }
    }
}

// ========== Searchable Trait Implementation (M6) ==========

impl crate::searchable::Searchable for RunIndex {
    fn search(
        &self,
        req: &strata_core::SearchRequest,
    ) -> strata_core::error::Result<strata_core::SearchResponse> {
        self.search(req)
    }

    fn primitive_kind(&self) -> strata_core::PrimitiveType {
        strata_core::PrimitiveType::Run
    }
}

// ========== Tests ==========
