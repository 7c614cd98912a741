//! WAL Replay Logic for Recovery
//!
//! This module implements WAL replay to restore storage state from the write-ahead log.
//! It scans WAL entries, groups them by transaction ID, and applies only committed
//! transactions to storage.
//!
//! ## Replay Process
//!
//! 1. Scan WAL entries from the beginning
//! 2. Group entries by txn_id into Transaction structs
//! 3. Identify committed transactions (those with CommitTxn entry)
//! 4. Discard incomplete transactions (BeginTxn without CommitTxn - crashed mid-transaction)
//! 5. Apply committed transactions in order to storage
//! 6. Preserve version numbers from WAL (don't allocate new versions)
//!
//! ## Version Preservation
//!
//! CRITICAL: Replay must preserve the exact version numbers from WAL entries.
//! This ensures that after replay, the database state is identical to what it was
//! before the crash. We use `put_with_version()` and `delete_with_version()` to
//! bypass normal version allocation.

use crate::wal::{WALEntry, WAL};
use strata_core::StrataResult;
use strata_core::primitives::json::{delete_at_path, set_at_path, JsonValue};
use strata_core::traits::Storage;
use strata_core::types::{Key, Namespace, RunId};
use strata_core::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Statistics from WAL replay
///
/// Tracks how many transactions and operations were applied during replay,
/// useful for debugging and monitoring recovery performance.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of committed transactions that were applied
    pub txns_applied: usize,
    /// Number of Write operations applied
    pub writes_applied: usize,
    /// Number of Delete operations applied
    pub deletes_applied: usize,
    /// Final version after replay (highest version seen in WAL)
    pub final_version: u64,
    /// Maximum transaction ID seen in WAL
    ///
    /// This is critical for initializing the TransactionManager after recovery
    /// to ensure new transactions get unique IDs that don't conflict with
    /// transactions in the WAL.
    pub max_txn_id: u64,
    /// Number of incomplete transactions discarded (no CommitTxn)
    pub incomplete_txns: usize,
    /// Number of aborted transactions discarded
    pub aborted_txns: usize,
    /// Number of orphaned entries discarded (Write/Delete without BeginTxn)
    pub orphaned_entries: usize,
    /// Number of transactions skipped by filter
    pub txns_filtered: usize,
    /// Number of corrupted entries detected during WAL read
    ///
    /// When the WAL reader encounters CRC mismatches or deserialization failures,
    /// it stops reading and records the count. This helps diagnose disk corruption
    /// or partial write issues.
    pub corrupted_entries: usize,
    // JSON operations
    /// Number of JSON Create operations applied
    pub json_creates_applied: usize,
    /// Number of JSON Set operations applied
    pub json_sets_applied: usize,
    /// Number of JSON Delete operations applied
    pub json_deletes_applied: usize,
    /// Number of JSON Destroy operations applied
    pub json_destroys_applied: usize,
}

/// JSON document structure for recovery
///
/// This mirrors the JsonDoc struct in primitives but is defined here to avoid
/// circular dependencies. Uses msgpack serialization for compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecoveryJsonDoc {
    /// Document identifier (user-provided string key)
    id: String,
    /// JSON value
    value: JsonValue,
    /// Document version (increments on any change)
    version: u64,
    /// Creation timestamp (millis since epoch)
    created_at: i64,
    /// Last update timestamp (millis since epoch)
    updated_at: i64,
}

impl RecoveryJsonDoc {
    /// Create a new document with initial value
    fn new(id: impl Into<String>, value: JsonValue, version: u64, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            value,
            version,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Serialize to msgpack bytes
    fn to_bytes(&self) -> StrataResult<Vec<u8>> {
        rmp_serde::to_vec(self)
            .map_err(|e| strata_core::StrataError::serialization(e.to_string()))
    }

    /// Deserialize from msgpack bytes
    fn from_bytes(bytes: &[u8]) -> StrataResult<Self> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| strata_core::StrataError::serialization(e.to_string()))
    }
}

/// Options for WAL replay
///
/// Allows filtering and controlling replay behavior.
#[derive(Default, Clone)]
pub struct ReplayOptions {
    /// Only replay transactions for this run_id (None = all)
    pub filter_run_id: Option<RunId>,
    /// Stop replay at this version (None = replay all)
    ///
    /// Transactions with commit_version > stop_at_version will not be applied.
    pub stop_at_version: Option<u64>,
    /// Callback for progress reporting (called after each transaction)
    ///
    /// Note: Using Arc<dyn Fn> for thread-safe callback support.
    pub progress_callback: Option<std::sync::Arc<dyn Fn(ReplayProgress) + Send + Sync>>,
}

impl std::fmt::Debug for ReplayOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayOptions")
            .field("filter_run_id", &self.filter_run_id)
            .field("stop_at_version", &self.stop_at_version)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

/// Progress information during replay
///
/// Provided to progress callbacks after each transaction is processed.
#[derive(Debug, Clone)]
pub struct ReplayProgress {
    /// Transaction ID being processed
    pub current_txn_id: u64,
    /// Total transactions found so far (committed + incomplete + aborted)
    pub total_txns_found: usize,
    /// Transactions applied so far
    pub txns_applied: usize,
    /// Current max version seen
    pub current_version: u64,
    /// Whether this transaction was applied (true) or skipped (false)
    pub was_applied: bool,
}

/// Transaction state during replay
///
/// Groups WAL entries belonging to a single transaction.
/// A transaction is committed only if it has a CommitTxn entry.
#[derive(Debug)]
struct Transaction {
    /// Transaction identifier (stored for debugging via Debug trait)
    #[allow(dead_code)]
    txn_id: u64,
    /// Run this transaction belongs to (stored for debugging via Debug trait)
    #[allow(dead_code)]
    run_id: RunId,
    /// Entries in this transaction (in order)
    entries: Vec<WALEntry>,
    /// Whether this transaction was committed
    committed: bool,
    /// Whether this transaction was aborted
    aborted: bool,
}

impl Transaction {
    /// Create a new transaction from a BeginTxn entry
    fn new(txn_id: u64, run_id: RunId) -> Self {
        Self {
            txn_id,
            run_id,
            entries: Vec::new(),
            committed: false,
            aborted: false,
        }
    }
}

// ============================================================================
// Validation Types and Functions
// ============================================================================

/// Result of validating WAL entries before replay
///
/// Contains information about incomplete transactions and orphaned entries
/// that will be discarded during replay.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Transaction IDs that are incomplete (BeginTxn without CommitTxn/AbortTxn)
    pub incomplete_txns: Vec<u64>,
    /// Number of orphaned entries (Write/Delete without matching BeginTxn)
    pub orphaned_entries: usize,
    /// Warnings generated during validation
    pub warnings: Vec<ValidationWarning>,
}

/// A warning generated during WAL validation
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Index of the entry in the WAL
    pub entry_index: usize,
    /// Description of the warning
    pub message: String,
}

impl ValidationResult {
    /// Returns true if no issues were found during validation
    pub fn is_clean(&self) -> bool {
        self.incomplete_txns.is_empty() && self.orphaned_entries == 0
    }

    /// Log all warnings to the tracing subsystem
    pub fn log_warnings(&self) {
        if !self.incomplete_txns.is_empty() {
            warn!(
                count = self.incomplete_txns.len(),
                txn_ids = ?self.incomplete_txns,
                "Discarding incomplete transactions (no CommitTxn)"
            );
        }

        if self.orphaned_entries > 0 {
            warn!(
                count = self.orphaned_entries,
                "Discarding orphaned entries (Write/Delete without BeginTxn)"
            );
        }

        for warning in &self.warnings {
            warn!(
                entry_index = warning.entry_index,
                message = %warning.message,
                "Validation warning"
            );
        }
    }
}

/// Validate WAL entries before replay
///
/// Scans entries to identify:
/// - Incomplete transactions (BeginTxn without CommitTxn/AbortTxn)
/// - Orphaned entries (Write/Delete without matching BeginTxn)
/// - Duplicate BeginTxn for the same txn_id
/// - CommitTxn without BeginTxn
///
/// This validation is informational - it doesn't prevent replay but logs
/// warnings about data that will be discarded.
///
/// # Arguments
///
/// * `entries` - The WAL entries to validate
///
/// # Returns
///
/// A `ValidationResult` containing information about issues found
pub fn validate_transactions(entries: &[WALEntry]) -> ValidationResult {
    let mut result = ValidationResult::default();

    // Track which transactions we've seen
    let mut begun_txns: HashSet<u64> = HashSet::new();
    let mut committed_txns: HashSet<u64> = HashSet::new();
    let mut aborted_txns: HashSet<u64> = HashSet::new();

    // Track active transaction per run_id (for orphan detection)
    let mut active_txn_per_run: HashMap<RunId, u64> = HashMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        match entry {
            WALEntry::BeginTxn { txn_id, run_id, .. } => {
                if begun_txns.contains(txn_id) {
                    result.warnings.push(ValidationWarning {
                        entry_index: idx,
                        message: format!("Duplicate BeginTxn for txn_id {}", txn_id),
                    });
                }
                begun_txns.insert(*txn_id);
                active_txn_per_run.insert(*run_id, *txn_id);
            }
            WALEntry::Write { run_id, .. }
            | WALEntry::Delete { run_id, .. }
            | WALEntry::JsonCreate { run_id, .. }
            | WALEntry::JsonSet { run_id, .. }
            | WALEntry::JsonDelete { run_id, .. }
            | WALEntry::JsonDestroy { run_id, .. }
            // Vector operations
            | WALEntry::VectorCollectionCreate { run_id, .. }
            | WALEntry::VectorCollectionDelete { run_id, .. }
            | WALEntry::VectorUpsert { run_id, .. }
            | WALEntry::VectorDelete { run_id, .. } => {
                // Check if there's an active transaction for this run_id
                if !active_txn_per_run.contains_key(run_id) {
                    result.warnings.push(ValidationWarning {
                        entry_index: idx,
                        message: format!(
                            "Orphaned entry: no active transaction for run_id {:?}",
                            run_id
                        ),
                    });
                    result.orphaned_entries += 1;
                }
            }
            WALEntry::CommitTxn { txn_id, run_id } => {
                if !begun_txns.contains(txn_id) {
                    result.warnings.push(ValidationWarning {
                        entry_index: idx,
                        message: format!("CommitTxn without BeginTxn for txn_id {}", txn_id),
                    });
                }
                committed_txns.insert(*txn_id);
                // Clear active transaction for this run_id
                if active_txn_per_run.get(run_id) == Some(txn_id) {
                    active_txn_per_run.remove(run_id);
                }
            }
            WALEntry::AbortTxn { txn_id, run_id } => {
                if !begun_txns.contains(txn_id) {
                    result.warnings.push(ValidationWarning {
                        entry_index: idx,
                        message: format!("AbortTxn without BeginTxn for txn_id {}", txn_id),
                    });
                }
                aborted_txns.insert(*txn_id);
                // Clear active transaction for this run_id
                if active_txn_per_run.get(run_id) == Some(txn_id) {
                    active_txn_per_run.remove(run_id);
                }
            }
            WALEntry::Checkpoint { .. } => {
                // Checkpoints are always valid
            }
        }
    }

    // Find incomplete transactions (begun but neither committed nor aborted)
    for txn_id in &begun_txns {
        if !committed_txns.contains(txn_id) && !aborted_txns.contains(txn_id) {
            result.incomplete_txns.push(*txn_id);
        }
    }

    // Sort for deterministic output
    result.incomplete_txns.sort();

    result
}

/// Replay WAL entries to restore storage state
///
/// This is the main recovery function. It scans all WAL entries, groups them
/// by transaction, and applies only committed transactions to storage.
///
/// # Arguments
///
/// * `wal` - The WAL to replay from
/// * `storage` - The storage to apply transactions to (must be empty or at checkpoint)
///
/// # Returns
///
/// * `Ok(ReplayStats)` - Statistics about the replay
/// * `Err` - If reading WAL or applying transactions fails
///
/// # Example
///
/// ```ignore
/// use strata_durability::recovery::replay_wal;
/// use strata_durability::wal::{WAL, DurabilityMode};
/// use strata_storage::ShardedStore;
///
/// let wal = WAL::open("data/wal/segment.wal", DurabilityMode::default())?;
/// let storage = ShardedStore::new();
/// let stats = replay_wal(&wal, &storage)?;
/// println!("Applied {} transactions, {} writes", stats.txns_applied, stats.writes_applied);
/// ```
pub fn replay_wal<S: Storage + ?Sized>(wal: &WAL, storage: &S) -> StrataResult<ReplayStats> {
    replay_wal_with_options(wal, storage, ReplayOptions::default())
}

/// Replay WAL entries with filtering and progress options
///
/// Extended version of `replay_wal` that supports:
/// - Filtering by run_id (only replay transactions for a specific run)
/// - Stopping at a specific version
/// - Progress callbacks for monitoring replay progress
///
/// # Arguments
///
/// * `wal` - The WAL to replay from
/// * `storage` - The storage to apply transactions to
/// * `options` - Replay options for filtering and callbacks
///
/// # Returns
///
/// * `Ok(ReplayStats)` - Statistics about the replay including filtered count
/// * `Err` - If reading WAL or applying transactions fails
///
/// # Example
///
/// ```ignore
/// use strata_durability::recovery::{replay_wal_with_options, ReplayOptions};
/// use strata_durability::wal::{WAL, DurabilityMode};
/// use strata_storage::ShardedStore;
/// use std::sync::Arc;
///
/// let wal = WAL::open("data/wal/segment.wal", DurabilityMode::default())?;
/// let storage = ShardedStore::new();
///
/// let options = ReplayOptions {
///     filter_run_id: Some(my_run_id),
///     stop_at_version: Some(100),
///     progress_callback: Some(Arc::new(|progress| {
///         println!("Replayed txn {}", progress.current_txn_id);
///     })),
/// };
///
/// let stats = replay_wal_with_options(&wal, &storage, options)?;
/// println!("Applied {} transactions, filtered {}", stats.txns_applied, stats.txns_filtered);
/// ```
pub fn replay_wal_with_options<S: Storage + ?Sized>(
    wal: &WAL,
    storage: &S,
    options: ReplayOptions,
) -> StrataResult<ReplayStats> {
    // Read all entries from WAL
    let entries = wal.read_all()?;

    // Validate entries and log warnings about discarded data
    let validation = validate_transactions(&entries);
    validation.log_warnings();

    // Group entries by transaction using internal sequential IDs
    // This handles the case where txn_ids are reused across database sessions
    // (e.g., if the TransactionManager was restarted and started from 1 again)
    let mut transactions: HashMap<u64, Transaction> = HashMap::new();

    // Internal counter for unique transaction grouping
    // This ensures each BeginTxn gets a unique slot even if txn_ids are reused
    let mut internal_id_counter: u64 = 0;

    // Track the currently active transaction's internal ID for each run_id
    // Maps run_id -> internal_id of the currently active transaction
    let mut active_txn_per_run: HashMap<RunId, u64> = HashMap::new();

    // Map from (run_id, original_txn_id) to internal_id for looking up commits/aborts
    // This helps match CommitTxn/AbortTxn to the correct transaction when there are
    // duplicate txn_ids
    let mut txn_id_to_internal: HashMap<(RunId, u64), u64> = HashMap::new();

    let mut max_version: u64 = 0;
    let mut max_txn_id: u64 = 0;
    let mut orphaned_count: usize = 0;

    for entry in entries {
        // Track max version for final_version stat
        if let Some(version) = entry.version() {
            max_version = max_version.max(version);
        }

        match &entry {
            WALEntry::BeginTxn { txn_id, run_id, .. } => {
                // Track max txn_id for TransactionManager initialization
                max_txn_id = max_txn_id.max(*txn_id);

                // Allocate a new internal ID for this transaction
                internal_id_counter += 1;
                let internal_id = internal_id_counter;

                // Create the transaction with the internal ID
                transactions.insert(internal_id, Transaction::new(*txn_id, *run_id));

                // Track this as the active transaction for this run_id
                active_txn_per_run.insert(*run_id, internal_id);

                // Map (run_id, txn_id) -> internal_id for commit/abort lookup
                txn_id_to_internal.insert((*run_id, *txn_id), internal_id);
            }
            WALEntry::Write { run_id, .. }
            | WALEntry::Delete { run_id, .. }
            | WALEntry::JsonCreate { run_id, .. }
            | WALEntry::JsonSet { run_id, .. }
            | WALEntry::JsonDelete { run_id, .. }
            | WALEntry::JsonDestroy { run_id, .. }
            // Vector operations
            | WALEntry::VectorCollectionCreate { run_id, .. }
            | WALEntry::VectorCollectionDelete { run_id, .. }
            | WALEntry::VectorUpsert { run_id, .. }
            | WALEntry::VectorDelete { run_id, .. } => {
                // Add to the currently active transaction for this run_id
                if let Some(&internal_id) = active_txn_per_run.get(run_id) {
                    if let Some(txn) = transactions.get_mut(&internal_id) {
                        txn.entries.push(entry.clone());
                    }
                } else {
                    // Orphaned entry - no active transaction for this run_id
                    orphaned_count += 1;
                }
            }
            WALEntry::CommitTxn { txn_id, run_id } => {
                // Look up the internal ID for this (run_id, txn_id) pair
                if let Some(&internal_id) = txn_id_to_internal.get(&(*run_id, *txn_id)) {
                    // Mark transaction as committed
                    if let Some(txn) = transactions.get_mut(&internal_id) {
                        txn.committed = true;
                    }
                    // Clear active transaction for this run_id if it matches
                    if active_txn_per_run.get(run_id) == Some(&internal_id) {
                        active_txn_per_run.remove(run_id);
                    }
                }
            }
            WALEntry::AbortTxn { txn_id, run_id } => {
                // Look up the internal ID for this (run_id, txn_id) pair
                if let Some(&internal_id) = txn_id_to_internal.get(&(*run_id, *txn_id)) {
                    // Mark transaction as aborted
                    if let Some(txn) = transactions.get_mut(&internal_id) {
                        txn.aborted = true;
                    }
                    // Clear active transaction for this run_id if it matches
                    if active_txn_per_run.get(run_id) == Some(&internal_id) {
                        active_txn_per_run.remove(run_id);
                    }
                }
            }
            WALEntry::Checkpoint { version, .. } => {
                // Track checkpoint version
                max_version = max_version.max(*version);
            }
        }
    }

    // Apply committed transactions and collect stats
    let mut stats = ReplayStats {
        final_version: max_version,
        max_txn_id,
        ..Default::default()
    };

    // Sort transactions by txn_id to ensure deterministic replay order
    let mut txn_ids: Vec<u64> = transactions.keys().copied().collect();
    txn_ids.sort();

    let total_txns = txn_ids.len();

    for txn_id in txn_ids {
        // Safety: txn_id comes from transactions.keys(), so it must exist
        let txn = transactions
            .get(&txn_id)
            .expect("txn_id from keys() must exist in map");

        // Determine if this transaction should be applied
        let mut was_applied = false;

        if txn.committed {
            // Check run_id filter
            if let Some(filter_run_id) = &options.filter_run_id {
                if txn.run_id != *filter_run_id {
                    stats.txns_filtered += 1;
                    // Still call progress callback even for filtered transactions
                    if let Some(ref callback) = options.progress_callback {
                        callback(ReplayProgress {
                            current_txn_id: txn_id,
                            total_txns_found: total_txns,
                            txns_applied: stats.txns_applied,
                            current_version: stats.final_version,
                            was_applied: false,
                        });
                    }
                    continue;
                }
            }

            // Check stop_at_version - get max version from transaction entries
            let txn_max_version = get_transaction_max_version(txn);
            if let Some(stop_version) = options.stop_at_version {
                if txn_max_version > stop_version {
                    stats.txns_filtered += 1;
                    // Call progress callback
                    if let Some(ref callback) = options.progress_callback {
                        callback(ReplayProgress {
                            current_txn_id: txn_id,
                            total_txns_found: total_txns,
                            txns_applied: stats.txns_applied,
                            current_version: stats.final_version,
                            was_applied: false,
                        });
                    }
                    continue;
                }
            }

            // Apply the transaction
            apply_transaction(storage, txn, &mut stats)?;
            was_applied = true;
        } else if txn.aborted {
            stats.aborted_txns += 1;
        } else {
            // Incomplete transaction (no CommitTxn or AbortTxn)
            stats.incomplete_txns += 1;
        }

        // Call progress callback
        if let Some(ref callback) = options.progress_callback {
            callback(ReplayProgress {
                current_txn_id: txn_id,
                total_txns_found: total_txns,
                txns_applied: stats.txns_applied,
                current_version: stats.final_version,
                was_applied,
            });
        }
    }

    // Record orphaned entries count
    stats.orphaned_entries = orphaned_count;

    Ok(stats)
}

/// Get the maximum version from a transaction's entries
fn get_transaction_max_version(txn: &Transaction) -> u64 {
    txn.entries
        .iter()
        .filter_map(|entry| entry.version())
        .max()
        .unwrap_or(0)
}

/// Apply a committed transaction to storage
///
/// Applies all Write, Delete, and JSON operations from a transaction to storage,
/// preserving the version numbers from the WAL entries.
///
/// # Arguments
///
/// * `storage` - The storage to apply to
/// * `txn` - The committed transaction to apply
/// * `stats` - Statistics to update
///
/// # Returns
///
/// * `Ok(())` - If all operations succeeded
/// * `Err` - If any operation fails
fn apply_transaction<S: Storage + ?Sized>(
    storage: &S,
    txn: &Transaction,
    stats: &mut ReplayStats,
) -> StrataResult<()> {
    for entry in &txn.entries {
        match entry {
            WALEntry::Write {
                key,
                value,
                version,
                ..
            } => {
                // Apply write, preserving version from WAL
                storage.put_with_version(key.clone(), value.clone(), *version, None)?;
                stats.writes_applied += 1;
                stats.final_version = stats.final_version.max(*version);
            }
            WALEntry::Delete { key, version, .. } => {
                // Apply delete, preserving version from WAL
                storage.delete_with_version(key, *version)?;
                stats.deletes_applied += 1;
                stats.final_version = stats.final_version.max(*version);
            }

            // ================================================================
            // JSON Operations
            // ================================================================
            WALEntry::JsonCreate {
                run_id,
                doc_id,
                value_bytes,
                version,
                timestamp,
            } => {
                // Deserialize the JSON value from msgpack bytes
                let value: JsonValue = rmp_serde::from_slice(value_bytes).map_err(|e| {
                    strata_core::StrataError::serialization(format!(
                        "Failed to deserialize JSON value during recovery: {}",
                        e
                    ))
                })?;

                // Create the document
                // Convert Timestamp (u64 microseconds) to i64 seconds for recovery format
                let timestamp_secs = (timestamp.as_micros() / 1_000_000) as i64;
                let doc = RecoveryJsonDoc::new(doc_id.clone(), value, *version, timestamp_secs);
                let doc_bytes = doc.to_bytes()?;

                // Store using JSON key
                let key = Key::new_json(Namespace::for_run(*run_id), doc_id);
                storage.put_with_version(key, Value::Bytes(doc_bytes), *version, None)?;

                stats.json_creates_applied += 1;
                stats.final_version = stats.final_version.max(*version);
            }

            WALEntry::JsonSet {
                run_id,
                doc_id,
                path,
                value_bytes,
                version,
            } => {
                let key = Key::new_json(Namespace::for_run(*run_id), doc_id);

                // Load existing document
                let existing = storage.get(&key)?;
                if let Some(vv) = existing {
                    let mut doc = match &vv.value {
                        Value::Bytes(bytes) => RecoveryJsonDoc::from_bytes(bytes)?,
                        _ => {
                            return Err(strata_core::StrataError::invalid_input(
                                "Expected bytes for JSON document".to_string(),
                            ))
                        }
                    };

                    // Deserialize the new value
                    let new_value: JsonValue = rmp_serde::from_slice(value_bytes).map_err(|e| {
                        strata_core::StrataError::serialization(format!(
                            "Failed to deserialize JSON value during recovery: {}",
                            e
                        ))
                    })?;

                    // Apply the path mutation
                    set_at_path(&mut doc.value, path, new_value).map_err(|e| {
                        strata_core::StrataError::invalid_input(format!(
                            "Failed to set path during recovery: {}",
                            e
                        ))
                    })?;

                    // Update version and timestamp
                    doc.version = *version;
                    doc.updated_at = std::time::SystemTime::now()
                        .duration_since(std::time::SystemTime::UNIX_EPOCH)
                        .unwrap()
                        .as_millis() as i64;

                    // Store updated document
                    let doc_bytes = doc.to_bytes()?;
                    storage.put_with_version(key, Value::Bytes(doc_bytes), *version, None)?;

                    stats.json_sets_applied += 1;
                    stats.final_version = stats.final_version.max(*version);
                } else {
                    warn!(
                        "JsonSet for non-existent document {:?} during recovery, skipping",
                        doc_id
                    );
                }
            }

            WALEntry::JsonDelete {
                run_id,
                doc_id,
                path,
                version,
            } => {
                let key = Key::new_json(Namespace::for_run(*run_id), doc_id);

                // Load existing document
                let existing = storage.get(&key)?;
                if let Some(vv) = existing {
                    let mut doc = match &vv.value {
                        Value::Bytes(bytes) => RecoveryJsonDoc::from_bytes(bytes)?,
                        _ => {
                            return Err(strata_core::StrataError::invalid_input(
                                "Expected bytes for JSON document".to_string(),
                            ))
                        }
                    };

                    // Apply the path deletion
                    delete_at_path(&mut doc.value, path).map_err(|e| {
                        strata_core::StrataError::invalid_input(format!(
                            "Failed to delete path during recovery: {}",
                            e
                        ))
                    })?;

                    // Update version and timestamp
                    doc.version = *version;
                    doc.updated_at = std::time::SystemTime::now()
                        .duration_since(std::time::SystemTime::UNIX_EPOCH)
                        .unwrap()
                        .as_millis() as i64;

                    // Store updated document
                    let doc_bytes = doc.to_bytes()?;
                    storage.put_with_version(key, Value::Bytes(doc_bytes), *version, None)?;

                    stats.json_deletes_applied += 1;
                    stats.final_version = stats.final_version.max(*version);
                } else {
                    warn!(
                        "JsonDelete for non-existent document {:?} during recovery, skipping",
                        doc_id
                    );
                }
            }

            WALEntry::JsonDestroy { run_id, doc_id } => {
                let key = Key::new_json(Namespace::for_run(*run_id), doc_id);

                // Delete the document (use version 0 since JsonDestroy doesn't carry version)
                // The version doesn't matter much for deletes as long as it's applied
                if storage.get(&key)?.is_some() {
                    storage.delete_with_version(&key, 0)?;
                    stats.json_destroys_applied += 1;
                } else {
                    // Document already doesn't exist - idempotent
                    stats.json_destroys_applied += 1;
                }
            }

            _ => {
                // BeginTxn, CommitTxn, etc. are not applied to storage
            }
        }
    }

    stats.txns_applied += 1;
    Ok(())
}
