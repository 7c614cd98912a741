//! EventLog: Immutable append-only event stream primitive
//!
//! ## Role: Determinism Boundary Recorder
//!
//! EventLog records nondeterministic external inputs that cross the determinism boundary.
//! Its purpose is to enable deterministic replay of agent branches by capturing exactly
//! the information needed to reproduce nondeterministic behavior.
//!
//! Key invariant: If an operation's result is NOT recorded in EventLog, that operation
//! MUST be deterministic given the current state.
//!
//! ## Design Principles
//!
//! 1. **Single-Writer-Ordered**: All appends serialize through CAS on metadata key.
//!    Parallel append is NOT supported - event ordering must be total within a branch.
//!
//! 2. **Causal Hash Chaining**: Each event includes SHA-256 hash of previous event.
//!    Provides tamper-evidence and deterministic verification.
//!
//! 3. **Append-Only**: No update or delete operations - events are immutable.
//!
//! 4. **Object-Only Payloads**: All payloads must be JSON objects (not primitives/arrays).
//!
//! 5. **Global Sequences**: Streams are filters over a single global sequence per branch.
//!
//! ## Hash Chain
//!
//! Uses SHA-256 for deterministic cross-platform hashing. Hash version 1 computes:
//! SHA256(sequence || event_type_len || event_type || timestamp || payload_len || payload || prev_hash)
//!
//! ## Key Design
//!
//! - TypeTag: Event (0x02)
//! - Event key: `<namespace>:<TypeTag::Event>:<sequence_be_bytes>`
//! - Metadata key: `<namespace>:<TypeTag::Event>:__meta__`

use crate::database::{Database, RetryConfig};
use crate::primitives::extensions::EventLogExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use strata_concurrency::TransactionContext;
use strata_core::contract::{Timestamp, Version, Versioned};
use strata_core::types::{BranchId, Key, Namespace};
use strata_core::value::Value;
use strata_core::StrataError;
use strata_core::StrataResult;

// Re-export Event from core
pub use strata_core::primitives::Event;

/// Hash version constants
pub(crate) const HASH_VERSION_SHA256: u8 = 1; // SHA-256

/// Per-stream metadata for O(1) access to stream statistics
///
/// Note: The `sequences` field was removed in #972 to fix O(N) metadata growth.
/// Per-type sequence lookups now use separate index keys (see `Key::new_event_type_idx`).
/// Old metadata with `sequences` will deserialize correctly (serde ignores unknown fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMeta {
    /// Number of events in this stream
    pub count: u64,
    /// First sequence number in this stream (global sequence)
    pub first_sequence: u64,
    /// Last sequence number in this stream (global sequence)
    pub last_sequence: u64,
    /// Timestamp of first event in stream (microseconds since epoch)
    pub first_timestamp: u64,
    /// Timestamp of last event in stream (microseconds since epoch)
    pub last_timestamp: u64,
}

impl StreamMeta {
    fn new(sequence: u64, timestamp: u64) -> Self {
        Self {
            count: 1,
            first_sequence: sequence,
            last_sequence: sequence,
            first_timestamp: timestamp,
            last_timestamp: timestamp,
        }
    }

    fn update(&mut self, sequence: u64, timestamp: u64) {
        self.count += 1;
        self.last_sequence = sequence;
        self.last_timestamp = timestamp;
    }
}

/// EventLog metadata stored per branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EventLogMeta {
    /// Next sequence number to assign
    pub next_sequence: u64,
    /// Hash of the last event (head of chain)
    pub head_hash: [u8; 32],
    /// Hash algorithm version (0 = legacy DefaultHasher, 1 = SHA-256)
    #[serde(default)]
    pub hash_version: u8,
    /// Per-stream metadata for O(1) stream queries
    #[serde(default)]
    pub streams: HashMap<String, StreamMeta>,
}

impl Default for EventLogMeta {
    fn default() -> Self {
        Self {
            next_sequence: 0,
            head_hash: [0u8; 32],
            hash_version: HASH_VERSION_SHA256, // New logs use SHA-256
            streams: HashMap::new(),
        }
    }
}

/// Compute event hash using SHA-256
///
/// Deterministic across platforms and Rust versions.
/// Format: SHA256(sequence || event_type_len || event_type || timestamp || payload_len || payload || prev_hash)
///
/// This is the canonical hash function for event chain integrity.
/// All code paths that compute event hashes MUST use this function.
pub fn compute_event_hash(
    sequence: u64,
    event_type: &str,
    payload: &Value,
    timestamp: u64,
    prev_hash: &[u8; 32],
) -> [u8; 32] {
    let mut hasher = Sha256::new();

    // Sequence (8 bytes, little-endian)
    hasher.update(&sequence.to_le_bytes());

    // Event type with length prefix (4 bytes length + content)
    hasher.update(&(event_type.len() as u32).to_le_bytes());
    hasher.update(event_type.as_bytes());

    // Timestamp (8 bytes, little-endian)
    hasher.update(&timestamp.to_le_bytes());

    // Payload as canonical JSON with length prefix
    let payload_bytes = serde_json::to_vec(payload).unwrap_or_default();
    hasher.update(&(payload_bytes.len() as u32).to_le_bytes());
    hasher.update(&payload_bytes);

    // Previous hash (32 bytes)
    hasher.update(prev_hash);

    hasher.finalize().into()
}

/// Validation error for EventLog operations
#[derive(Debug, Clone, PartialEq)]
pub enum EventLogValidationError {
    /// Payload must be an object, not a primitive or array
    PayloadNotObject,
    /// Payload contains NaN or Infinity which are not valid JSON
    PayloadContainsNonFiniteFloat,
    /// Event type cannot be empty
    EmptyEventType,
    /// Event type cannot exceed maximum length
    EventTypeTooLong(usize),
}

impl std::fmt::Display for EventLogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PayloadNotObject => write!(f, "payload must be a JSON object"),
            Self::PayloadContainsNonFiniteFloat => write!(f, "payload contains NaN or Infinity"),
            Self::EmptyEventType => write!(f, "event_type cannot be empty"),
            Self::EventTypeTooLong(len) => write!(f, "event_type exceeds maximum length ({})", len),
        }
    }
}

/// Maximum allowed event type length
const MAX_EVENT_TYPE_LENGTH: usize = 256;

/// Validate event type
fn validate_event_type(event_type: &str) -> std::result::Result<(), EventLogValidationError> {
    if event_type.is_empty() {
        return Err(EventLogValidationError::EmptyEventType);
    }
    if event_type.len() > MAX_EVENT_TYPE_LENGTH {
        return Err(EventLogValidationError::EventTypeTooLong(event_type.len()));
    }
    Ok(())
}

/// Validate payload is an object and contains no non-finite floats
fn validate_payload(payload: &Value) -> std::result::Result<(), EventLogValidationError> {
    // Payload must be an object
    if !matches!(payload, Value::Object(_)) {
        return Err(EventLogValidationError::PayloadNotObject);
    }

    // Check for non-finite floats recursively
    if contains_non_finite_float(payload) {
        return Err(EventLogValidationError::PayloadContainsNonFiniteFloat);
    }

    Ok(())
}

/// Check if a Value contains NaN or Infinity
fn contains_non_finite_float(value: &Value) -> bool {
    match value {
        Value::Float(f) => !f.is_finite(),
        Value::Object(map) => map.values().any(contains_non_finite_float),
        Value::Array(arr) => arr.iter().any(contains_non_finite_float),
        _ => false,
    }
}

/// Serialize a struct to Value::String for storage
fn to_stored_value<T: Serialize>(v: &T) -> StrataResult<Value> {
    serde_json::to_string(v)
        .map(Value::String)
        .map_err(|e| StrataError::serialization(e.to_string()))
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

/// Immutable append-only event stream
///
/// DESIGN: Single-writer-ordered per branch.
/// All appends serialize through CAS on metadata key.
///
/// # Example
///
/// ```ignore
/// use strata_primitives::EventLog;
/// use strata_engine::Database;
/// use strata_core::types::BranchId;
/// use strata_core::value::Value;
///
/// let db = Database::open("/path/to/data")?;
/// let log = EventLog::new(db);
/// let branch_id = BranchId::new();
///
/// // Append events
/// let (seq, hash) = log.append(&branch_id, "tool_call", Value::String("search".into()))?;
///
/// // Read events
/// let event = log.read(&branch_id, seq)?;
///
/// // Verify chain
/// let verification = log.verify_chain(&branch_id)?;
/// assert!(verification.is_valid);
/// ```
#[derive(Clone)]
pub struct EventLog {
    db: Arc<Database>,
}

impl EventLog {
    /// Create new EventLog instance
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

    // ========== Append Operation ==========

    /// Append a new event to the log
    ///
    /// Returns the assigned sequence version.
    /// Serializes through CAS on metadata key - parallel appends will retry
    /// automatically with exponential backoff.
    ///
    /// # Arguments
    /// * `branch_id` - The branch to append to
    /// * `event_type` - User-defined event category (non-empty, max 256 chars)
    /// * `payload` - Event data (must be a JSON object, no NaN/Infinity)
    ///
    /// # Returns
    /// Version::Sequence containing the assigned sequence number
    ///
    /// # Errors
    /// Returns error if:
    /// - `event_type` is empty or exceeds 256 characters
    /// - `payload` is not a JSON object
    /// - `payload` contains NaN or Infinity float values
    pub fn append(
        &self,
        branch_id: &BranchId,
        event_type: &str,
        payload: Value,
    ) -> StrataResult<Version> {
        // Validate inputs before entering transaction
        validate_event_type(event_type).map_err(|e| StrataError::invalid_input(e.to_string()))?;
        validate_payload(&payload).map_err(|e| StrataError::invalid_input(e.to_string()))?;

        // Use high retry count for contention scenarios
        // EventLog appends serialize through metadata CAS, so conflicts are expected
        // With N concurrent threads, worst case needs N retries per append
        // 200 retries with fast backoff handles 100+ concurrent threads reliably
        let retry_config = RetryConfig::default()
            .with_max_retries(50)
            .with_base_delay_ms(1)
            .with_max_delay_ms(50);

        let ns = self.namespace_for_branch(branch_id);
        let event_type_owned = event_type.to_string();

        let result = self
            .db
            .transaction_with_retry(*branch_id, retry_config, |txn| {
                // Read current metadata (or default)
                let meta_key = Key::new_event_meta(ns.clone());
                let mut meta: EventLogMeta = match txn.get(&meta_key)? {
                    Some(v) => from_stored_value(&v).unwrap_or_else(|_| EventLogMeta::default()),
                    None => EventLogMeta::default(),
                };

                // Compute event hash using current hash version
                let sequence = meta.next_sequence;
                let timestamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_micros() as u64;

                let hash = compute_event_hash(
                    sequence,
                    &event_type_owned,
                    &payload,
                    timestamp,
                    &meta.head_hash,
                );

                // Build event
                let event = Event {
                    sequence,
                    event_type: event_type_owned.clone(),
                    payload: payload.clone(),
                    timestamp,
                    prev_hash: meta.head_hash,
                    hash,
                };

                // Write event
                let event_key = Key::new_event(ns.clone(), sequence);
                txn.put(event_key, to_stored_value(&event)?)?;

                // Write per-type index key for efficient read_by_type lookups (#972)
                let idx_key =
                    Key::new_event_type_idx(ns.clone(), &event_type_owned, sequence);
                txn.put(idx_key, Value::Null)?;

                // Update stream metadata
                match meta.streams.get_mut(&event_type_owned) {
                    Some(stream_meta) => stream_meta.update(sequence, timestamp),
                    None => {
                        meta.streams.insert(
                            event_type_owned.clone(),
                            StreamMeta::new(sequence, timestamp),
                        );
                    }
                }

                // Update metadata (CAS semantics through transaction)
                meta.next_sequence = sequence + 1;
                meta.head_hash = hash;
                txn.put(meta_key, to_stored_value(&meta)?)?;

                Ok(Version::Sequence(sequence))
            })?;

        // Update inverted index (zero overhead when disabled)
        let idx = self.db.extension::<crate::search::InvertedIndex>();
        if idx.is_enabled() {
            let text = format!(
                "{} {}",
                event_type,
                serde_json::to_string(&payload).unwrap_or_default()
            );
            if let Version::Sequence(seq) = result {
                let entity_ref = crate::search::EntityRef::Event {
                    branch_id: *branch_id,
                    sequence: seq,
                };
                idx.index_document(&entity_ref, &text, None);
            }
        }

        Ok(result)
    }

    // ========== Read Operations ==========

    /// Read a single event by sequence number.
    ///
    /// Returns Versioned<Event> if found.
    pub fn read(
        &self,
        branch_id: &BranchId,
        sequence: u64,
    ) -> StrataResult<Option<Versioned<Event>>> {
        self.db.transaction(*branch_id, |txn| {
            let ns = self.namespace_for_branch(branch_id);
            let event_key = Key::new_event(ns, sequence);

            match txn.get(&event_key)? {
                Some(v) => {
                    let event: Event = from_stored_value(&v)
                        .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                    Ok(Some(Versioned::with_timestamp(
                        event.clone(),
                        Version::Sequence(sequence),
                        Timestamp::from_micros(event.timestamp),
                    )))
                }
                None => Ok(None),
            }
        })
    }

    /// Get the current length of the log.
    pub fn len(&self, branch_id: &BranchId) -> StrataResult<u64> {
        self.db.transaction(*branch_id, |txn| {
            let ns = self.namespace_for_branch(branch_id);
            let meta_key = Key::new_event_meta(ns);

            let meta: EventLogMeta = match txn.get(&meta_key)? {
                Some(v) => from_stored_value(&v).unwrap_or_else(|_| EventLogMeta::default()),
                None => EventLogMeta::default(),
            };

            Ok(meta.next_sequence)
        })
    }

    // ========== Query by Type ==========

    /// Read events filtered by type
    ///
    /// Returns Vec<Versioned<Event>> for events matching the type.
    /// Uses per-type index keys for O(K) lookup where K = events of that type.
    pub fn read_by_type(
        &self,
        branch_id: &BranchId,
        event_type: &str,
    ) -> StrataResult<Vec<Versioned<Event>>> {
        self.db.transaction(*branch_id, |txn| {
            let ns = self.namespace_for_branch(branch_id);

            // Use per-type index keys for efficient lookup (#972)
            let idx_prefix = Key::new_event_type_idx_prefix(ns.clone(), event_type);
            let idx_entries = txn.scan_prefix(&idx_prefix)?;

            if !idx_entries.is_empty() {
                let mut results = Vec::with_capacity(idx_entries.len());
                for (idx_key, _) in &idx_entries {
                    // Extract sequence from the last 8 bytes of the user_key
                    let user_key = &idx_key.user_key;
                    if user_key.len() >= 8 {
                        let seq_bytes: [u8; 8] =
                            user_key[user_key.len() - 8..].try_into().unwrap();
                        let seq = u64::from_be_bytes(seq_bytes);
                        let event_key = Key::new_event(ns.clone(), seq);
                        if let Some(v) = txn.get(&event_key)? {
                            let event: Event = from_stored_value(&v).map_err(|e| {
                                strata_core::StrataError::serialization(e.to_string())
                            })?;
                            results.push(Versioned::with_timestamp(
                                event.clone(),
                                Version::Sequence(seq),
                                Timestamp::from_micros(event.timestamp),
                            ));
                        }
                    }
                }
                return Ok(results);
            }

            // Fallback: O(N) scan for old data without type index keys
            let meta_key = Key::new_event_meta(ns.clone());
            let meta: EventLogMeta = match txn.get(&meta_key)? {
                Some(v) => from_stored_value(&v).unwrap_or_else(|_| EventLogMeta::default()),
                None => return Ok(Vec::new()),
            };

            let mut filtered = Vec::new();
            for seq in 0..meta.next_sequence {
                let event_key = Key::new_event(ns.clone(), seq);
                if let Some(v) = txn.get(&event_key)? {
                    let event: Event = from_stored_value(&v)
                        .map_err(|e| strata_core::StrataError::serialization(e.to_string()))?;
                    if event.event_type == event_type {
                        filtered.push(Versioned::with_timestamp(
                            event.clone(),
                            Version::Sequence(seq),
                            Timestamp::from_micros(event.timestamp),
                        ));
                    }
                }
            }

            Ok(filtered)
        })
    }
}

// ========== Searchable Trait Implementation ==========

impl crate::search::Searchable for EventLog {
    fn search(
        &self,
        _req: &crate::SearchRequest,
    ) -> strata_core::StrataResult<crate::SearchResponse> {
        // Search is handled by the intelligence layer, not the primitive
        Ok(crate::SearchResponse::empty())
    }

    fn primitive_kind(&self) -> strata_core::PrimitiveType {
        strata_core::PrimitiveType::Event
    }
}

// ========== EventLogExt Implementation ==========

impl EventLogExt for TransactionContext {
    fn event_append(&mut self, event_type: &str, payload: Value) -> StrataResult<u64> {
        // Validate inputs
        validate_event_type(event_type).map_err(|e| StrataError::invalid_input(e.to_string()))?;
        validate_payload(&payload).map_err(|e| StrataError::invalid_input(e.to_string()))?;

        let ns = Namespace::for_branch(self.branch_id);

        // Read current metadata (or default)
        let meta_key = Key::new_event_meta(ns.clone());
        let mut meta: EventLogMeta = match self.get(&meta_key)? {
            Some(v) => from_stored_value(&v).unwrap_or_else(|_| EventLogMeta::default()),
            None => EventLogMeta::default(),
        };

        // Compute event hash using current hash version
        let sequence = meta.next_sequence;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_micros() as u64;

        let hash = compute_event_hash(sequence, event_type, &payload, timestamp, &meta.head_hash);

        // Build event
        let event = Event {
            sequence,
            event_type: event_type.to_string(),
            payload: payload.clone(),
            timestamp,
            prev_hash: meta.head_hash,
            hash,
        };

        // Write event
        let event_key = Key::new_event(ns.clone(), sequence);
        self.put(event_key, to_stored_value(&event)?)?;

        // Write per-type index key for efficient read_by_type lookups (#972)
        let idx_key = Key::new_event_type_idx(ns.clone(), event_type, sequence);
        self.put(idx_key, Value::Null)?;

        // Update stream metadata
        let event_type_owned = event_type.to_string();
        match meta.streams.get_mut(&event_type_owned) {
            Some(stream_meta) => stream_meta.update(sequence, timestamp),
            None => {
                meta.streams
                    .insert(event_type_owned, StreamMeta::new(sequence, timestamp));
            }
        }

        // Update metadata
        meta.next_sequence = sequence + 1;
        meta.head_hash = hash;
        self.put(meta_key, to_stored_value(&meta)?)?;

        Ok(sequence)
    }

    fn event_read(&mut self, sequence: u64) -> StrataResult<Option<Value>> {
        let ns = Namespace::for_branch(self.branch_id);
        let event_key = Key::new_event(ns, sequence);
        self.get(&event_key)
    }
}
