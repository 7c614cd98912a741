//! Transaction wrapper implementing TransactionOps
//!
//! This module provides the Transaction type that wraps TransactionContext
//! and implements the TransactionOps trait for unified primitive access.
//!
//! # KV Operations in TransactionOps
//! # Event Operations in TransactionOps
//! # State Operations in TransactionOps
//!
//! This implementation provides:
//! - Read-your-writes semantics (check write set first)
//! - Read set tracking for conflict detection
//! - Proper key construction with namespaces
//! - Event buffering with sequence allocation
//! - State cell CAS (compare-and-swap) support

use crate::transaction_ops::TransactionOps;
use strata_concurrency::TransactionContext;
use strata_core::{
    EntityRef, Event, JsonDocId, JsonPath, JsonValue, MetadataFilter, RunMetadata, RunStatus, State,
    StrataError, Timestamp, Value, VectorEntry, VectorMatch, Version, Versioned,
};
use strata_core::types::{Key, Namespace, RunId, TypeTag};
use sha2::{Sha256, Digest};

/// Transaction wrapper that implements TransactionOps
///
/// Wraps a TransactionContext and provides the unified primitive API
/// defined by the TransactionOps trait.
///
/// # Usage
///
/// ```ignore
/// db.transaction(&run_id, |txn| {
///     // KV operations
///     let value = txn.kv_get("key")?;
///     txn.kv_put("key", Value::from("value"))?;
///
///     // Event operations
///     txn.event_append("event_type", json!({}))?;
///
///     // State operations
///     txn.state_init("counter", Value::Int(0))?;
///     txn.state_cas("counter", 1, Value::Int(1))?;
///
///     Ok(())
/// })?;
/// ```
pub struct Transaction<'a> {
    /// The underlying transaction context
    ctx: &'a mut TransactionContext,
    /// Namespace for this transaction's run
    namespace: Namespace,
    /// Pending events buffered in this transaction
    pending_events: Vec<Event>,
    /// Base sequence number from snapshot (events start at base_sequence)
    base_sequence: u64,
    /// Last hash for chaining (starts as zero hash or last event's hash)
    last_hash: [u8; 32],
}

impl<'a> Transaction<'a> {
    /// Create a new Transaction wrapper
    pub fn new(ctx: &'a mut TransactionContext, namespace: Namespace) -> Self {
        // TODO: In full implementation, read base_sequence from snapshot metadata
        // For now, start at 0
        Self {
            ctx,
            namespace,
            pending_events: Vec::new(),
            base_sequence: 0,
            last_hash: [0u8; 32],
        }
    }

    /// Create a new Transaction with explicit base sequence
    ///
    /// Use this when you know the current event count from snapshot.
    pub fn with_base_sequence(
        ctx: &'a mut TransactionContext,
        namespace: Namespace,
        base_sequence: u64,
        last_hash: [u8; 32],
    ) -> Self {
        Self {
            ctx,
            namespace,
            pending_events: Vec::new(),
            base_sequence,
            last_hash,
        }
    }

    /// Get the run ID for this transaction
    pub fn run_id(&self) -> RunId {
        self.ctx.run_id
    }

    /// Create a KV key for the given user key
    fn kv_key(&self, key: &str) -> Key {
        Key::new_kv(self.namespace.clone(), key)
    }

    /// Create an event key for the given sequence
    fn event_key(&self, sequence: u64) -> Key {
        Key::new_event(self.namespace.clone(), sequence)
    }

    /// Extract user key from a full Key
    fn user_key(key: &Key) -> String {
        key.user_key_string().unwrap_or_default()
    }

    /// Compute hash for an event
    fn compute_event_hash(event: &Event) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(event.sequence.to_be_bytes());
        hasher.update(event.event_type.as_bytes());
        // Hash the payload by serializing to JSON
        if let Ok(payload_json) = serde_json::to_vec(&event.payload) {
            hasher.update(&payload_json);
        }
        hasher.update(event.timestamp.to_be_bytes());
        hasher.update(event.prev_hash);
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Get pending events (for commit)
    pub fn pending_events(&self) -> &[Event] {
        &self.pending_events
    }

    /// Get the next sequence number for a new event
    fn next_sequence(&self) -> u64 {
        self.base_sequence + self.pending_events.len() as u64
    }

    /// Create a state key for the given name
    fn state_key(&self, name: &str) -> Key {
        Key::new_state(self.namespace.clone(), name)
    }
}

impl<'a> TransactionOps for Transaction<'a> {
    // =========================================================================
    // KV Operations (Phase 2)
    // =========================================================================

    fn kv_get(&self, key: &str) -> Result<Option<Versioned<Value>>, StrataError> {
        let full_key = self.kv_key(key);

        // Check write set first (read-your-writes)
        if let Some(value) = self.ctx.write_set.get(&full_key) {
            return Ok(Some(Versioned::new(
                value.clone(),
                Version::txn(self.ctx.txn_id),
            )));
        }

        // Check delete set (uncommitted delete returns None)
        if self.ctx.delete_set.contains(&full_key) {
            return Ok(None);
        }

        // For reads from snapshot, we can only see uncommitted changes
        // The full implementation would need TransactionContext to expose
        // a snapshot read method.
        Ok(None)
    }

    fn kv_put(&mut self, key: &str, value: Value) -> Result<Version, StrataError> {
        let full_key = self.kv_key(key);

        // Use the ctx.put() method which handles all the bookkeeping
        self.ctx.put(full_key, value).map_err(StrataError::from)?;

        Ok(Version::txn(self.ctx.txn_id))
    }

    fn kv_delete(&mut self, key: &str) -> Result<bool, StrataError> {
        let full_key = self.kv_key(key);

        // Check if key exists (for return value)
        let existed = self.kv_exists(key)?;

        // Use the ctx.delete() method
        self.ctx.delete(full_key).map_err(StrataError::from)?;

        Ok(existed)
    }

    fn kv_exists(&self, key: &str) -> Result<bool, StrataError> {
        let full_key = self.kv_key(key);

        // Check write set first
        if self.ctx.write_set.contains_key(&full_key) {
            return Ok(true);
        }

        // Check delete set
        if self.ctx.delete_set.contains(&full_key) {
            return Ok(false);
        }

        // For keys not in write/delete set, we'd need snapshot access
        Ok(false)
    }

    fn kv_list(&self, prefix: Option<&str>) -> Result<Vec<String>, StrataError> {
        let mut keys: Vec<String> = Vec::new();

        // Collect keys from write set matching prefix
        for key in self.ctx.write_set.keys() {
            if key.type_tag == TypeTag::KV && key.namespace == self.namespace {
                let user_key = Self::user_key(key);
                if let Some(p) = prefix {
                    if user_key.starts_with(p) {
                        keys.push(user_key);
                    }
                } else {
                    keys.push(user_key);
                }
            }
        }

        // Remove deleted keys
        for key in &self.ctx.delete_set {
            if key.type_tag == TypeTag::KV && key.namespace == self.namespace {
                let user_key = Self::user_key(key);
                keys.retain(|k| k != &user_key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    // =========================================================================
    // Event Operations (Phase 2)
    // =========================================================================

    fn event_append(&mut self, event_type: &str, payload: Value) -> Result<Version, StrataError> {
        let sequence = self.next_sequence();
        let timestamp = Timestamp::now().as_micros() as i64;
        let prev_hash = self.last_hash;

        // Create the event
        let mut event = Event {
            sequence,
            event_type: event_type.to_string(),
            payload,
            timestamp,
            prev_hash,
            hash: [0u8; 32], // Will be computed
        };

        // Compute and set the hash
        event.hash = Self::compute_event_hash(&event);

        // Update last_hash for next event in chain
        self.last_hash = event.hash;

        // Also write to the underlying context so it gets committed
        let event_key = self.event_key(sequence);
        let event_bytes = serde_json::to_vec(&event).map_err(|e| {
            StrataError::Serialization {
                message: e.to_string(),
            }
        })?;
        self.ctx.put(event_key, Value::Bytes(event_bytes)).map_err(StrataError::from)?;

        // Buffer the event
        self.pending_events.push(event);

        Ok(Version::seq(sequence))
    }

    fn event_read(&self, sequence: u64) -> Result<Option<Versioned<Event>>, StrataError> {
        // Check pending events first (read-your-writes)
        if sequence >= self.base_sequence {
            let index = (sequence - self.base_sequence) as usize;
            if index < self.pending_events.len() {
                let event = &self.pending_events[index];
                return Ok(Some(Versioned::new(
                    event.clone(),
                    Version::seq(sequence),
                )));
            }
        }

        // Check if the event was written to ctx.write_set
        let event_key = self.event_key(sequence);
        if let Some(Value::Bytes(bytes)) = self.ctx.write_set.get(&event_key) {
            let event: Event = serde_json::from_slice(bytes).map_err(|e| {
                StrataError::Serialization {
                    message: e.to_string(),
                }
            })?;
            return Ok(Some(Versioned::new(event, Version::seq(sequence))));
        }

        // For reads from snapshot, would need snapshot access
        // Return None for events not in pending or write set
        Ok(None)
    }

    fn event_range(&self, start: u64, end: u64) -> Result<Vec<Versioned<Event>>, StrataError> {
        let mut results = Vec::new();

        for seq in start..end {
            if let Some(versioned) = self.event_read(seq)? {
                results.push(versioned);
            }
        }

        Ok(results)
    }

    fn event_len(&self) -> Result<u64, StrataError> {
        // Base sequence from snapshot + pending events
        Ok(self.base_sequence + self.pending_events.len() as u64)
    }

    // =========================================================================
    // State Operations (Phase 3)
    // =========================================================================

    fn state_read(&self, name: &str) -> Result<Option<Versioned<State>>, StrataError> {
        let full_key = self.state_key(name);

        // Check write set first (read-your-writes)
        if let Some(Value::Bytes(bytes)) = self.ctx.write_set.get(&full_key) {
            let state: State = serde_json::from_slice(bytes).map_err(|e| {
                StrataError::Serialization {
                    message: e.to_string(),
                }
            })?;
            return Ok(Some(Versioned::new(
                state.clone(),
                Version::counter(state.version),
            )));
        }

        // Check delete set (uncommitted delete returns None)
        if self.ctx.delete_set.contains(&full_key) {
            return Ok(None);
        }

        // For reads from snapshot, would need snapshot access
        // Return None for state not in write set
        Ok(None)
    }

    fn state_init(&mut self, name: &str, value: Value) -> Result<Version, StrataError> {
        let full_key = self.state_key(name);

        // Check if state already exists (init should only work for new state)
        if self.ctx.write_set.contains_key(&full_key) {
            return Err(StrataError::invalid_operation(
                EntityRef::state(self.run_id(), name),
                "state already exists",
            ));
        }

        // Create new state with version 1
        let state = State::new(value);
        let version = state.version;

        // Serialize and store
        let state_bytes = serde_json::to_vec(&state).map_err(|e| {
            StrataError::Serialization {
                message: e.to_string(),
            }
        })?;

        self.ctx.put(full_key, Value::Bytes(state_bytes)).map_err(StrataError::from)?;

        Ok(Version::counter(version))
    }

    fn state_cas(
        &mut self,
        name: &str,
        expected_version: u64,
        value: Value,
    ) -> Result<Version, StrataError> {
        let full_key = self.state_key(name);

        // Read current state to get version
        let current_state = if let Some(Value::Bytes(bytes)) = self.ctx.write_set.get(&full_key) {
            let state: State = serde_json::from_slice(bytes).map_err(|e| {
                StrataError::Serialization {
                    message: e.to_string(),
                }
            })?;
            Some(state)
        } else {
            None
        };

        // For CAS, state must exist
        let current = current_state.ok_or_else(|| {
            StrataError::not_found(EntityRef::state(self.run_id(), name))
        })?;

        // Check version matches
        if current.version != expected_version {
            return Err(StrataError::version_conflict(
                EntityRef::state(self.run_id(), name),
                Version::counter(expected_version),
                Version::counter(current.version),
            ));
        }

        // Create new state with incremented version
        let new_state = State::with_version(value, expected_version + 1);
        let new_version = new_state.version;

        // Serialize and store
        let state_bytes = serde_json::to_vec(&new_state).map_err(|e| {
            StrataError::Serialization {
                message: e.to_string(),
            }
        })?;

        self.ctx.put(full_key, Value::Bytes(state_bytes)).map_err(StrataError::from)?;

        Ok(Version::counter(new_version))
    }

    fn state_delete(&mut self, name: &str) -> Result<bool, StrataError> {
        let full_key = self.state_key(name);

        // Check if state exists (for return value)
        let existed = self.state_exists(name)?;

        // Use the ctx.delete() method
        self.ctx.delete(full_key).map_err(StrataError::from)?;

        Ok(existed)
    }

    fn state_exists(&self, name: &str) -> Result<bool, StrataError> {
        let full_key = self.state_key(name);

        // Check write set first
        if self.ctx.write_set.contains_key(&full_key) {
            return Ok(true);
        }

        // Check delete set
        if self.ctx.delete_set.contains(&full_key) {
            return Ok(false);
        }

        // For keys not in write/delete set, we'd need snapshot access
        Ok(false)
    }

    // =========================================================================
    // Json Operations (Phase 4) - Stub implementations
    // =========================================================================

    fn json_create(&mut self, _doc_id: &JsonDocId, _value: JsonValue) -> Result<Version, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_get(&self, _doc_id: &JsonDocId) -> Result<Option<Versioned<JsonValue>>, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_get_path(
        &self,
        _doc_id: &JsonDocId,
        _path: &JsonPath,
    ) -> Result<Option<JsonValue>, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_set(
        &mut self,
        _doc_id: &JsonDocId,
        _path: &JsonPath,
        _value: JsonValue,
    ) -> Result<Version, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_delete(&mut self, _doc_id: &JsonDocId) -> Result<bool, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_exists(&self, _doc_id: &JsonDocId) -> Result<bool, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    fn json_destroy(&mut self, _doc_id: &JsonDocId) -> Result<bool, StrataError> {
        unimplemented!("Json operations will be implemented in Phase 4")
    }

    // =========================================================================
    // Vector Operations (Phase 4) - Stub implementations
    // =========================================================================

    fn vector_insert(
        &mut self,
        _collection: &str,
        _key: &str,
        _embedding: &[f32],
        _metadata: Option<Value>,
    ) -> Result<Version, StrataError> {
        unimplemented!("Vector operations will be implemented in Phase 4")
    }

    fn vector_get(
        &self,
        _collection: &str,
        _key: &str,
    ) -> Result<Option<Versioned<VectorEntry>>, StrataError> {
        unimplemented!("Vector operations will be implemented in Phase 4")
    }

    fn vector_delete(&mut self, _collection: &str, _key: &str) -> Result<bool, StrataError> {
        unimplemented!("Vector operations will be implemented in Phase 4")
    }

    fn vector_search(
        &self,
        _collection: &str,
        _query: &[f32],
        _k: usize,
        _filter: Option<MetadataFilter>,
    ) -> Result<Vec<VectorMatch>, StrataError> {
        unimplemented!("Vector operations will be implemented in Phase 4")
    }

    fn vector_exists(&self, _collection: &str, _key: &str) -> Result<bool, StrataError> {
        unimplemented!("Vector operations will be implemented in Phase 4")
    }

    // =========================================================================
    // Run Operations (Phase 5) - Stub implementations
    // =========================================================================

    fn run_metadata(&self) -> Result<Option<Versioned<RunMetadata>>, StrataError> {
        unimplemented!("Run operations will be implemented in Phase 5")
    }

    fn run_update_status(&mut self, _status: RunStatus) -> Result<Version, StrataError> {
        unimplemented!("Run operations will be implemented in Phase 5")
    }
}
