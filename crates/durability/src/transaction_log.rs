//! Cross-Primitive Transaction Support
//!
//! This module provides transaction grouping for atomic cross-primitive operations.
//! All entries in a transaction share the same tx_id, ensuring either all effects
//! are visible after crash recovery or none.
//!
//! ## Core Guarantees
//!
//! 1. **Atomicity**: All entries in a transaction share the same tx_id
//! 2. **Commit Markers**: Transaction only visible after commit marker is written
//! 3. **Recovery Safety**: Recovery only applies entries with commit markers
//! 4. **No Partial State**: Orphaned transactions (no commit) are discarded
//!
//! ## Example
//!
//! ```ignore
//! let mut tx = Transaction::new();
//! tx.kv_put("key1", b"value1")
//!   .json_set("doc1", json!({"field": "value"}))
//!   .state_set("state1", b"active");
//!
//! // All entries share the same tx_id
//! let (tx_id, entries) = tx.into_wal_entries();
//! ```

use crate::wal_types::{TxId, WalEntry};
use crate::wal_entry_types::WalEntryType;

/// A transaction that can span multiple primitives
///
/// All operations added to the transaction share the same tx_id,
/// ensuring atomic commit (all or nothing) semantics.
#[derive(Debug)]
pub struct Transaction {
    /// Transaction ID shared by all entries
    id: TxId,
    /// Entries accumulated during transaction
    entries: Vec<TxEntry>,
}

/// Entry types for cross-primitive transactions
///
/// Each variant corresponds to a primitive operation that can be
/// part of an atomic transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TxEntry {
    // ========================================================================
    // KV Primitive Operations
    // ========================================================================
    /// KV put operation
    KvPut {
        /// Key to write
        key: Vec<u8>,
        /// Value to store
        value: Vec<u8>,
    },
    /// KV delete operation
    KvDelete {
        /// Key to delete
        key: Vec<u8>,
    },

    // ========================================================================
    // JSON Primitive Operations
    // ========================================================================
    /// JSON document creation
    JsonCreate {
        /// Document key
        key: Vec<u8>,
        /// JSON document content
        doc: Vec<u8>,
    },
    /// JSON set value
    JsonSet {
        /// Document key
        key: Vec<u8>,
        /// JSON document content
        doc: Vec<u8>,
    },
    /// JSON delete
    JsonDelete {
        /// Document key
        key: Vec<u8>,
    },
    /// JSON patch (RFC 6902)
    JsonPatch {
        /// Document key
        key: Vec<u8>,
        /// Patch operations
        patch: Vec<u8>,
    },

    // ========================================================================
    // Event Primitive Operations
    // ========================================================================
    /// Event append
    EventAppend {
        /// Event payload
        payload: Vec<u8>,
    },

    // ========================================================================
    // State Primitive Operations
    // ========================================================================
    /// State initialization
    StateInit {
        /// State key
        key: Vec<u8>,
        /// Initial value
        value: Vec<u8>,
    },
    /// State set
    StateSet {
        /// State key
        key: Vec<u8>,
        /// New value
        value: Vec<u8>,
    },
    /// State transition
    StateTransition {
        /// State key
        key: Vec<u8>,
        /// Expected from value
        from: Vec<u8>,
        /// New to value
        to: Vec<u8>,
    },

    // ========================================================================
    // Trace Primitive Operations
    // ========================================================================
    /// Trace span record
    TraceRecord {
        /// Span data
        span: Vec<u8>,
    },

    // ========================================================================
    // Run Primitive Operations
    // ========================================================================
    /// Run creation
    RunCreate {
        /// Run metadata
        metadata: Vec<u8>,
    },
    /// Run update
    RunUpdate {
        /// Run metadata
        metadata: Vec<u8>,
    },
    /// Run begin
    RunBegin {
        /// Run metadata
        metadata: Vec<u8>,
    },
    /// Run end
    RunEnd {
        /// Run metadata
        metadata: Vec<u8>,
    },
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Create a new transaction with a fresh tx_id
    pub fn new() -> Self {
        Transaction {
            id: TxId::new(),
            entries: Vec::new(),
        }
    }

    /// Create a transaction with a specific tx_id (for testing/recovery)
    pub fn with_id(id: TxId) -> Self {
        Transaction {
            id,
            entries: Vec::new(),
        }
    }

    /// Get the transaction ID
    pub fn id(&self) -> TxId {
        self.id
    }

    /// Get the entries in this transaction
    pub fn entries(&self) -> &[TxEntry] {
        &self.entries
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the transaction is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========================================================================
    // KV Operations
    // ========================================================================

    /// Add a KV put operation
    pub fn kv_put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::KvPut {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a KV delete operation
    pub fn kv_delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::KvDelete { key: key.into() });
        self
    }

    // ========================================================================
    // JSON Operations
    // ========================================================================

    /// Add a JSON create operation
    pub fn json_create(&mut self, key: impl Into<Vec<u8>>, doc: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::JsonCreate {
            key: key.into(),
            doc: doc.into(),
        });
        self
    }

    /// Add a JSON set operation
    pub fn json_set(&mut self, key: impl Into<Vec<u8>>, doc: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::JsonSet {
            key: key.into(),
            doc: doc.into(),
        });
        self
    }

    /// Add a JSON delete operation
    pub fn json_delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::JsonDelete { key: key.into() });
        self
    }

    /// Add a JSON patch operation
    pub fn json_patch(&mut self, key: impl Into<Vec<u8>>, patch: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::JsonPatch {
            key: key.into(),
            patch: patch.into(),
        });
        self
    }

    // ========================================================================
    // Event Operations
    // ========================================================================

    /// Add an event append operation
    pub fn event_append(&mut self, payload: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::EventAppend {
            payload: payload.into(),
        });
        self
    }

    // ========================================================================
    // State Operations
    // ========================================================================

    /// Add a state init operation
    pub fn state_init(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::StateInit {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a state set operation
    pub fn state_set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::StateSet {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a state transition operation
    pub fn state_transition(
        &mut self,
        key: impl Into<Vec<u8>>,
        from: impl Into<Vec<u8>>,
        to: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.entries.push(TxEntry::StateTransition {
            key: key.into(),
            from: from.into(),
            to: to.into(),
        });
        self
    }

    // ========================================================================
    // Trace Operations
    // ========================================================================

    /// Add a trace record operation
    pub fn trace_record(&mut self, span: impl Into<Vec<u8>>) -> &mut Self {
        self.entries
            .push(TxEntry::TraceRecord { span: span.into() });
        self
    }

    // ========================================================================
    // Run Operations
    // ========================================================================

    /// Add a run create operation
    pub fn run_create(&mut self, metadata: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::RunCreate {
            metadata: metadata.into(),
        });
        self
    }

    /// Add a run update operation
    pub fn run_update(&mut self, metadata: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::RunUpdate {
            metadata: metadata.into(),
        });
        self
    }

    /// Add a run begin operation
    pub fn run_begin(&mut self, metadata: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::RunBegin {
            metadata: metadata.into(),
        });
        self
    }

    /// Add a run end operation
    pub fn run_end(&mut self, metadata: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(TxEntry::RunEnd {
            metadata: metadata.into(),
        });
        self
    }

    // ========================================================================
    // Conversion to WAL Entries
    // ========================================================================

    /// Convert transaction to WAL entries
    ///
    /// Returns the tx_id and a vector of WAL entries. All entries share the
    /// same tx_id for atomic grouping. Note: This does NOT include the commit
    /// marker - that should be written separately after all entries.
    pub fn into_wal_entries(self) -> (TxId, Vec<WalEntry>) {
        let tx_id = self.id;
        let entries = self
            .entries
            .into_iter()
            .map(|entry| {
                let (entry_type, payload) = entry.to_wal_payload();
                WalEntry::new(entry_type, tx_id, payload)
            })
            .collect();

        (tx_id, entries)
    }

    /// Convert to WAL entries without consuming the transaction
    pub fn to_wal_entries(&self) -> (TxId, Vec<WalEntry>) {
        let tx_id = self.id;
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let (entry_type, payload) = entry.to_wal_payload();
                WalEntry::new(entry_type, tx_id, payload)
            })
            .collect();

        (tx_id, entries)
    }
}

impl TxEntry {
    /// Get the WAL entry type for this transaction entry
    pub fn entry_type(&self) -> WalEntryType {
        match self {
            TxEntry::KvPut { .. } => WalEntryType::KvPut,
            TxEntry::KvDelete { .. } => WalEntryType::KvDelete,
            TxEntry::JsonCreate { .. } => WalEntryType::JsonCreate,
            TxEntry::JsonSet { .. } => WalEntryType::JsonSet,
            TxEntry::JsonDelete { .. } => WalEntryType::JsonDelete,
            TxEntry::JsonPatch { .. } => WalEntryType::JsonPatch,
            TxEntry::EventAppend { .. } => WalEntryType::EventAppend,
            TxEntry::StateInit { .. } => WalEntryType::StateInit,
            TxEntry::StateSet { .. } => WalEntryType::StateSet,
            TxEntry::StateTransition { .. } => WalEntryType::StateTransition,
            TxEntry::TraceRecord { .. } => WalEntryType::TraceRecord,
            TxEntry::RunCreate { .. } => WalEntryType::RunCreate,
            TxEntry::RunUpdate { .. } => WalEntryType::RunUpdate,
            TxEntry::RunBegin { .. } => WalEntryType::RunBegin,
            TxEntry::RunEnd { .. } => WalEntryType::RunEnd,
        }
    }

    /// Serialize to WAL payload
    ///
    /// Payload format for key-value entries:
    /// - key_len: u32 (little-endian)
    /// - key: bytes
    /// - value: remaining bytes
    ///
    /// For single-payload entries:
    /// - payload: bytes
    pub fn to_wal_payload(&self) -> (WalEntryType, Vec<u8>) {
        let entry_type = self.entry_type();
        let payload = match self {
            TxEntry::KvPut { key, value } => serialize_kv(key, value),
            TxEntry::KvDelete { key } => key.clone(),
            TxEntry::JsonCreate { key, doc } => serialize_kv(key, doc),
            TxEntry::JsonSet { key, doc } => serialize_kv(key, doc),
            TxEntry::JsonDelete { key } => key.clone(),
            TxEntry::JsonPatch { key, patch } => serialize_kv(key, patch),
            TxEntry::EventAppend { payload } => payload.clone(),
            TxEntry::StateInit { key, value } => serialize_kv(key, value),
            TxEntry::StateSet { key, value } => serialize_kv(key, value),
            TxEntry::StateTransition { key, from, to } => serialize_transition(key, from, to),
            TxEntry::TraceRecord { span } => span.clone(),
            TxEntry::RunCreate { metadata } => metadata.clone(),
            TxEntry::RunUpdate { metadata } => metadata.clone(),
            TxEntry::RunBegin { metadata } => metadata.clone(),
            TxEntry::RunEnd { metadata } => metadata.clone(),
        };
        (entry_type, payload)
    }

    /// Parse from WAL entry type and payload
    pub fn from_wal_payload(entry_type: WalEntryType, payload: &[u8]) -> Option<Self> {
        match entry_type {
            WalEntryType::KvPut => {
                let (key, value) = deserialize_kv(payload)?;
                Some(TxEntry::KvPut { key, value })
            }
            WalEntryType::KvDelete => Some(TxEntry::KvDelete {
                key: payload.to_vec(),
            }),
            WalEntryType::JsonCreate => {
                let (key, doc) = deserialize_kv(payload)?;
                Some(TxEntry::JsonCreate { key, doc })
            }
            WalEntryType::JsonSet => {
                let (key, doc) = deserialize_kv(payload)?;
                Some(TxEntry::JsonSet { key, doc })
            }
            WalEntryType::JsonDelete => Some(TxEntry::JsonDelete {
                key: payload.to_vec(),
            }),
            WalEntryType::JsonPatch => {
                let (key, patch) = deserialize_kv(payload)?;
                Some(TxEntry::JsonPatch { key, patch })
            }
            WalEntryType::EventAppend => Some(TxEntry::EventAppend {
                payload: payload.to_vec(),
            }),
            WalEntryType::StateInit => {
                let (key, value) = deserialize_kv(payload)?;
                Some(TxEntry::StateInit { key, value })
            }
            WalEntryType::StateSet => {
                let (key, value) = deserialize_kv(payload)?;
                Some(TxEntry::StateSet { key, value })
            }
            WalEntryType::StateTransition => {
                let (key, from, to) = deserialize_transition(payload)?;
                Some(TxEntry::StateTransition { key, from, to })
            }
            WalEntryType::TraceRecord => Some(TxEntry::TraceRecord {
                span: payload.to_vec(),
            }),
            WalEntryType::RunCreate => Some(TxEntry::RunCreate {
                metadata: payload.to_vec(),
            }),
            WalEntryType::RunUpdate => Some(TxEntry::RunUpdate {
                metadata: payload.to_vec(),
            }),
            WalEntryType::RunBegin => Some(TxEntry::RunBegin {
                metadata: payload.to_vec(),
            }),
            WalEntryType::RunEnd => Some(TxEntry::RunEnd {
                metadata: payload.to_vec(),
            }),
            // Control entries are not transaction entries
            WalEntryType::TransactionCommit
            | WalEntryType::TransactionAbort
            | WalEntryType::SnapshotMarker => None,
        }
    }
}

/// Serialize key-value pair
///
/// Format: key_len (u32 LE) + key + value
fn serialize_kv(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + key.len() + value.len());
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    buf
}

/// Deserialize key-value pair
fn deserialize_kv(data: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    if data.len() < 4 {
        return None;
    }
    let key_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + key_len {
        return None;
    }
    let key = data[4..4 + key_len].to_vec();
    let value = data[4 + key_len..].to_vec();
    Some((key, value))
}

/// Serialize state transition (key, from, to)
///
/// Format: key_len (u32 LE) + key + from_len (u32 LE) + from + to
fn serialize_transition(key: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + key.len() + from.len() + to.len());
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&(from.len() as u32).to_le_bytes());
    buf.extend_from_slice(from);
    buf.extend_from_slice(to);
    buf
}

/// Deserialize state transition
fn deserialize_transition(data: &[u8]) -> Option<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    if data.len() < 4 {
        return None;
    }
    let key_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + key_len + 4 {
        return None;
    }
    let key = data[4..4 + key_len].to_vec();
    let from_offset = 4 + key_len;
    let from_len = u32::from_le_bytes([
        data[from_offset],
        data[from_offset + 1],
        data[from_offset + 2],
        data[from_offset + 3],
    ]) as usize;
    if data.len() < from_offset + 4 + from_len {
        return None;
    }
    let from = data[from_offset + 4..from_offset + 4 + from_len].to_vec();
    let to = data[from_offset + 4 + from_len..].to_vec();
    Some((key, from, to))
}
