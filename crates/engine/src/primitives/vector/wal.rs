//! Vector WAL Payloads and Replay
//!
//! This module provides WAL payload types and replay logic for vector operations.
//!
//! ## Design Notes
//!
//! 1. **Transaction-Aware Replay**: WAL replay is handled by the global WAL replayer
//!    which groups entries by transaction ID, only applies committed transactions,
//!    and respects transaction ordering. The vector replayer does NOT need to check
//!    transaction boundaries.
//!
//! 2. **Embedding Storage**: TEMPORARY FORMAT - Full embeddings are stored in WAL
//!    payloads. This bloats WAL size (~3KB per 768-dim vector) but is correct.
//!    future versions may optimize with external embedding storage or delta encoding.
//!
//! 3. **Replay vs Normal Operations**: replay_* methods do NOT write to WAL (they are
//!    replaying from WAL). Normal operations use the VectorStore methods which write WAL.

use crate::primitives::vector::{VectorConfig, VectorConfigSerde, VectorError, VectorId, VectorResult};
use strata_core::{EntityRef, RunId};
use serde::{Deserialize, Serialize};

// ============================================================================
// WAL Entry Type Constants (0x70-0x7F range)
// ============================================================================

/// WAL entry type for vector collection creation
pub const VECTOR_COLLECTION_CREATE: u8 = 0x70;
/// WAL entry type for vector collection deletion
pub const VECTOR_COLLECTION_DELETE: u8 = 0x71;
/// WAL entry type for vector upsert
pub const VECTOR_UPSERT: u8 = 0x72;
/// WAL entry type for vector deletion
pub const VECTOR_DELETE: u8 = 0x73;

// ============================================================================
// WAL Payload Structs
// ============================================================================

/// WAL payload for collection creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalVectorCollectionCreate {
    /// Run ID for this collection
    pub run_id: RunId,
    /// Collection name
    pub collection: String,
    /// Collection configuration
    pub config: VectorConfigSerde,
    /// Timestamp of operation (microseconds since epoch)
    pub timestamp: u64,
}

/// WAL payload for collection deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalVectorCollectionDelete {
    /// Run ID for this collection
    pub run_id: RunId,
    /// Collection name
    pub collection: String,
    /// Timestamp of operation (microseconds since epoch)
    pub timestamp: u64,
}

/// WAL payload for vector upsert
///
/// WARNING: TEMPORARY FORMAT
/// This payload contains the full embedding, which:
/// - Bloats WAL size significantly (~3KB per 768-dim vector)
/// - Slows down recovery proportionally
///
/// This is acceptable (correctness over performance).
///
/// Future versions may change this to:
/// - Store embeddings in separate segment
/// - Use delta encoding for updates
/// - Reference external embedding storage
///
/// Any such change MUST be versioned and backward compatible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalVectorUpsert {
    /// Run ID for this collection
    pub run_id: RunId,
    /// Collection name
    pub collection: String,
    /// User-provided key
    pub key: String,
    /// Internal vector ID
    pub vector_id: u64,
    /// Full embedding (TEMPORARY: Full embedding in WAL)
    pub embedding: Vec<f32>,
    /// Optional metadata
    pub metadata: Option<serde_json::Value>,
    /// Timestamp of operation (microseconds since epoch)
    pub timestamp: u64,
    /// Optional reference to source document (e.g., JSON doc, KV entry)
    ///
    /// Used by internal search infrastructure to link embeddings back to
    /// their source documents for hydration during search result assembly.
    /// Backwards compatible: old WAL entries without this field will deserialize as None.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<EntityRef>,
}

/// WAL payload for vector deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalVectorDelete {
    /// Run ID for this collection
    pub run_id: RunId,
    /// Collection name
    pub collection: String,
    /// User-provided key
    pub key: String,
    /// Internal vector ID
    pub vector_id: u64,
    /// Timestamp of operation (microseconds since epoch)
    pub timestamp: u64,
}

// ============================================================================
// Serialization/Deserialization
// ============================================================================

impl WalVectorCollectionCreate {
    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> VectorResult<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| VectorError::Serialization(e.to_string()))
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> VectorResult<Self> {
        rmp_serde::from_slice(data).map_err(|e| VectorError::Serialization(e.to_string()))
    }
}

impl WalVectorCollectionDelete {
    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> VectorResult<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| VectorError::Serialization(e.to_string()))
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> VectorResult<Self> {
        rmp_serde::from_slice(data).map_err(|e| VectorError::Serialization(e.to_string()))
    }
}

impl WalVectorUpsert {
    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> VectorResult<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| VectorError::Serialization(e.to_string()))
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> VectorResult<Self> {
        rmp_serde::from_slice(data).map_err(|e| VectorError::Serialization(e.to_string()))
    }
}

impl WalVectorDelete {
    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> VectorResult<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| VectorError::Serialization(e.to_string()))
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> VectorResult<Self> {
        rmp_serde::from_slice(data).map_err(|e| VectorError::Serialization(e.to_string()))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Get current time in microseconds since Unix epoch
///
/// Returns 0 if system clock is before Unix epoch (clock went backwards).
pub fn now_micros() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Create a WalVectorCollectionCreate payload
pub fn create_wal_collection_create(
    run_id: RunId,
    collection: &str,
    config: &VectorConfig,
) -> WalVectorCollectionCreate {
    WalVectorCollectionCreate {
        run_id,
        collection: collection.to_string(),
        config: VectorConfigSerde::from(config),
        timestamp: now_micros(),
    }
}

/// Create a WalVectorCollectionDelete payload
pub fn create_wal_collection_delete(run_id: RunId, collection: &str) -> WalVectorCollectionDelete {
    WalVectorCollectionDelete {
        run_id,
        collection: collection.to_string(),
        timestamp: now_micros(),
    }
}

/// Create a WalVectorUpsert payload
pub fn create_wal_upsert(
    run_id: RunId,
    collection: &str,
    key: &str,
    vector_id: VectorId,
    embedding: &[f32],
    metadata: Option<serde_json::Value>,
) -> WalVectorUpsert {
    WalVectorUpsert {
        run_id,
        collection: collection.to_string(),
        key: key.to_string(),
        vector_id: vector_id.as_u64(),
        embedding: embedding.to_vec(),
        metadata,
        timestamp: now_micros(),
        source_ref: None,
    }
}

/// Create a WalVectorUpsert payload with a source reference
///
/// Use this when the embedding is derived from another entity (e.g., a JSON document)
/// and you want to maintain a link back to the source for search result hydration.
pub fn create_wal_upsert_with_source(
    run_id: RunId,
    collection: &str,
    key: &str,
    vector_id: VectorId,
    embedding: &[f32],
    metadata: Option<serde_json::Value>,
    source_ref: Option<EntityRef>,
) -> WalVectorUpsert {
    WalVectorUpsert {
        run_id,
        collection: collection.to_string(),
        key: key.to_string(),
        vector_id: vector_id.as_u64(),
        embedding: embedding.to_vec(),
        metadata,
        timestamp: now_micros(),
        source_ref,
    }
}

/// Create a WalVectorDelete payload
pub fn create_wal_delete(
    run_id: RunId,
    collection: &str,
    key: &str,
    vector_id: VectorId,
) -> WalVectorDelete {
    WalVectorDelete {
        run_id,
        collection: collection.to_string(),
        key: key.to_string(),
        vector_id: vector_id.as_u64(),
        timestamp: now_micros(),
    }
}

// ============================================================================
// VectorWalReplayer
// ============================================================================

use crate::primitives::vector::{DistanceMetric, VectorStore};

/// Replayer for Vector WAL entries
///
/// Applies WAL entries to VectorStore during recovery.
/// DOES NOT write new WAL entries (that would cause infinite loops).
pub struct VectorWalReplayer<'a> {
    store: &'a VectorStore,
}

impl<'a> VectorWalReplayer<'a> {
    /// Create a new replayer for the given store
    pub fn new(store: &'a VectorStore) -> Self {
        VectorWalReplayer { store }
    }

    /// Apply a WAL entry
    ///
    /// Deserializes the payload and calls the appropriate replay_* method.
    ///
    /// # Arguments
    ///
    /// * `entry_type` - WAL entry type byte (0x70-0x73 for vector operations)
    /// * `payload` - Serialized WAL payload
    pub fn apply(&self, entry_type: u8, payload: &[u8]) -> VectorResult<()> {
        match entry_type {
            VECTOR_COLLECTION_CREATE => {
                let wal = WalVectorCollectionCreate::from_bytes(payload)?;
                let config = VectorConfig {
                    dimension: wal.config.dimension,
                    metric: DistanceMetric::from_byte(wal.config.metric).ok_or_else(|| {
                        VectorError::Serialization(format!("Invalid metric: {}", wal.config.metric))
                    })?,
                    // Use persisted storage_dtype, default to F32 for backward compatibility
                    storage_dtype: crate::primitives::vector::StorageDtype::from_byte(wal.config.storage_dtype)
                        .unwrap_or(crate::primitives::vector::StorageDtype::F32),
                };
                self.store
                    .replay_create_collection(wal.run_id, &wal.collection, config)
            }
            VECTOR_COLLECTION_DELETE => {
                let wal = WalVectorCollectionDelete::from_bytes(payload)?;
                self.store
                    .replay_delete_collection(wal.run_id, &wal.collection)
            }
            VECTOR_UPSERT => {
                let wal = WalVectorUpsert::from_bytes(payload)?;
                self.store.replay_upsert(
                    wal.run_id,
                    &wal.collection,
                    &wal.key,
                    VectorId::new(wal.vector_id),
                    &wal.embedding,
                    wal.metadata,
                    wal.source_ref,
                )
            }
            VECTOR_DELETE => {
                let wal = WalVectorDelete::from_bytes(payload)?;
                self.store.replay_delete(
                    wal.run_id,
                    &wal.collection,
                    &wal.key,
                    VectorId::new(wal.vector_id),
                )
            }
            _ => {
                // Not a vector entry type - skip silently
                Ok(())
            }
        }
    }
}
