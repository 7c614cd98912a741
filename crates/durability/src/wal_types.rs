//! WAL Entry Types and Envelope Format
//!
//! This module implements the WAL entry format with self-validating entries:
//!
//! ## Entry Format
//!
//! ```text
//! +----------------+
//! | Length (u32)   |  Total bytes after this field (type+version+txid+payload+crc)
//! +----------------+
//! | Type (u8)      |  Entry type from registry
//! +----------------+
//! | Version (u8)   |  Format version for this entry type
//! +----------------+
//! | TxId (16)      |  Transaction ID (UUID, nil for non-transactional)
//! +----------------+
//! | Payload        |  Type-specific data
//! +----------------+
//! | CRC32 (u32)    |  Checksum of Type + Version + TxId + Payload
//! +----------------+
//! ```
//!
//! ## Key Features
//!
//! 1. **Version field**: Enables format evolution for each entry type
//! 2. **TxId in envelope**: Groups entries by transaction for atomic recovery
//! 3. **Explicit transaction framing**: Commit marker required for visibility
//!
//! ## Why This Format
//!
//! - **Transaction grouping**: Recovery can group entries by tx_id without deserializing payload
//! - **Format evolution**: Version field enables backward-compatible changes
//! - **Self-validating**: CRC32 detects corruption
//! - **Prefix-consistent recovery**: Only committed transactions are visible

use crate::wal_entry_types::{WalEntryType, WalEntryTypeError};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Transaction ID
// ============================================================================

/// Transaction ID for grouping WAL entries
///
/// Every data mutation entry includes a TxId to enable:
/// - Atomic recovery (either all entries with tx_id are visible, or none)
/// - Transaction framing (entries without commit marker are discarded)
/// - Efficient grouping during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(Uuid);

impl TxId {
    /// Create a new unique transaction ID
    pub fn new() -> Self {
        TxId(Uuid::new_v4())
    }

    /// Create a nil transaction ID (for non-transactional entries)
    pub fn nil() -> Self {
        TxId(Uuid::nil())
    }

    /// Check if this is a nil transaction ID
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Convert to bytes (16 bytes)
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        TxId(Uuid::from_bytes(bytes))
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TxId {
    fn from(uuid: Uuid) -> Self {
        TxId(uuid)
    }
}

impl From<TxId> for Uuid {
    fn from(tx_id: TxId) -> Self {
        tx_id.0
    }
}

// ============================================================================
// WAL Entry Errors
// ============================================================================

/// Errors that can occur during WAL entry operations
#[derive(Debug, Error)]
pub enum WalEntryError {
    /// Entry too short to be valid
    #[error("WAL entry too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected bytes
        expected: usize,
        /// Actual bytes received
        actual: usize,
    },

    /// Entry length exceeds maximum allowed size
    #[error("WAL entry too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Actual size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// CRC32 checksum mismatch (corruption detected)
    #[error(
        "CRC32 checksum mismatch at offset {offset}: expected 0x{expected:08X}, got 0x{actual:08X}"
    )]
    ChecksumMismatch {
        /// File offset where corruption was detected
        offset: u64,
        /// Expected checksum
        expected: u32,
        /// Actual checksum
        actual: u32,
    },

    /// Invalid entry type
    #[error("Invalid entry type: {0}")]
    InvalidEntryType(#[from] WalEntryTypeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error at offset {offset}: {message}")]
    Deserialization {
        /// File offset
        offset: u64,
        /// Error message
        message: String,
    },
}

// ============================================================================
// WAL Entry
// ============================================================================

/// Maximum WAL entry size (16 MB)
pub const MAX_WAL_ENTRY_SIZE: usize = 16 * 1024 * 1024;

/// Minimum valid entry size: type(1) + version(1) + txid(16) + crc(4) = 22 bytes
pub const MIN_WAL_ENTRY_SIZE: usize = 1 + 1 + 16 + 4;

/// Current format version for WAL entries
pub const WAL_FORMAT_VERSION: u8 = 1;

/// WAL entry with envelope format
///
/// This is the self-validating entry format:
/// - Entry type identifies the operation
/// - Version enables format evolution
/// - TxId groups entries for atomic recovery
/// - Payload contains operation-specific data
/// - CRC32 ensures integrity
#[derive(Debug, Clone, PartialEq)]
pub struct WalEntry {
    /// Entry type from the registry
    pub entry_type: WalEntryType,

    /// Format version for this entry type
    pub version: u8,

    /// Transaction ID (nil for non-transactional entries like snapshot markers)
    pub tx_id: TxId,

    /// Payload (type-specific serialized data)
    pub payload: Vec<u8>,
}

impl WalEntry {
    /// Create a new WAL entry
    pub fn new(entry_type: WalEntryType, tx_id: TxId, payload: Vec<u8>) -> Self {
        WalEntry {
            entry_type,
            version: WAL_FORMAT_VERSION,
            tx_id,
            payload,
        }
    }

    /// Create a transaction commit marker
    pub fn commit_marker(tx_id: TxId) -> Self {
        WalEntry {
            entry_type: WalEntryType::TransactionCommit,
            version: WAL_FORMAT_VERSION,
            tx_id,
            payload: vec![],
        }
    }

    /// Create a transaction abort marker
    pub fn abort_marker(tx_id: TxId) -> Self {
        WalEntry {
            entry_type: WalEntryType::TransactionAbort,
            version: WAL_FORMAT_VERSION,
            tx_id,
            payload: vec![],
        }
    }

    /// Create a snapshot marker
    pub fn snapshot_marker(snapshot_id: Uuid, wal_offset: u64) -> Self {
        let mut payload = Vec::with_capacity(24);
        payload.extend_from_slice(snapshot_id.as_bytes());
        payload.extend_from_slice(&wal_offset.to_le_bytes());

        WalEntry {
            entry_type: WalEntryType::SnapshotMarker,
            version: WAL_FORMAT_VERSION,
            tx_id: TxId::nil(),
            payload,
        }
    }

    /// Check if this is a control entry (commit, abort, snapshot)
    pub fn is_control(&self) -> bool {
        self.entry_type.is_control()
    }

    /// Check if this is a transaction boundary (commit or abort)
    pub fn is_transaction_boundary(&self) -> bool {
        self.entry_type.is_transaction_boundary()
    }

    /// Serialize entry to bytes with envelope and CRC32
    ///
    /// Format:
    /// ```text
    /// [length: u32][type: u8][version: u8][tx_id: 16][payload: N][crc32: u32]
    /// ```
    ///
    /// CRC32 is computed over [type][version][tx_id][payload].
    pub fn serialize(&self) -> Result<Vec<u8>, WalEntryError> {
        // Build content (everything that CRC covers)
        let mut content = Vec::with_capacity(1 + 1 + 16 + self.payload.len());
        content.push(self.entry_type as u8);
        content.push(self.version);
        content.extend_from_slice(&self.tx_id.to_bytes());
        content.extend_from_slice(&self.payload);

        // Compute CRC32
        let mut hasher = Hasher::new();
        hasher.update(&content);
        let crc = hasher.finalize();

        // Total length: content + crc(4)
        let total_len = content.len() + 4;

        // Check size limit
        if total_len > MAX_WAL_ENTRY_SIZE {
            return Err(WalEntryError::TooLarge {
                size: total_len,
                max: MAX_WAL_ENTRY_SIZE,
            });
        }

        // Build final buffer: [length][content][crc]
        let mut buf = Vec::with_capacity(4 + total_len);
        buf.write_all(&(total_len as u32).to_le_bytes())
            .map_err(|e| WalEntryError::Serialization(e.to_string()))?;
        buf.write_all(&content)
            .map_err(|e| WalEntryError::Serialization(e.to_string()))?;
        buf.write_all(&crc.to_le_bytes())
            .map_err(|e| WalEntryError::Serialization(e.to_string()))?;

        Ok(buf)
    }

    /// Deserialize entry from bytes with CRC32 validation
    ///
    /// # Arguments
    ///
    /// * `data` - Buffer containing the serialized entry
    /// * `offset` - File offset for error reporting
    ///
    /// # Returns
    ///
    /// * `Ok((WalEntry, usize))` - Decoded entry and bytes consumed
    /// * `Err(WalEntryError)` - If validation or parsing fails
    pub fn deserialize(data: &[u8], offset: u64) -> Result<(Self, usize), WalEntryError> {
        // Need at least 4 bytes for length
        if data.len() < 4 {
            return Err(WalEntryError::TooShort {
                expected: 4,
                actual: data.len(),
            });
        }

        // Read length
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[0..4]);
        let total_len = u32::from_le_bytes(len_bytes) as usize;

        // Validate minimum length
        if total_len < MIN_WAL_ENTRY_SIZE {
            return Err(WalEntryError::TooShort {
                expected: MIN_WAL_ENTRY_SIZE,
                actual: total_len,
            });
        }

        // Validate maximum length
        if total_len > MAX_WAL_ENTRY_SIZE {
            return Err(WalEntryError::TooLarge {
                size: total_len,
                max: MAX_WAL_ENTRY_SIZE,
            });
        }

        // Check buffer has enough data
        let total_bytes = 4 + total_len;
        if data.len() < total_bytes {
            return Err(WalEntryError::TooShort {
                expected: total_bytes,
                actual: data.len(),
            });
        }

        // Extract content and CRC
        let content_end = 4 + total_len - 4; // Everything before CRC
        let content = &data[4..content_end];

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&data[content_end..total_bytes]);
        let expected_crc = u32::from_le_bytes(crc_bytes);

        // Validate CRC
        let mut hasher = Hasher::new();
        hasher.update(content);
        let actual_crc = hasher.finalize();

        if expected_crc != actual_crc {
            return Err(WalEntryError::ChecksumMismatch {
                offset,
                expected: expected_crc,
                actual: actual_crc,
            });
        }

        // Parse content
        if content.len() < 18 {
            // type(1) + version(1) + tx_id(16)
            return Err(WalEntryError::Deserialization {
                offset,
                message: format!("Content too short: {} bytes", content.len()),
            });
        }

        let entry_type = WalEntryType::try_from(content[0])?;
        let version = content[1];

        let mut tx_id_bytes = [0u8; 16];
        tx_id_bytes.copy_from_slice(&content[2..18]);
        let tx_id = TxId::from_bytes(tx_id_bytes);

        let payload = content[18..].to_vec();

        Ok((
            WalEntry {
                entry_type,
                version,
                tx_id,
                payload,
            },
            total_bytes,
        ))
    }

    /// Get the serialized size of this entry
    pub fn serialized_size(&self) -> usize {
        // length(4) + type(1) + version(1) + tx_id(16) + payload + crc(4)
        4 + 1 + 1 + 16 + self.payload.len() + 4
    }
}

// ============================================================================
// Tests
// ============================================================================
