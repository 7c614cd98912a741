//! Search manifest for persisting segmented index state
//!
//! The manifest (`search.manifest`) stores:
//! - Segment list (segment_id, doc_count, total_doc_len)
//! - Global DocIdMap (EntityRef ↔ u32)
//! - Global stats (total_docs, total_doc_len, next_segment_id)
//! - Per-segment tombstone sets (deleted doc_ids)
//!
//! Written atomically via temp + rename (same as vector mmap pattern).

use super::types::EntityRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Magic bytes for search manifest
const MANIFEST_MAGIC: &[u8; 4] = b"SMNF";
/// Current manifest version
const MANIFEST_VERSION: u32 = 1;

// ============================================================================
// Manifest Data (serializable)
// ============================================================================

/// Serializable representation of the entire search index state.
#[derive(Serialize, Deserialize)]
pub(crate) struct ManifestData {
    /// Format version
    pub version: u32,
    /// Total documents across all segments + active
    pub total_docs: u64,
    /// Total document length across all segments + active
    pub total_doc_len: u64,
    /// Next segment ID to assign
    pub next_segment_id: u64,
    /// Segment entries
    pub segments: Vec<SegmentManifestEntry>,
    /// Serialized DocIdMap: id_to_ref vec
    pub doc_id_map: Vec<EntityRef>,
    /// Global doc_lengths map (doc_id → doc_len), persists across seals
    /// for re-index detection and accurate total_doc_len on removal.
    #[serde(default)]
    pub doc_lengths: Vec<Option<u32>>,
}

/// Manifest entry for a single sealed segment.
#[derive(Serialize, Deserialize)]
pub(crate) struct SegmentManifestEntry {
    /// Unique segment identifier
    pub segment_id: u64,
    /// Number of documents in this segment
    pub doc_count: u32,
    /// Total document length in this segment
    pub total_doc_len: u64,
    /// Set of tombstoned (deleted) doc_ids
    pub tombstones: HashSet<u32>,
}

// ============================================================================
// Read / Write
// ============================================================================

/// Write manifest data to a file atomically (temp + rename).
pub(crate) fn write_manifest(path: &Path, data: &ManifestData) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    // Serialize with MessagePack
    let payload = rmp_serde::to_vec(data)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("serialize error: {}", e)))?;

    // Build final buffer: magic + version + payload
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(MANIFEST_MAGIC);
    buf.extend_from_slice(&MANIFEST_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload);

    // Atomic write: temp + fsync + rename
    let tmp_path = path.with_extension("manifest.tmp");
    {
        use std::io::Write;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load manifest data from a file.
pub(crate) fn load_manifest(path: &Path) -> io::Result<ManifestData> {
    let buf = std::fs::read(path)?;
    if buf.len() < 8 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "manifest too small",
        ));
    }
    if &buf[0..4] != MANIFEST_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "bad manifest magic",
        ));
    }
    let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if version != MANIFEST_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported manifest version {}", version),
        ));
    }
    let data: ManifestData = rmp_serde::from_slice(&buf[8..])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("decode error: {}", e)))?;
    Ok(data)
}

// ============================================================================
// Tests
// ============================================================================
