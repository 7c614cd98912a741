//! Snapshot file format
//!
//! Snapshots are named `snap-NNNNNN.chk` where NNNNNN is zero-padded.
//! Each snapshot has a 64-byte header followed by primitive sections.
//!
//! # File Structure
//!
//! ```text
//! +------------------+ 0
//! | SnapshotHeader   | 64 bytes
//! +------------------+ 64
//! | Codec ID         | variable (header.codec_id_len bytes)
//! +------------------+
//! | Section 1        | SectionHeader + data
//! +------------------+
//! | Section 2        | SectionHeader + data
//! +------------------+
//! | ...              |
//! +------------------+
//! | Footer CRC32     | 4 bytes
//! +------------------+
//! ```

use std::path::{Path, PathBuf};

/// Magic bytes: "SNAP" (0x534E4150)
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"SNAP";

/// Snapshot format version for forward compatibility
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Snapshot header size in bytes
pub const SNAPSHOT_HEADER_SIZE: usize = 64;

/// Snapshot header (64 bytes)
///
/// The header contains essential metadata for snapshot validation and recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes: "SNAP" (0x534E4150)
    pub magic: [u8; 4],
    /// Format version for forward compatibility
    pub format_version: u32,
    /// Snapshot identifier (monotonically increasing)
    pub snapshot_id: u64,
    /// Watermark transaction ID (all txns <= this are included)
    pub watermark_txn: u64,
    /// Creation timestamp (microseconds since epoch)
    pub created_at: u64,
    /// Database UUID for validation
    pub database_uuid: [u8; 16],
    /// Codec ID length (followed by codec ID string in body)
    pub codec_id_len: u8,
    /// Reserved for future use
    pub reserved: [u8; 15],
}

impl SnapshotHeader {
    /// Create a new snapshot header
    pub fn new(
        snapshot_id: u64,
        watermark_txn: u64,
        created_at: u64,
        database_uuid: [u8; 16],
        codec_id_len: u8,
    ) -> Self {
        SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            format_version: SNAPSHOT_FORMAT_VERSION,
            snapshot_id,
            watermark_txn,
            created_at,
            database_uuid,
            codec_id_len,
            reserved: [0u8; 15],
        }
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; SNAPSHOT_HEADER_SIZE] {
        let mut bytes = [0u8; SNAPSHOT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.snapshot_id.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.watermark_txn.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.created_at.to_le_bytes());
        bytes[32..48].copy_from_slice(&self.database_uuid);
        bytes[48] = self.codec_id_len;
        bytes[49..64].copy_from_slice(&self.reserved);
        bytes
    }

    /// Parse header from bytes
    pub fn from_bytes(bytes: &[u8; SNAPSHOT_HEADER_SIZE]) -> Option<Self> {
        Some(SnapshotHeader {
            magic: bytes[0..4].try_into().ok()?,
            format_version: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
            snapshot_id: u64::from_le_bytes(bytes[8..16].try_into().ok()?),
            watermark_txn: u64::from_le_bytes(bytes[16..24].try_into().ok()?),
            created_at: u64::from_le_bytes(bytes[24..32].try_into().ok()?),
            database_uuid: bytes[32..48].try_into().ok()?,
            codec_id_len: bytes[48],
            reserved: bytes[49..64].try_into().ok()?,
        })
    }

    /// Validate the header
    pub fn validate(&self) -> Result<(), SnapshotHeaderError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotHeaderError::InvalidMagic {
                expected: SNAPSHOT_MAGIC,
                actual: self.magic,
            });
        }
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotHeaderError::UnsupportedVersion {
                version: self.format_version,
                max_supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

/// Errors that can occur when validating a snapshot header
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotHeaderError {
    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Expected magic bytes
        expected: [u8; 4],
        /// Actual magic bytes found
        actual: [u8; 4],
    },
    /// Unsupported format version
    #[error("Unsupported snapshot version {version}, max supported is {max_supported}")]
    UnsupportedVersion {
        /// Version found in the file
        version: u32,
        /// Maximum supported version
        max_supported: u32,
    },
}

/// Section header for each primitive type
///
/// Each section contains data for one primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Primitive type tag (see `primitive_tags` module)
    pub primitive_type: u8,
    /// Section data length in bytes
    pub data_len: u64,
}

impl SectionHeader {
    /// Section header size in bytes
    pub const SIZE: usize = 9;

    /// Create a new section header
    pub fn new(primitive_type: u8, data_len: u64) -> Self {
        SectionHeader {
            primitive_type,
            data_len,
        }
    }

    /// Serialize section header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.primitive_type;
        bytes[1..9].copy_from_slice(&self.data_len.to_le_bytes());
        bytes
    }

    /// Parse section header from bytes
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        SectionHeader {
            primitive_type: bytes[0],
            data_len: u64::from_le_bytes(bytes[1..9].try_into().unwrap()),
        }
    }
}

/// Primitive type tags for snapshot sections
pub mod primitive_tags {
    /// Key-Value store
    pub const KV: u8 = 0x01;
    /// Event log
    pub const EVENT: u8 = 0x02;
    /// State cell
    pub const STATE: u8 = 0x03;
    /// Run
    pub const RUN: u8 = 0x05;
    /// JSON document
    pub const JSON: u8 = 0x06;
    /// Vector embedding
    pub const VECTOR: u8 = 0x07;

    /// Get the tag name for display
    pub fn tag_name(tag: u8) -> &'static str {
        match tag {
            KV => "KV",
            EVENT => "Event",
            STATE => "State",
            RUN => "Run",
            JSON => "Json",
            VECTOR => "Vector",
            _ => "Unknown",
        }
    }

    /// All valid primitive tags in order
    pub const ALL_TAGS: [u8; 6] = [KV, EVENT, STATE, RUN, JSON, VECTOR];
}

/// Generate snapshot file path
///
/// Snapshots are named `snap-NNNNNN.chk` where NNNNNN is zero-padded.
pub fn snapshot_path(dir: &Path, snapshot_id: u64) -> PathBuf {
    dir.join(format!("snap-{:06}.chk", snapshot_id))
}

/// Parse snapshot ID from file name
///
/// Returns None if the file name doesn't match the expected format.
pub fn parse_snapshot_id(file_name: &str) -> Option<u64> {
    if !file_name.starts_with("snap-") || !file_name.ends_with(".chk") {
        return None;
    }
    let id_str = &file_name[5..file_name.len() - 4];
    id_str.parse().ok()
}

/// List all snapshot files in a directory, sorted by ID
pub fn list_snapshots(dir: &Path) -> std::io::Result<Vec<(u64, PathBuf)>> {
    let mut snapshots = Vec::new();

    if !dir.exists() {
        return Ok(snapshots);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if let Some(id) = parse_snapshot_id(&file_name) {
            snapshots.push((id, entry.path()));
        }
    }

    snapshots.sort_by_key(|(id, _)| *id);
    Ok(snapshots)
}

/// Find the latest snapshot in a directory
pub fn find_latest_snapshot(dir: &Path) -> std::io::Result<Option<(u64, PathBuf)>> {
    let snapshots = list_snapshots(dir)?;
    Ok(snapshots.into_iter().last())
}
