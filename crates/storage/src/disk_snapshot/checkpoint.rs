//! Checkpoint coordinator
//!
//! Coordinates snapshot creation with watermark tracking.
//! This is the main API for creating database checkpoints.

use std::path::{Path, PathBuf};

use crate::codec::StorageCodec;
use crate::disk_snapshot::{SnapshotSection, SnapshotWriter};
use crate::format::snapshot::primitive_tags;
use crate::format::watermark::{CheckpointInfo, SnapshotWatermark};
use crate::format::primitives::SnapshotSerializer;

/// Checkpoint coordinator
///
/// Manages the lifecycle of checkpoints:
/// 1. Tracks watermark state
/// 2. Serializes primitive data
/// 3. Creates crash-safe snapshots
/// 4. Updates watermark after successful checkpoint
pub struct CheckpointCoordinator {
    snapshot_writer: SnapshotWriter,
    serializer: SnapshotSerializer,
    watermark: SnapshotWatermark,
}

impl CheckpointCoordinator {
    /// Create a new checkpoint coordinator
    pub fn new(
        snapshots_dir: PathBuf,
        codec: Box<dyn StorageCodec>,
        database_uuid: [u8; 16],
    ) -> std::io::Result<Self> {
        let serializer_codec: Box<dyn StorageCodec> = Box::new(crate::codec::IdentityCodec);
        let snapshot_writer = SnapshotWriter::new(snapshots_dir, codec, database_uuid)?;
        let serializer = SnapshotSerializer::new(serializer_codec);

        Ok(CheckpointCoordinator {
            snapshot_writer,
            serializer,
            watermark: SnapshotWatermark::new(),
        })
    }

    /// Create a new checkpoint coordinator with existing watermark state
    pub fn with_watermark(
        snapshots_dir: PathBuf,
        codec: Box<dyn StorageCodec>,
        database_uuid: [u8; 16],
        watermark: SnapshotWatermark,
    ) -> std::io::Result<Self> {
        let serializer_codec: Box<dyn StorageCodec> = Box::new(crate::codec::IdentityCodec);
        let snapshot_writer = SnapshotWriter::new(snapshots_dir, codec, database_uuid)?;
        let serializer = SnapshotSerializer::new(serializer_codec);

        Ok(CheckpointCoordinator {
            snapshot_writer,
            serializer,
            watermark,
        })
    }

    /// Get the current watermark state
    pub fn watermark(&self) -> &SnapshotWatermark {
        &self.watermark
    }

    /// Get the snapshots directory
    pub fn snapshots_dir(&self) -> &Path {
        self.snapshot_writer.snapshots_dir()
    }

    /// Create a checkpoint with the provided primitive data
    ///
    /// This is the main checkpoint API. It:
    /// 1. Determines the next snapshot ID
    /// 2. Serializes all provided primitive sections
    /// 3. Creates a crash-safe snapshot
    /// 4. Updates the watermark on success
    ///
    /// Returns `CheckpointInfo` on success.
    pub fn checkpoint(
        &mut self,
        watermark_txn: u64,
        data: CheckpointData,
    ) -> Result<CheckpointInfo, CheckpointError> {
        let snapshot_id = self.watermark.next_snapshot_id();

        // Serialize all primitives
        let mut sections = Vec::new();

        if let Some(kv) = data.kv {
            sections.push(SnapshotSection::new(
                primitive_tags::KV,
                self.serializer.serialize_kv(&kv),
            ));
        }

        if let Some(events) = data.events {
            sections.push(SnapshotSection::new(
                primitive_tags::EVENT,
                self.serializer.serialize_events(&events),
            ));
        }

        if let Some(states) = data.states {
            sections.push(SnapshotSection::new(
                primitive_tags::STATE,
                self.serializer.serialize_states(&states),
            ));
        }

        if let Some(runs) = data.runs {
            sections.push(SnapshotSection::new(
                primitive_tags::RUN,
                self.serializer.serialize_runs(&runs),
            ));
        }

        if let Some(json) = data.json {
            sections.push(SnapshotSection::new(
                primitive_tags::JSON,
                self.serializer.serialize_json(&json),
            ));
        }

        if let Some(vectors) = data.vectors {
            sections.push(SnapshotSection::new(
                primitive_tags::VECTOR,
                self.serializer.serialize_vectors(&vectors),
            ));
        }

        // Create the snapshot
        let snapshot_info = self
            .snapshot_writer
            .create_snapshot(snapshot_id, watermark_txn, sections)
            .map_err(CheckpointError::Io)?;

        // Update watermark on success
        self.watermark
            .set(snapshot_id, watermark_txn, snapshot_info.timestamp);

        Ok(CheckpointInfo::new(
            watermark_txn,
            snapshot_id,
            snapshot_info.timestamp,
        ))
    }

    /// Clean up temporary files from failed checkpoints
    pub fn cleanup(&self) -> std::io::Result<usize> {
        self.snapshot_writer.cleanup_temp_files()
    }

    /// Set watermark state (for recovery)
    pub fn set_watermark(&mut self, watermark: SnapshotWatermark) {
        self.watermark = watermark;
    }
}

/// Data to be included in a checkpoint
///
/// Each field is optional - only non-None fields will be included in the snapshot.
#[derive(Debug, Default)]
pub struct CheckpointData {
    /// KV primitive entries
    pub kv: Option<Vec<crate::format::primitives::KvSnapshotEntry>>,
    /// Event primitive entries
    pub events: Option<Vec<crate::format::primitives::EventSnapshotEntry>>,
    /// State primitive entries
    pub states: Option<Vec<crate::format::primitives::StateSnapshotEntry>>,
    /// Run primitive entries
    pub runs: Option<Vec<crate::format::primitives::RunSnapshotEntry>>,
    /// JSON primitive entries
    pub json: Option<Vec<crate::format::primitives::JsonSnapshotEntry>>,
    /// Vector primitive entries
    pub vectors: Option<Vec<crate::format::primitives::VectorCollectionSnapshotEntry>>,
}

impl CheckpointData {
    /// Create empty checkpoint data
    pub fn new() -> Self {
        CheckpointData::default()
    }

    /// Set KV entries
    pub fn with_kv(mut self, entries: Vec<crate::format::primitives::KvSnapshotEntry>) -> Self {
        self.kv = Some(entries);
        self
    }

    /// Set Event entries
    pub fn with_events(
        mut self,
        entries: Vec<crate::format::primitives::EventSnapshotEntry>,
    ) -> Self {
        self.events = Some(entries);
        self
    }

    /// Set State entries
    pub fn with_states(
        mut self,
        entries: Vec<crate::format::primitives::StateSnapshotEntry>,
    ) -> Self {
        self.states = Some(entries);
        self
    }

    /// Set Run entries
    pub fn with_runs(mut self, entries: Vec<crate::format::primitives::RunSnapshotEntry>) -> Self {
        self.runs = Some(entries);
        self
    }

    /// Set JSON entries
    pub fn with_json(mut self, entries: Vec<crate::format::primitives::JsonSnapshotEntry>) -> Self {
        self.json = Some(entries);
        self
    }

    /// Set Vector entries
    pub fn with_vectors(
        mut self,
        entries: Vec<crate::format::primitives::VectorCollectionSnapshotEntry>,
    ) -> Self {
        self.vectors = Some(entries);
        self
    }
}

/// Errors that can occur during checkpoint creation
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// IO error during checkpoint
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
