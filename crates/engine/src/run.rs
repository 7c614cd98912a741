//! Run tracking and metadata management
//!
//! This module provides the RunTracker struct for tracking active agent runs.
//! Active runs are tracked in-memory for validation and fast lookup,
//! while run metadata is persisted in storage for durability.

use strata_core::error::Result;
use strata_core::types::RunId;
use strata_core::value::RunMetadataEntry;
use std::collections::HashMap;
use std::sync::RwLock;

/// Run tracking and metadata management
///
/// Tracks active runs in-memory for fast lookup and validation.
/// Thread-safe via RwLock for concurrent access.
///
/// # Thread Safety
///
/// The RunTracker uses RwLock to allow concurrent reads and exclusive writes.
/// Multiple threads can check if a run is active simultaneously, while
/// begin_run and end_run require exclusive access.
pub struct RunTracker {
    /// Active runs (in-memory)
    active_runs: RwLock<HashMap<RunId, RunMetadataEntry>>,
}

impl RunTracker {
    /// Create a new RunTracker
    pub fn new() -> Self {
        Self {
            active_runs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new run as active
    ///
    /// Adds the run metadata to the active runs map.
    /// The run_id is extracted from the metadata.
    ///
    /// # Arguments
    ///
    /// * `metadata` - The run metadata entry to register
    ///
    /// # Returns
    ///
    /// Ok(()) on success
    pub fn begin_run(&self, metadata: RunMetadataEntry) -> Result<()> {
        let mut active = self.active_runs.write().unwrap();
        active.insert(metadata.run_id, metadata);
        Ok(())
    }

    /// Mark a run as ended
    ///
    /// Removes the run from the active runs map and returns the metadata.
    ///
    /// # Arguments
    ///
    /// * `run_id` - The ID of the run to end
    ///
    /// # Returns
    ///
    /// Ok(Some(metadata)) if the run was active, Ok(None) if not found
    pub fn end_run(&self, run_id: RunId) -> Result<Option<RunMetadataEntry>> {
        let mut active = self.active_runs.write().unwrap();
        Ok(active.remove(&run_id))
    }

    /// Get metadata for an active run
    ///
    /// Returns a clone of the metadata if the run is active.
    ///
    /// # Arguments
    ///
    /// * `run_id` - The ID of the run to look up
    ///
    /// # Returns
    ///
    /// Some(metadata) if active, None if not found
    pub fn get_active(&self, run_id: RunId) -> Option<RunMetadataEntry> {
        let active = self.active_runs.read().unwrap();
        active.get(&run_id).cloned()
    }

    /// List all active run IDs
    ///
    /// # Returns
    ///
    /// Vector of all currently active run IDs
    pub fn list_active(&self) -> Vec<RunId> {
        let active = self.active_runs.read().unwrap();
        active.keys().copied().collect()
    }

    /// Check if a run is currently active
    ///
    /// # Arguments
    ///
    /// * `run_id` - The ID of the run to check
    ///
    /// # Returns
    ///
    /// true if the run is active, false otherwise
    pub fn is_active(&self, run_id: RunId) -> bool {
        let active = self.active_runs.read().unwrap();
        active.contains_key(&run_id)
    }

    /// Get the count of active runs
    ///
    /// # Returns
    ///
    /// Number of currently active runs
    pub fn active_count(&self) -> usize {
        let active = self.active_runs.read().unwrap();
        active.len()
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
