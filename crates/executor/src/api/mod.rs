//! High-level typed wrapper for the Executor.
//!
//! The [`Strata`] struct provides a convenient Rust API that wraps the
//! [`Executor`] and [`Command`]/[`Output`] enums with typed method calls.
//!
//! ## Branch Context
//!
//! Strata maintains a "current branch" context, similar to how git maintains
//! a current branch. All data operations operate on the current branch.
//!
//! - Use `create_branch(name)` to create a new blank branch
//! - Use `set_branch(name)` to switch to an existing branch
//! - Use `current_branch()` to get the current branch name
//! - Use `list_branches()` to see all available branches
//! - Use `fork_branch(dest)` to copy the current branch to a new branch
//!
//! By default, Strata starts on the "default" branch.
//!
//! # Example
//!
//! ```text
//! use strata_executor::{Strata, Value};
//!
//! let mut db = Strata::open("/path/to/data")?;
//!
//! // Work on the default branch
//! db.kv_put("key", Value::String("hello".into()))?;
//!
//! // Create and switch to a different branch
//! db.create_branch("experiment-1")?;
//! db.set_branch("experiment-1")?;
//! db.kv_put("key", Value::String("different".into()))?;
//!
//! // Switch back to default
//! db.set_branch("default")?;
//! assert_eq!(db.kv_get("key")?, Some(Value::String("hello".into())));
//! ```

mod branch;
mod branches;
mod db;
mod event;
mod json;
mod kv;
mod state;
mod vector;

pub use branches::Branches;
pub use strata_engine::branch_ops::{
    BranchDiffEntry, BranchDiffResult, ConflictEntry, DiffSummary, ForkInfo, MergeInfo,
    MergeStrategy, SpaceDiff,
};

use std::path::Path;
use std::sync::Arc;

use strata_engine::{Database, ModelConfig};
use strata_security::{AccessMode, OpenOptions};

use std::sync::Once;

use crate::types::BranchId;
use crate::{Command, Error, Executor, Output, Result, Session};

/// Ensure vector recovery is registered before opening any database.
static VECTOR_RECOVERY_INIT: Once = Once::new();

fn ensure_vector_recovery() {
    VECTOR_RECOVERY_INIT.call_once(|| {
        strata_engine::register_vector_recovery();
    });
}

/// High-level typed wrapper for database operations.
///
/// `Strata` provides a convenient Rust API that wraps the executor's
/// command-based interface with typed method calls. It maintains a
/// "current branch" context that all data operations use.
///
/// ## Branch Context (git-like mental model)
///
/// - **Database** = repository (the whole storage)
/// - **Strata** = working directory (stateful view into the repo)
/// - **Branch** = branch (isolated namespace for data)
///
/// Use `create_branch()` to create new branches and `set_branch()` to switch between them.
pub struct Strata {
    executor: Executor,
    current_branch: BranchId,
    current_space: String,
    access_mode: AccessMode,
}

impl Strata {
    /// Open a database at the given path.
    ///
    /// This is the primary way to create a Strata instance. The database
    /// will be created if it doesn't exist. Opens in read-write mode.
    ///
    /// # Example
    ///
    /// ```text
    /// use strata_executor::{Strata, Value};
    ///
    /// let mut db = Strata::open("/var/data/myapp")?;
    /// db.kv_put("key", Value::String("hello".into()))?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Open a database at the given path with explicit options.
    ///
    /// Use this to open a database in read-only mode or with other
    /// configuration options.
    ///
    /// # Example
    ///
    /// ```text
    /// use strata_executor::{Strata, OpenOptions, AccessMode};
    ///
    /// let db = Strata::open_with("/var/data/myapp", OpenOptions::new().access_mode(AccessMode::ReadOnly))?;
    /// ```
    pub fn open_with<P: AsRef<Path>>(path: P, opts: OpenOptions) -> Result<Self> {
        ensure_vector_recovery();

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|e| Error::Internal {
            reason: format!("Failed to create data directory: {}", e),
        })?;

        // Read existing config (or defaults)
        let config_path =
            data_dir.join(strata_engine::database::config::CONFIG_FILE_NAME);
        strata_engine::database::config::StrataConfig::write_default_if_missing(&config_path)
            .map_err(|e| Error::Internal {
                reason: format!("Failed to write default config: {}", e),
            })?;
        let mut cfg = strata_engine::database::config::StrataConfig::from_file(&config_path)
            .map_err(|e| Error::Internal {
                reason: format!("Failed to read config: {}", e),
            })?;

        // Merge OpenOptions overrides into config
        if let Some(ref dur) = opts.durability {
            cfg.durability = dur.clone();
        }
        if let Some(enabled) = opts.auto_embed {
            cfg.auto_embed = enabled;
        }
        if let Some(ref endpoint) = opts.model_endpoint {
            let model = cfg.model.get_or_insert_with(|| ModelConfig {
                endpoint: String::new(),
                model: String::new(),
                api_key: None,
                timeout_ms: 5000,
            });
            model.endpoint = endpoint.clone();
        }
        if let Some(ref name) = opts.model_name {
            let model = cfg.model.get_or_insert_with(|| ModelConfig {
                endpoint: String::new(),
                model: String::new(),
                api_key: None,
                timeout_ms: 5000,
            });
            model.model = name.clone();
        }
        if let Some(ref key) = opts.model_api_key {
            if let Some(ref mut model) = cfg.model {
                model.api_key = Some(key.clone());
            }
        }
        if let Some(ms) = opts.model_timeout_ms {
            if let Some(ref mut model) = cfg.model {
                model.timeout_ms = ms;
            }
        }

        let db =
            Database::open_with_config(&data_dir, cfg).map_err(|e| Error::Internal {
                reason: format!("Failed to open database: {}", e),
            })?;

        let access_mode = opts.access_mode;
        let executor = Executor::new_with_mode(db, access_mode);

        match access_mode {
            AccessMode::ReadWrite => Self::ensure_default_branch(&executor)?,
            AccessMode::ReadOnly => Self::verify_default_branch(&executor)?,
        }

        Ok(Self {
            executor,
            current_branch: BranchId::default(),
            current_space: "default".to_string(),
            access_mode,
        })
    }

    /// Create an ephemeral in-memory database.
    ///
    /// Useful for testing. Data is not persisted and no disk files are created.
    ///
    /// # Example
    ///
    /// ```text
    /// let mut db = Strata::cache()?;
    /// db.kv_put("key", Value::Int(42))?;
    /// ```
    pub fn cache() -> Result<Self> {
        ensure_vector_recovery();
        let db = Database::cache().map_err(|e| Error::Internal {
            reason: format!("Failed to open cache database: {}", e),
        })?;
        let executor = Executor::new(db);

        // Ensure the default branch exists
        Self::ensure_default_branch(&executor)?;

        Ok(Self {
            executor,
            current_branch: BranchId::default(),
            current_space: "default".to_string(),
            access_mode: AccessMode::ReadWrite,
        })
    }

    /// Create a new independent handle to the same database.
    ///
    /// Each handle has its own branch context (starting on "default") and can
    /// be moved to a separate thread. This is the standard way to use Strata
    /// from multiple threads.
    ///
    /// # Example
    ///
    /// ```text
    /// let db = Strata::open("/data/myapp")?;
    /// let handle = db.new_handle()?;
    /// std::thread::spawn(move || {
    ///     handle.kv_put("key", Value::Int(1)).unwrap();
    /// });
    /// ```
    pub fn new_handle(&self) -> Result<Self> {
        let db = self.executor.primitives().db.clone();
        Self::from_database_with_mode(db, self.access_mode)
    }

    /// Create a new Strata instance from an existing database.
    ///
    /// Use this when you need more control over database configuration.
    /// For most cases, prefer [`Strata::open()`].
    pub fn from_database(db: Arc<Database>) -> Result<Self> {
        Self::from_database_with_mode(db, AccessMode::ReadWrite)
    }

    /// Create a new Strata instance from an existing database with a
    /// specific access mode.
    fn from_database_with_mode(db: Arc<Database>, access_mode: AccessMode) -> Result<Self> {
        ensure_vector_recovery();
        let executor = Executor::new_with_mode(db, access_mode);

        match access_mode {
            AccessMode::ReadWrite => Self::ensure_default_branch(&executor)?,
            AccessMode::ReadOnly => Self::verify_default_branch(&executor)?,
        }

        Ok(Self {
            executor,
            current_branch: BranchId::default(),
            current_space: "default".to_string(),
            access_mode,
        })
    }

    /// Ensures the "default" branch exists in the database, creating it if
    /// missing.
    fn ensure_default_branch(executor: &Executor) -> Result<()> {
        // Check if default branch exists
        match executor.execute(Command::BranchExists {
            branch: BranchId::default(),
        })? {
            Output::Bool(exists) => {
                if !exists {
                    // Create the default branch
                    executor.execute(Command::BranchCreate {
                        branch_id: Some("default".to_string()),
                        metadata: None,
                    })?;
                }
                Ok(())
            }
            _ => Err(Error::Internal {
                reason: "Unexpected output for BranchExists".into(),
            }),
        }
    }

    /// Verifies the "default" branch exists without attempting to create it.
    ///
    /// Used by read-only open to avoid issuing writes.
    fn verify_default_branch(executor: &Executor) -> Result<()> {
        // BranchExists is a read command, so the read-only guard won't fire.
        match executor.execute(Command::BranchExists {
            branch: BranchId::default(),
        })? {
            Output::Bool(true) => Ok(()),
            Output::Bool(false) => Err(Error::BranchNotFound {
                branch: "default".to_string(),
            }),
            _ => Err(Error::Internal {
                reason: "Unexpected output for BranchExists".into(),
            }),
        }
    }

    /// Get the underlying executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Returns the access mode of this database handle.
    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Get WAL durability counters for diagnostics.
    ///
    /// Returns `None` for cache (in-memory) databases.
    pub fn durability_counters(&self) -> Option<strata_engine::WalCounters> {
        self.executor.primitives().db.durability_counters()
    }

    /// Get a handle for branch management operations.
    ///
    /// The returned [`Branches`] handle provides the "power API" for branch
    /// management, including listing, creating, deleting, forking, diffing,
    /// and merging branches.
    ///
    /// # Example
    ///
    /// ```text
    /// // List all branches
    /// for branch in db.branches().list()? {
    ///     println!("Branch: {}", branch);
    /// }
    ///
    /// // Create a new branch
    /// db.branches().create("experiment")?;
    ///
    /// // Fork a branch
    /// db.branches().fork("default", "experiment-copy")?;
    /// ```
    pub fn branches(&self) -> Branches<'_> {
        Branches::new(&self.executor)
    }

    /// Create a new [`Session`] for interactive transaction support.
    ///
    /// The returned session wraps a fresh executor and can manage an
    /// optional open transaction across multiple `execute()` calls.
    /// The session inherits the access mode of this handle.
    pub fn session(&self) -> Session {
        Session::new_with_mode(self.executor.primitives().db.clone(), self.access_mode)
    }

    // =========================================================================
    // Branch Context
    // =========================================================================

    /// Get the current branch name.
    ///
    /// Returns the name of the branch that all data operations will use.
    pub fn current_branch(&self) -> &str {
        self.current_branch.as_str()
    }

    /// Switch to an existing branch.
    ///
    /// All subsequent data operations will use this branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch doesn't exist. Use `create_branch()` first
    /// to create a new branch.
    ///
    /// # Example
    ///
    /// ```text
    /// // Switch to an existing branch
    /// db.set_branch("my-experiment")?;
    /// db.kv_put("key", "value")?;  // Data goes to my-experiment
    ///
    /// // Switch back to default
    /// db.set_branch("default")?;
    /// ```
    pub fn set_branch(&mut self, branch_name: &str) -> Result<()> {
        // Check if branch exists
        if !self.branches().exists(branch_name)? {
            return Err(Error::BranchNotFound {
                branch: branch_name.to_string(),
            });
        }

        self.current_branch = BranchId::from(branch_name);
        Ok(())
    }

    /// Create a new blank branch.
    ///
    /// The new branch starts with no data. Stays on the current branch after creation.
    /// Use `set_branch()` to switch to the new branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch already exists.
    ///
    /// # Example
    ///
    /// ```text
    /// // Create a new branch
    /// db.create_branch("experiment")?;
    ///
    /// // Optionally switch to it
    /// db.set_branch("experiment")?;
    /// ```
    pub fn create_branch(&self, branch_name: &str) -> Result<()> {
        self.branches().create(branch_name)
    }

    /// Fork the current branch with all its data into a new branch.
    ///
    /// Copies all data (KV, State, Events, JSON, Vectors) from the current
    /// branch to the new branch. Stays on the current branch after forking.
    /// Use `set_branch()` to switch to the fork.
    ///
    /// # Example
    ///
    /// ```text
    /// // Fork current branch to "experiment"
    /// db.fork_branch("experiment")?;
    ///
    /// // Switch to the fork
    /// db.set_branch("experiment")?;
    /// // ... make changes without affecting original ...
    /// ```
    pub fn fork_branch(&self, destination: &str) -> Result<ForkInfo> {
        self.branches().fork(self.current_branch(), destination)
    }

    /// Compare two branches and return their differences.
    ///
    /// Returns a structured diff showing per-space added, removed, and
    /// modified entries between the two branches.
    pub fn diff_branches(&self, branch_a: &str, branch_b: &str) -> Result<BranchDiffResult> {
        self.branches().diff(branch_a, branch_b)
    }

    /// Merge data from source branch into target branch.
    ///
    /// See [`Branches::merge`] for details on merge strategies.
    pub fn merge_branches(
        &self,
        source: &str,
        target: &str,
        strategy: MergeStrategy,
    ) -> Result<MergeInfo> {
        self.branches().merge(source, target, strategy)
    }

    /// List all available branches.
    ///
    /// Returns a list of branch names.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        self.branches().list()
    }

    /// Delete a branch and all its data.
    ///
    /// **WARNING**: This is irreversible! All data in the branch will be deleted.
    ///
    /// # Errors
    ///
    /// - Returns an error if trying to delete the current branch
    /// - Returns an error if trying to delete the "default" branch
    pub fn delete_branch(&self, branch_name: &str) -> Result<()> {
        // Cannot delete the current branch
        if branch_name == self.current_branch.as_str() {
            return Err(Error::ConstraintViolation {
                reason: "Cannot delete the current branch. Switch to a different branch first."
                    .into(),
            });
        }

        self.branches().delete(branch_name)
    }

    /// Get the BranchId for use in commands.
    ///
    /// This is used internally by the data operation methods.
    pub(crate) fn branch_id(&self) -> Option<BranchId> {
        Some(self.current_branch.clone())
    }

    /// Get the space for use in commands.
    pub(crate) fn space_id(&self) -> Option<String> {
        Some(self.current_space.clone())
    }

    // =========================================================================
    // Space Context
    // =========================================================================

    /// Get the current space name.
    pub fn current_space(&self) -> &str {
        &self.current_space
    }

    /// Switch to a different space.
    ///
    /// All subsequent data operations will use this space.
    /// The "default" space always exists. Other spaces are created on first use.
    pub fn set_space(&mut self, space: &str) -> Result<()> {
        strata_core::validate_space_name(space).map_err(|reason| Error::InvalidInput { reason })?;
        self.current_space = space.to_string();
        Ok(())
    }

    /// List all spaces in the current branch.
    pub fn list_spaces(&self) -> Result<Vec<String>> {
        match self.executor.execute(Command::SpaceList {
            branch: self.branch_id(),
        })? {
            Output::SpaceList(spaces) => Ok(spaces),
            _ => Err(Error::Internal {
                reason: "Unexpected output for SpaceList".into(),
            }),
        }
    }

    /// Delete a space from the current branch.
    ///
    /// # Errors
    /// - Returns error if trying to delete the "default" space
    /// - Returns error if space is non-empty (unless force is true)
    pub fn delete_space(&self, space: &str) -> Result<()> {
        if space == "default" {
            return Err(Error::ConstraintViolation {
                reason: "Cannot delete the default space".into(),
            });
        }
        match self.executor.execute(Command::SpaceDelete {
            branch: self.branch_id(),
            space: space.to_string(),
            force: false,
        })? {
            Output::Unit => Ok(()),
            _ => Err(Error::Internal {
                reason: "Unexpected output for SpaceDelete".into(),
            }),
        }
    }

    /// Delete a space forcefully (even if non-empty).
    pub fn delete_space_force(&self, space: &str) -> Result<()> {
        if space == "default" {
            return Err(Error::ConstraintViolation {
                reason: "Cannot delete the default space".into(),
            });
        }
        match self.executor.execute(Command::SpaceDelete {
            branch: self.branch_id(),
            space: space.to_string(),
            force: true,
        })? {
            Output::Unit => Ok(()),
            _ => Err(Error::Internal {
                reason: "Unexpected output for SpaceDelete".into(),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
