//! TraceStore: Structured reasoning traces with indexing
//!
//! ## Design Principles
//!
//! 1. **Structured Types**: Rich trace types (ToolCall, Decision, Query, etc.)
//! 2. **Parent-Child Relationships**: Nested traces for hierarchical reasoning
//! 3. **Secondary Indices**: Efficient queries by type, tag, parent, time
//! 4. **Tree Reconstruction**: Build trace hierarchies for visualization
//!
//! ## Performance Warning
//!
//! TraceStore is optimized for DEBUGGABILITY, not ingestion throughput.
//! Each trace creates 3-4 secondary index entries (write amplification).
//!
//! Designed for: reasoning traces (tens to hundreds per run)
//! NOT designed for: telemetry (thousands per second)
//!
//! For high-volume tracing, consider batching or sampling.
//!
//! ## Key Design
//!
//! - TypeTag: Trace (0x04)
//! - Primary key format: `<namespace>:<TypeTag::Trace>:<trace_id>`
//! - Index key format: `<namespace>:<TypeTag::Trace>:__idx_{type}__{value}__{trace_id}`

use crate::extensions::TraceStoreExt;
use in_mem_concurrency::TransactionContext;
use strata_core::error::{Error, Result};
use strata_core::types::{Key, Namespace, RunId};
use strata_core::value::Value;
use in_mem_engine::Database;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ========== TraceType Enum (Story #185) ==========

/// Types of reasoning traces
///
/// Each variant captures different aspects of agent reasoning:
/// - ToolCall: External tool invocations
/// - Decision: Choice points with reasoning
/// - Query: Information lookups
/// - Thought: Internal reasoning
/// - Error: Error occurrences
/// - Custom: User-defined types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TraceType {
    /// External tool invocation
    ToolCall {
        /// Name of the tool invoked
        tool_name: String,
        /// Arguments passed to the tool
        arguments: Value,
        /// Result returned by the tool (if completed)
        result: Option<Value>,
        /// Duration in milliseconds (if measured)
        duration_ms: Option<u64>,
    },
    /// Decision point with options
    Decision {
        /// The question being decided
        question: String,
        /// Available options
        options: Vec<String>,
        /// The chosen option
        chosen: String,
        /// Reasoning for the choice (optional)
        reasoning: Option<String>,
    },
    /// Information query
    Query {
        /// Type of query (e.g., "database", "api", "search")
        query_type: String,
        /// The actual query
        query: String,
        /// Number of results returned (optional)
        results_count: Option<u32>,
    },
    /// Internal reasoning
    Thought {
        /// The thought content
        content: String,
        /// Confidence level 0.0-1.0 (optional)
        confidence: Option<f64>,
    },
    /// Error occurrence
    Error {
        /// Type of error
        error_type: String,
        /// Error message
        message: String,
        /// Whether the error is recoverable
        recoverable: bool,
    },
    /// User-defined trace type
    Custom {
        /// Custom type name
        name: String,
        /// Custom data
        data: Value,
    },
}

impl TraceType {
    /// Get the type name for indexing
    ///
    /// Returns a stable string identifier for the trace type.
    /// Custom types return their user-defined name.
    pub fn type_name(&self) -> &str {
        match self {
            TraceType::ToolCall { .. } => "ToolCall",
            TraceType::Decision { .. } => "Decision",
            TraceType::Query { .. } => "Query",
            TraceType::Thought { .. } => "Thought",
            TraceType::Error { .. } => "Error",
            TraceType::Custom { name, .. } => name,
        }
    }
}

// ========== Trace Struct (Story #185) ==========

/// A reasoning trace entry
///
/// Each trace represents a single unit of reasoning with:
/// - Unique identifier
/// - Optional parent for nesting
/// - Typed content
/// - Timestamp for ordering
/// - Tags for filtering
/// - Arbitrary metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    /// Unique trace ID (format: "trace-{uuid}")
    pub id: String,
    /// Parent trace ID (if nested)
    pub parent_id: Option<String>,
    /// Type of trace with type-specific data
    pub trace_type: TraceType,
    /// Creation timestamp (milliseconds since epoch)
    pub timestamp: i64,
    /// User-defined tags for filtering
    pub tags: Vec<String>,
    /// Additional metadata
    pub metadata: Value,
}

impl Trace {
    /// Generate a new trace ID
    ///
    /// Format: "trace-{uuid}" where uuid is a v4 UUID
    pub fn generate_id() -> String {
        format!("trace-{}", uuid::Uuid::new_v4())
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }
}

// ========== TraceTree Struct (Story #189) ==========

/// A trace with its children for tree visualization
///
/// Used by `get_tree()` to reconstruct the hierarchical
/// structure of traces from their parent-child relationships.
#[derive(Debug, Clone)]
pub struct TraceTree {
    /// The trace at this node
    pub trace: Trace,
    /// Child traces (recursively)
    pub children: Vec<TraceTree>,
}

// ========== Serialization Helpers ==========

/// Serialize a struct to Value::String for storage
fn to_stored_value<T: Serialize>(v: &T) -> Value {
    match serde_json::to_string(v) {
        Ok(s) => Value::String(s),
        Err(_) => Value::Null,
    }
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

// ========== TraceStore Core (Story #185) ==========

/// TraceStore primitive for structured reasoning traces
///
/// ## Design
///
/// TraceStore provides structured storage for agent reasoning traces.
/// It is a stateless facade over the Database engine, holding only
/// an `Arc<Database>` reference.
///
/// ## Performance Warning
///
/// Each trace write creates 3-4 secondary index entries:
/// - by-type index
/// - by-tag index (one per tag)
/// - by-parent index (if has parent)
/// - by-time index (hour bucket)
///
/// This write amplification is acceptable for debugging traces
/// (tens to hundreds per run) but NOT for high-volume telemetry.
///
/// ## Example
///
/// ```rust,ignore
/// use in_mem_primitives::{TraceStore, TraceType};
/// use strata_core::value::Value;
///
/// let ts = TraceStore::new(db.clone());
/// let run_id = RunId::new();
///
/// // Record a tool call trace
/// let trace_id = ts.record(
///     &run_id,
///     TraceType::ToolCall {
///         tool_name: "search".into(),
///         arguments: Value::Null,
///         result: None,
///         duration_ms: Some(42),
///     },
///     vec!["important".into()],
///     Value::Null,
/// )?;
///
/// // Query traces by type
/// let tool_calls = ts.query_by_type(&run_id, "ToolCall")?;
/// ```
#[derive(Clone)]
pub struct TraceStore {
    db: Arc<Database>,
}

impl TraceStore {
    /// Create new TraceStore instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the underlying database reference
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Build namespace for run-scoped operations
    fn namespace_for_run(&self, run_id: &RunId) -> Namespace {
        Namespace::for_run(*run_id)
    }

    /// Build key for trace by ID
    fn key_for(&self, run_id: &RunId, trace_id: &str) -> Key {
        Key::new_trace_with_id(self.namespace_for_run(run_id), trace_id)
    }

    // ========== Record Operations (Story #186) ==========

    /// Record a new trace
    ///
    /// Generates unique ID, writes trace and all secondary indices atomically.
    ///
    /// ## Returns
    /// The generated trace ID on success.
    ///
    /// ## Errors
    /// - `SerializationError` if trace cannot be serialized
    pub fn record(
        &self,
        run_id: &RunId,
        trace_type: TraceType,
        tags: Vec<String>,
        metadata: Value,
    ) -> Result<String> {
        self.record_with_options(run_id, None, trace_type, tags, metadata)
    }

    /// Record a child trace
    ///
    /// Parent must exist. Validates parent ID before recording.
    ///
    /// ## Returns
    /// The generated trace ID on success.
    ///
    /// ## Errors
    /// - `NotFound` if parent trace doesn't exist
    /// - `SerializationError` if trace cannot be serialized
    pub fn record_child(
        &self,
        run_id: &RunId,
        parent_id: &str,
        trace_type: TraceType,
        tags: Vec<String>,
        metadata: Value,
    ) -> Result<String> {
        self.record_with_options(
            run_id,
            Some(parent_id.to_string()),
            trace_type,
            tags,
            metadata,
        )
    }

    /// Record trace with full options
    ///
    /// Internal method that handles both root and child traces.
    fn record_with_options(
        &self,
        run_id: &RunId,
        parent_id: Option<String>,
        trace_type: TraceType,
        tags: Vec<String>,
        metadata: Value,
    ) -> Result<String> {
        let trace_id = Trace::generate_id();

        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);

            // Validate parent exists if provided
            if let Some(ref pid) = parent_id {
                let parent_key = Key::new_trace_with_id(ns.clone(), pid);
                if txn.get(&parent_key)?.is_none() {
                    return Err(Error::InvalidOperation(format!(
                        "Parent trace '{}' not found",
                        pid
                    )));
                }
            }

            let trace = Trace {
                id: trace_id.clone(),
                parent_id: parent_id.clone(),
                trace_type,
                timestamp: Trace::now(),
                tags: tags.clone(),
                metadata,
            };

            // Write primary trace
            let trace_key = Key::new_trace_with_id(ns.clone(), &trace_id);
            txn.put(trace_key, to_stored_value(&trace))?;

            // Write secondary indices (Story #187)
            Self::write_indices_internal(txn, &ns, &trace)?;

            Ok(trace_id)
        })
    }

    /// Get a trace by ID (FAST PATH)
    ///
    /// Bypasses full transaction overhead for read-only access.
    /// Uses direct snapshot read which maintains snapshot isolation.
    ///
    /// ## Returns
    /// - `Some(trace)` if found
    /// - `None` if not found
    ///
    /// ## Errors
    /// - `SerializationError` if trace cannot be deserialized
    pub fn get(&self, run_id: &RunId, trace_id: &str) -> Result<Option<Trace>> {
        use strata_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let key = self.key_for(run_id, trace_id);

        match snapshot.get(&key)? {
            Some(vv) => {
                let trace: Trace = from_stored_value(&vv.value)
                    .map_err(|e| Error::SerializationError(e.to_string()))?;
                Ok(Some(trace))
            }
            None => Ok(None),
        }
    }

    /// Get a trace by ID (with full transaction)
    ///
    /// Use this when you need transaction semantics.
    pub fn get_in_transaction(&self, run_id: &RunId, trace_id: &str) -> Result<Option<Trace>> {
        self.db.transaction(*run_id, |txn| {
            let key = self.key_for(run_id, trace_id);
            match txn.get(&key)? {
                Some(v) => {
                    let trace: Trace = from_stored_value(&v)
                        .map_err(|e| Error::SerializationError(e.to_string()))?;
                    Ok(Some(trace))
                }
                None => Ok(None),
            }
        })
    }

    /// Check if a trace exists (FAST PATH)
    ///
    /// Uses direct snapshot read which maintains snapshot isolation.
    pub fn exists(&self, run_id: &RunId, trace_id: &str) -> Result<bool> {
        use strata_core::traits::SnapshotView;

        let snapshot = self.db.storage().create_snapshot();
        let key = self.key_for(run_id, trace_id);
        Ok(snapshot.get(&key)?.is_some())
    }

    // ========== Secondary Indices (Story #187) ==========

    /// Write all secondary indices for a trace
    ///
    /// Called atomically within the same transaction as the primary write.
    /// Creates indices for:
    /// - by-type: trace type name
    /// - by-tag: each tag (multiple entries)
    /// - by-parent: parent ID (if has parent)
    /// - by-time: hour bucket for range queries
    fn write_indices_internal(
        txn: &mut TransactionContext,
        ns: &Namespace,
        trace: &Trace,
    ) -> Result<()> {
        // Index by type
        let type_index_key = Key::new_trace_index(
            ns.clone(),
            "by-type",
            trace.trace_type.type_name(),
            &trace.id,
        );
        txn.put(type_index_key, Value::String(trace.id.clone()))?;

        // Index by each tag
        for tag in &trace.tags {
            let tag_index_key = Key::new_trace_index(ns.clone(), "by-tag", tag, &trace.id);
            txn.put(tag_index_key, Value::String(trace.id.clone()))?;
        }

        // Index by parent (if has parent)
        if let Some(ref parent_id) = trace.parent_id {
            let parent_index_key =
                Key::new_trace_index(ns.clone(), "by-parent", parent_id, &trace.id);
            txn.put(parent_index_key, Value::String(trace.id.clone()))?;
        }

        // Index by time (hour bucket for range queries)
        let hour_bucket = trace.timestamp / (3600 * 1000); // Hour since epoch
        let time_index_key =
            Key::new_trace_index(ns.clone(), "by-time", &hour_bucket.to_string(), &trace.id);
        txn.put(time_index_key, Value::String(trace.id.clone()))?;

        Ok(())
    }

    /// Scan an index and return trace IDs
    ///
    /// Used internally by query methods to find traces matching criteria.
    fn scan_index(
        &self,
        run_id: &RunId,
        index_type: &str,
        index_value: &str,
    ) -> Result<Vec<String>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            // Create prefix key - empty trace_id gives us the prefix to scan
            let prefix = Key::new_trace_index(ns, index_type, index_value, "");

            let results = txn.scan_prefix(&prefix)?;
            Ok(results
                .into_iter()
                .filter_map(|(_, v)| {
                    if let Value::String(s) = v {
                        Some(s)
                    } else {
                        None
                    }
                })
                .collect())
        })
    }

    // ========== Query Operations (Story #188) ==========

    /// Query traces by type
    ///
    /// Returns all traces matching the given type name.
    /// Uses the by-type index for efficient lookup.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let tool_calls = ts.query_by_type(&run_id, "ToolCall")?;
    /// let decisions = ts.query_by_type(&run_id, "Decision")?;
    /// ```
    pub fn query_by_type(&self, run_id: &RunId, type_name: &str) -> Result<Vec<Trace>> {
        let ids = self.scan_index(run_id, "by-type", type_name)?;
        self.get_many(run_id, &ids)
    }

    /// Query traces by tag
    ///
    /// Returns all traces with the given tag.
    /// Uses the by-tag index for efficient lookup.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let important = ts.query_by_tag(&run_id, "important")?;
    /// ```
    pub fn query_by_tag(&self, run_id: &RunId, tag: &str) -> Result<Vec<Trace>> {
        let ids = self.scan_index(run_id, "by-tag", tag)?;
        self.get_many(run_id, &ids)
    }

    /// Query traces in a time range
    ///
    /// Returns all traces with timestamps in [start_ms, end_ms).
    /// Uses the by-time index with hour buckets for efficient lookup.
    ///
    /// Note: Results are filtered to exact time range after index lookup.
    ///
    /// ## Arguments
    /// - `start_ms`: Start timestamp (inclusive, milliseconds since epoch)
    /// - `end_ms`: End timestamp (exclusive, milliseconds since epoch)
    pub fn query_by_time(&self, run_id: &RunId, start_ms: i64, end_ms: i64) -> Result<Vec<Trace>> {
        let start_hour = start_ms / (3600 * 1000);
        let end_hour = end_ms / (3600 * 1000);

        let mut all_ids = Vec::new();
        for hour in start_hour..=end_hour {
            let ids = self.scan_index(run_id, "by-time", &hour.to_string())?;
            all_ids.extend(ids);
        }

        // Filter to exact time range
        let traces = self.get_many(run_id, &all_ids)?;
        Ok(traces
            .into_iter()
            .filter(|t| t.timestamp >= start_ms && t.timestamp < end_ms)
            .collect())
    }

    /// Get children of a trace
    ///
    /// Returns all traces that have the given trace as their parent.
    /// Uses the by-parent index for efficient lookup.
    pub fn get_children(&self, run_id: &RunId, parent_id: &str) -> Result<Vec<Trace>> {
        let ids = self.scan_index(run_id, "by-parent", parent_id)?;
        self.get_many(run_id, &ids)
    }

    /// Get multiple traces by IDs
    ///
    /// Internal helper for query methods.
    fn get_many(&self, run_id: &RunId, ids: &[String]) -> Result<Vec<Trace>> {
        let mut traces = Vec::new();
        for id in ids {
            if let Some(trace) = self.get(run_id, id)? {
                traces.push(trace);
            }
        }
        Ok(traces)
    }

    // ========== Tree Reconstruction (Story #189) ==========

    /// Build a trace tree from a root trace
    ///
    /// Recursively fetches all descendants of the given trace
    /// and builds a tree structure for visualization.
    ///
    /// ## Returns
    /// - `Some(tree)` if root trace exists
    /// - `None` if root trace not found
    pub fn get_tree(&self, run_id: &RunId, root_id: &str) -> Result<Option<TraceTree>> {
        let root = match self.get(run_id, root_id)? {
            Some(t) => t,
            None => return Ok(None),
        };

        Ok(Some(self.build_tree(run_id, root)?))
    }

    /// Recursively build trace tree
    fn build_tree(&self, run_id: &RunId, trace: Trace) -> Result<TraceTree> {
        let children = self.get_children(run_id, &trace.id)?;

        let child_trees: Vec<TraceTree> = children
            .into_iter()
            .map(|c| self.build_tree(run_id, c))
            .collect::<Result<Vec<_>>>()?;

        Ok(TraceTree {
            trace,
            children: child_trees,
        })
    }

    /// Get all root traces (traces without parents)
    ///
    /// Returns all traces that don't have a parent_id set.
    /// Useful for finding entry points into trace hierarchies.
    pub fn get_roots(&self, run_id: &RunId) -> Result<Vec<Trace>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            // Scan all traces (empty string prefix matches all trace keys)
            let prefix = Key::new_trace_with_id(ns, "trace-");

            let results = txn.scan_prefix(&prefix)?;
            let mut roots = Vec::new();

            for (_, v) in results {
                let trace: Trace =
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?;
                if trace.parent_id.is_none() {
                    roots.push(trace);
                }
            }

            Ok(roots)
        })
    }

    /// List all traces for a run
    ///
    /// Returns all traces without filtering. Use query methods
    /// for filtered access.
    pub fn list(&self, run_id: &RunId) -> Result<Vec<Trace>> {
        self.db.transaction(*run_id, |txn| {
            let ns = self.namespace_for_run(run_id);
            let prefix = Key::new_trace_with_id(ns, "trace-");

            let results = txn.scan_prefix(&prefix)?;
            let mut traces = Vec::new();

            for (_, v) in results {
                let trace: Trace =
                    from_stored_value(&v).map_err(|e| Error::SerializationError(e.to_string()))?;
                traces.push(trace);
            }

            Ok(traces)
        })
    }

    /// Count traces for a run
    pub fn count(&self, run_id: &RunId) -> Result<usize> {
        Ok(self.list(run_id)?.len())
    }
}

// ========== TraceStoreExt Implementation (Story #190) ==========

impl TraceStoreExt for TransactionContext {
    fn trace_record(&mut self, trace_type: &str, metadata: Value) -> Result<String> {
        let trace_id = Trace::generate_id();
        let ns = Namespace::for_run(self.run_id);

        let trace = Trace {
            id: trace_id.clone(),
            parent_id: None,
            trace_type: TraceType::Custom {
                name: trace_type.to_string(),
                data: metadata.clone(),
            },
            timestamp: Trace::now(),
            tags: vec![],
            metadata,
        };

        // Write primary trace
        let key = Key::new_trace_with_id(ns.clone(), &trace_id);
        self.put(key, to_stored_value(&trace))?;

        // Write type index
        let type_index = Key::new_trace_index(ns.clone(), "by-type", trace_type, &trace_id);
        self.put(type_index, Value::String(trace_id.clone()))?;

        // Write time index
        let hour_bucket = trace.timestamp / (3600 * 1000);
        let time_index = Key::new_trace_index(ns, "by-time", &hour_bucket.to_string(), &trace_id);
        self.put(time_index, Value::String(trace_id.clone()))?;

        Ok(trace_id)
    }

    fn trace_record_child(
        &mut self,
        parent_id: &str,
        trace_type: &str,
        metadata: Value,
    ) -> Result<String> {
        let ns = Namespace::for_run(self.run_id);

        // Validate parent exists
        let parent_key = Key::new_trace_with_id(ns.clone(), parent_id);
        if self.get(&parent_key)?.is_none() {
            return Err(Error::InvalidOperation(format!(
                "Parent trace '{}' not found",
                parent_id
            )));
        }

        let trace_id = Trace::generate_id();

        let trace = Trace {
            id: trace_id.clone(),
            parent_id: Some(parent_id.to_string()),
            trace_type: TraceType::Custom {
                name: trace_type.to_string(),
                data: metadata.clone(),
            },
            timestamp: Trace::now(),
            tags: vec![],
            metadata,
        };

        // Write primary trace
        let key = Key::new_trace_with_id(ns.clone(), &trace_id);
        self.put(key, to_stored_value(&trace))?;

        // Write type index
        let type_index = Key::new_trace_index(ns.clone(), "by-type", trace_type, &trace_id);
        self.put(type_index, Value::String(trace_id.clone()))?;

        // Write parent index
        let parent_index = Key::new_trace_index(ns.clone(), "by-parent", parent_id, &trace_id);
        self.put(parent_index, Value::String(trace_id.clone()))?;

        // Write time index
        let hour_bucket = trace.timestamp / (3600 * 1000);
        let time_index = Key::new_trace_index(ns, "by-time", &hour_bucket.to_string(), &trace_id);
        self.put(time_index, Value::String(trace_id.clone()))?;

        Ok(trace_id)
    }
}
