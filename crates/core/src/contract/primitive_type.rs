//! Primitive type enumeration
//!
//! This type supports Invariant 6: Everything is Introspectable.
//! Every entity can report what kind of primitive it is.
//!
//! ## The Six Primitives
//!
//! The database has exactly six primitives:
//!
//! | Primitive | Purpose | Versioning |
//! |-----------|---------|------------|
//! | Kv | Key-value store | TxnId |
//! | Event | Append-only event log | Sequence |
//! | State | Named state cells with CAS | Counter |
//! | Branch | Branch lifecycle management | TxnId |
//! | Json | JSON document store | TxnId |
//! | Vector | Vector similarity search | TxnId |

use serde::{Deserialize, Serialize};

/// The six primitive types in the database
///
/// This enum identifies which primitive a value or operation belongs to.
/// Used for type discrimination, routing, and introspection.
///
/// ## Invariant
///
/// This enum MUST have exactly 6 variants - one for each primitive.
/// Adding a new primitive requires adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Key-Value store
    ///
    /// Simple key-value storage with CRUD operations.
    /// Versioning: TxnId
    Kv,

    /// Event log
    ///
    /// Append-only event stream with sequence numbers.
    /// Versioning: Sequence
    Event,

    /// State cell
    ///
    /// Named state cells with compare-and-swap.
    /// Versioning: Counter
    State,

    /// Branch index
    ///
    /// Branch lifecycle management (create, status, metadata).
    /// Versioning: TxnId
    Branch,

    /// JSON document store
    ///
    /// JSON documents with path-based operations.
    /// Versioning: TxnId
    Json,

    /// Vector store
    ///
    /// Vector similarity search with HNSW index.
    /// Versioning: TxnId
    Vector,
}

impl PrimitiveType {
    /// All primitive types (for iteration)
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::Kv,
        PrimitiveType::Event,
        PrimitiveType::State,
        PrimitiveType::Branch,
        PrimitiveType::Json,
        PrimitiveType::Vector,
    ];

    /// Get all primitive types as a slice
    pub fn all() -> &'static [PrimitiveType] {
        &Self::ALL
    }

    /// Human-readable display name
    pub const fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Kv => "KVStore",
            PrimitiveType::Event => "EventLog",
            PrimitiveType::State => "StateCell",
            PrimitiveType::Branch => "BranchIndex",
            PrimitiveType::Json => "JsonStore",
            PrimitiveType::Vector => "VectorStore",
        }
    }

    /// Short identifier (for serialization, URIs, etc.)
    pub const fn id(&self) -> &'static str {
        match self {
            PrimitiveType::Kv => "kv",
            PrimitiveType::Event => "event",
            PrimitiveType::State => "state",
            PrimitiveType::Branch => "branch",
            PrimitiveType::Json => "json",
            PrimitiveType::Vector => "vector",
        }
    }

    /// Parse from short identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "kv" => Some(PrimitiveType::Kv),
            "event" => Some(PrimitiveType::Event),
            "state" => Some(PrimitiveType::State),
            "branch" => Some(PrimitiveType::Branch),
            "json" => Some(PrimitiveType::Json),
            "vector" => Some(PrimitiveType::Vector),
            _ => None,
        }
    }

    /// Check if this primitive supports CRUD lifecycle
    ///
    /// Kv, State, Branch, Json, Vector support full CRUD.
    /// Event is append-only (CR only).
    pub const fn supports_crud(&self) -> bool {
        match self {
            PrimitiveType::Kv => true,
            PrimitiveType::Event => false, // Append-only
            PrimitiveType::State => true,
            PrimitiveType::Branch => true,
            PrimitiveType::Json => true,
            PrimitiveType::Vector => true,
        }
    }

    /// Check if this primitive is append-only
    pub const fn is_append_only(&self) -> bool {
        !self.supports_crud()
    }

    /// Get the WAL entry type range for this primitive
    ///
    /// Each primitive has a reserved byte range in the WAL format:
    /// - KV: 0x10-0x1F
    /// - JSON: 0x20-0x2F
    /// - Event: 0x30-0x3F
    /// - State: 0x40-0x4F
    /// - Branch: 0x60-0x6F
    /// - Vector: 0x70-0x7F
    pub const fn entry_type_range(&self) -> (u8, u8) {
        match self {
            PrimitiveType::Kv => (0x10, 0x1F),
            PrimitiveType::Json => (0x20, 0x2F),
            PrimitiveType::Event => (0x30, 0x3F),
            PrimitiveType::State => (0x40, 0x4F),
            PrimitiveType::Branch => (0x60, 0x6F),
            PrimitiveType::Vector => (0x70, 0x7F),
        }
    }

    /// Get the primitive ID for snapshot sections
    ///
    /// These IDs are used in snapshot file format to identify sections.
    pub const fn primitive_id(&self) -> u8 {
        match self {
            PrimitiveType::Kv => 1,
            PrimitiveType::Json => 2,
            PrimitiveType::Event => 3,
            PrimitiveType::State => 4,
            PrimitiveType::Branch => 6,
            PrimitiveType::Vector => 7,
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================
