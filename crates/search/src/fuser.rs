//! Fusion infrastructure for combining search results
//!
//! This module provides:
//! - Fuser trait for pluggable fusion algorithms
//! - SimpleFuser: basic concatenation + sort (M6 default)
//! - RRFFuser: Reciprocal Rank Fusion (Epic 37)
//!
//! See `docs/architecture/M6_ARCHITECTURE.md` for authoritative specification.

use in_mem_core::search_types::{PrimitiveKind, SearchHit, SearchResponse};

// ============================================================================
// FusedResult
// ============================================================================

/// Result of fusing multiple primitive search results
#[derive(Debug, Clone)]
pub struct FusedResult {
    /// Final ranked list of hits
    pub hits: Vec<SearchHit>,
    /// Whether results were truncated
    pub truncated: bool,
}

impl FusedResult {
    /// Create a new FusedResult
    pub fn new(hits: Vec<SearchHit>, truncated: bool) -> Self {
        FusedResult { hits, truncated }
    }
}

// ============================================================================
// Fuser Trait
// ============================================================================

/// Pluggable fusion interface
///
/// Fusers combine search results from multiple primitives into a single
/// ranked list. Different algorithms can prioritize different factors.
///
/// # Thread Safety
///
/// Fusers must be Send + Sync for concurrent search operations.
///
/// # M6 Implementation
///
/// M6 ships with SimpleFuser (sort by score). Epic 37 adds RRFFuser
/// which uses Reciprocal Rank Fusion.
pub trait Fuser: Send + Sync {
    /// Fuse results from multiple primitives
    ///
    /// Takes a list of (primitive, results) pairs and returns a combined
    /// ranked list truncated to k items.
    fn fuse(&self, results: Vec<(PrimitiveKind, SearchResponse)>, k: usize) -> FusedResult;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// SimpleFuser (M6 Default)
// ============================================================================

/// Simple fusion: concatenate and sort by score
///
/// This is the M6 default fuser. It simply combines all hits from
/// all primitives, sorts by score descending, and takes top-k.
///
/// No rank normalization or primitive weighting.
#[derive(Debug, Clone, Default)]
pub struct SimpleFuser;

impl SimpleFuser {
    /// Create a new SimpleFuser
    pub fn new() -> Self {
        SimpleFuser
    }
}

impl Fuser for SimpleFuser {
    fn fuse(&self, results: Vec<(PrimitiveKind, SearchResponse)>, k: usize) -> FusedResult {
        // Collect all hits
        let mut all_hits: Vec<SearchHit> = results
            .into_iter()
            .flat_map(|(_, response)| response.hits)
            .collect();

        // Sort by score descending
        all_hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Take top-k and update ranks
        let truncated = all_hits.len() > k;
        let hits: Vec<SearchHit> = all_hits
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, mut hit)| {
                hit.rank = (i + 1) as u32;
                hit
            })
            .collect();

        FusedResult::new(hits, truncated)
    }

    fn name(&self) -> &str {
        "simple"
    }
}

// ============================================================================
// Tests
// ============================================================================
