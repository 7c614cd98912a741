//! Storage Crate Integration Tests
//!
//! Tests for strata-storage: MVCC, snapshots, branch isolation.

#[path = "../common/mod.rs"]
mod common;

mod branch_isolation;
mod mvcc_invariants;
mod stress;
