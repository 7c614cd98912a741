//! Tier 2.4: P4 - Replay Result is Ephemeral Tests
//!
//! **Invariant P4**: Result does not persist, discarded after use.
//!
//! These tests verify:
//! - View is not stored
//! - View is garbage collected
//! - No persistent traces of captured views

use crate::test_utils::*;
use strata_core::types::RunId;
use strata_core::value::Value;
use strata_primitives::KVStore;
use std::sync::Arc;

/// P4: View not persisted to disk
#[test]
fn test_p4_view_not_persisted() {
    let mut test_db = TestDb::new();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "key", Value::String("value".into()))
        .unwrap();

    // Create view (capture state)
    let state = CapturedState::capture(&test_db.db, &run_id);
    assert!(!state.kv_entries.is_empty());

    // Drop view
    drop(state);

    // Simulate crash and recovery
    test_db.reopen();

    // Only original data should be present, no view artifacts
    let kv = test_db.kv();
    let value = kv.get(&run_id, "key").unwrap().map(|v| v.value);
    assert_eq!(value, Some(Value::String("value".into())));
}

/// P4: Multiple views don't accumulate
#[test]
fn test_p4_views_dont_accumulate() {
    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "key", Value::String("value".into()))
        .unwrap();

    let state_before = CapturedState::capture(&test_db.db, &run_id);
    let count_before = state_before.kv_entries.len();

    // Create and drop many views
    for _ in 0..100 {
        let view = CapturedState::capture(&test_db.db, &run_id);
        drop(view);
    }

    let state_after = CapturedState::capture(&test_db.db, &run_id);
    let count_after = state_after.kv_entries.len();

    // No accumulation
    assert_eq!(count_before, count_after, "P4 VIOLATED: Views accumulated");
}

/// P4: View scope is limited
#[test]
fn test_p4_view_scope_limited() {
    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "key", Value::String("value".into()))
        .unwrap();

    // View in inner scope
    let original_state = CapturedState::capture(&test_db.db, &run_id);
    {
        let _inner_view = CapturedState::capture(&test_db.db, &run_id);
        // Inner view exists here
    }
    // Inner view dropped

    // Data unchanged
    let final_state = CapturedState::capture(&test_db.db, &run_id);
    assert_states_equal(&original_state, &final_state, "P4: Scope affected state");
}

/// P4: View drop doesn't affect database
#[test]
fn test_p4_drop_does_not_affect_db() {
    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "persistent", Value::String("data".into()))
        .unwrap();

    // Create view
    let view = CapturedState::capture(&test_db.db, &run_id);
    let view_hash = view.hash;

    // Drop view explicitly
    drop(view);

    // Database should be unchanged
    let kv = test_db.kv();
    let value = kv.get(&run_id, "persistent").unwrap().map(|v| v.value);
    assert_eq!(value, Some(Value::String("data".into())));

    // New view should be identical
    let new_view = CapturedState::capture(&test_db.db, &run_id);
    assert_eq!(new_view.hash, view_hash);
}

/// P4: Concurrent view creation and dropping
#[test]
fn test_p4_concurrent_view_lifecycle() {
    use std::thread;

    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "shared", Value::I64(42)).unwrap();

    let db = test_db.db.clone();
    let original_state = CapturedState::capture(&db, &run_id);

    // Spawn threads that create and drop views
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let _view = CapturedState::capture(&db, &run_id);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Original data unchanged
    let final_state = CapturedState::capture(&db, &run_id);
    assert_states_equal(
        &original_state,
        &final_state,
        "P4: Concurrent views affected state",
    );
}

/// P4: View doesn't survive database restart
#[test]
fn test_p4_view_doesnt_survive_restart() {
    let mut test_db = TestDb::new();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "key", Value::String("value".into()))
        .unwrap();

    // Create view before restart
    let _view = CapturedState::capture(&test_db.db, &run_id);

    // Restart (this drops the view)
    test_db.reopen();

    // Database should only have persistent data
    let state = CapturedState::capture(&test_db.db, &run_id);
    assert!(state.kv_entries.contains_key("key"));
    // Only 1 key should exist
    assert_eq!(state.kv_entries.len(), 1);
}

/// P4: Large views are properly released
#[test]
fn test_p4_large_view_released() {
    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();

    // Create large dataset
    for i in 0..1000 {
        kv.put(&run_id, &format!("key_{}", i), Value::I64(i))
            .unwrap();
    }

    // Create and drop large view multiple times
    for _ in 0..10 {
        let view = CapturedState::capture(&test_db.db, &run_id);
        assert_eq!(view.kv_entries.len(), 1000);
        drop(view);
    }

    // Final state should be unchanged
    let final_state = CapturedState::capture(&test_db.db, &run_id);
    assert_eq!(final_state.kv_entries.len(), 1000);
}

/// P4: View is independent instance
#[test]
fn test_p4_view_is_independent_instance() {
    let test_db = TestDb::new_in_memory();
    let run_id = test_db.run_id;

    let kv = test_db.kv();
    kv.put(&run_id, "key", Value::String("value".into()))
        .unwrap();

    // Create two views
    let view1 = CapturedState::capture(&test_db.db, &run_id);
    let view2 = CapturedState::capture(&test_db.db, &run_id);

    // Drop one
    drop(view1);

    // Other should still be valid
    assert!(view2.kv_entries.contains_key("key"));
    assert!(!view2.kv_entries.is_empty());
}
