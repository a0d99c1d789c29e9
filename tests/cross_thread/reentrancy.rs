//! Reentrancy Tests
//!
//! A thread that already carries a context (pooled core thread, synchronous
//! dispatch) keeps it through any nested hand-off.

use crate::*;
use std::sync::mpsc;
use std::thread;
use strand::{Executor, Value};

#[test]
fn test_outer_context_survives_inner_unit() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("owner", "t1").unwrap();
    let reader = Arc::clone(&strand);
    let inner = strand.propagator().runnable(move || {
        // runs under T2's own context, not T1's
        assert_eq!(reader.get_metadata("owner").unwrap(), Some(Value::from("t2")));
    });

    let worker = Arc::clone(&strand);
    thread::spawn(move || {
        worker.begin();
        worker.put_metadata("owner", "t2").unwrap();
        let outer_id = worker.transaction_id();

        inner.run();

        assert!(worker.context().is_within_created_context());
        assert_eq!(worker.transaction_id(), outer_id);
        assert_eq!(worker.get_metadata("owner").unwrap(), Some(Value::from("t2")));
        worker.end();
    })
    .join()
    .unwrap();

    assert_eq!(strand.get_metadata("owner").unwrap(), Some(Value::from("t1")));
    strand.end();
}

#[test]
fn test_nested_handoff_of_same_context() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("k", "v").unwrap();
    let origin_id = strand.transaction_id();

    let (tx, rx) = mpsc::channel();
    let propagator = strand.propagator().clone();
    let reader = Arc::clone(&strand);
    let outer = strand.propagator().runnable(move || {
        // decorated again on T2 while T1's context is bound there
        let nested_reader = Arc::clone(&reader);
        let nested = propagator.runnable(move || {
            tx.send(nested_reader.get_metadata("k").unwrap()).unwrap();
        });
        nested.run();
        assert_eq!(reader.transaction_id(), origin_id);
    });

    let worker = Arc::clone(&strand);
    thread::spawn(move || {
        outer.run();
        assert!(worker.transaction_id().is_uninitialized());
    })
    .join()
    .unwrap();

    assert_eq!(rx.recv().unwrap(), Some(Value::from("v")));
    strand.end();
}

#[test]
fn test_same_thread_dispatch_leaves_binding_alone() {
    let strand = Arc::new(create_strand());
    strand.begin();
    let id = strand.transaction_id();

    let reader = Arc::clone(&strand);
    let expected = id.clone();
    strand
        .propagator()
        .runnable(move || assert_eq!(reader.transaction_id(), expected))
        .run();

    assert!(strand.context().is_within_created_context());
    assert_eq!(strand.transaction_id(), id);
    strand.end();
}

#[test]
fn test_panicking_unit_still_unbinds() {
    let strand = Arc::new(create_strand());
    strand.begin();

    let task = strand.propagator().runnable(|| panic!("unit of work failed"));
    let worker = Arc::clone(&strand);
    let outcome = thread::spawn(move || {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.run()));
        (result.is_err(), worker.transaction_id().is_uninitialized())
    })
    .join()
    .unwrap();

    assert_eq!(outcome, (true, true));
    assert!(strand.context().is_within_created_context());
    strand.end();
}

#[test]
fn test_panic_reaches_the_joiner_unchanged() {
    let strand = create_strand();
    strand.begin();
    let task = strand.propagator().runnable(|| panic!("original message"));

    let err = thread::spawn(move || task.run()).join().unwrap_err();
    assert_eq!(err.downcast_ref::<&str>(), Some(&"original message"));
    strand.end();
}

#[test]
fn test_stale_slot_is_restored_after_unit() {
    let strand = Arc::new(create_strand());
    strand.begin();
    let task = strand.propagator().runnable(|| {});

    let worker = Arc::clone(&strand);
    thread::spawn(move || {
        // depth-0 slot left over from background work
        worker.put_metadata("background", true).unwrap();
        task.run();
        assert_eq!(worker.get_metadata("background").unwrap(), Some(Value::Bool(true)));
        assert!(!worker.context().is_within_created_context());
    })
    .join()
    .unwrap();

    strand.end();
}

#[test]
fn test_nested_submission_on_single_worker_keeps_context() {
    let strand = Arc::new(create_strand());
    let executor = Arc::new(strand.executor(create_pool(1)));
    strand.begin();
    strand.put_metadata("user", "alice").unwrap();
    let expected = strand.transaction_id();

    let (tx, rx) = mpsc::channel();
    let reader = Arc::clone(&strand);
    let resubmit = Arc::clone(&executor);
    executor.execute(Box::new(move || {
        // captured on the worker while the submitter's context is borrowed;
        // runs on the same worker once that borrow has ended
        resubmit.execute(Box::new(move || {
            tx.send((reader.transaction_id(), reader.get_metadata("user").unwrap()))
                .unwrap();
        }));
    }));

    let (id, user) = rx.recv().unwrap();
    assert_eq!(id, expected);
    assert_eq!(user, Some(Value::from("alice")));
    strand.end();
}
