//! Hand-off Tests
//!
//! A unit decorated on T1 and run on T2 sees T1's context, and T2 is clean
//! again once the unit finishes.

use crate::*;
use std::sync::Barrier;
use std::thread;
use strand::Value;

#[test]
fn test_decorated_runnable_sees_origin_metadata() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("user", "alice").unwrap();
    strand.put_metadata("attempt", 3i64).unwrap();
    let origin_id = strand.transaction_id();

    let reader = Arc::clone(&strand);
    let task = strand.propagator().runnable(move || {
        assert_eq!(reader.transaction_id(), origin_id);
        assert_eq!(reader.get_metadata("user").unwrap(), Some(Value::from("alice")));
        assert_eq!(reader.get_metadata("attempt").unwrap(), Some(Value::Int(3)));
    });

    let worker = Arc::clone(&strand);
    thread::spawn(move || {
        task.run();
        assert!(!worker.context().is_within_created_context());
        assert!(worker.transaction_id().is_uninitialized());
    })
    .join()
    .unwrap();

    strand.end();
}

#[test]
fn test_metadata_is_shared_while_in_flight() {
    let strand = Arc::new(create_strand());
    strand.begin();

    let barrier = Arc::new(Barrier::new(2));
    let worker_barrier = Arc::clone(&barrier);
    let writer = Arc::clone(&strand);
    let task = strand.propagator().runnable(move || {
        writer.put_metadata("from_worker", "hello").unwrap();
        worker_barrier.wait();
        worker_barrier.wait();
        assert_eq!(writer.get_metadata("from_origin").unwrap(), Some(Value::from("hi")));
    });

    let handle = thread::spawn(move || task.run());
    barrier.wait();
    assert_eq!(strand.get_metadata("from_worker").unwrap(), Some(Value::from("hello")));
    strand.put_metadata("from_origin", "hi").unwrap();
    barrier.wait();
    handle.join().unwrap();

    strand.end();
}

#[test]
fn test_callable_returns_through_join_handle() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("n", 20i64).unwrap();

    let reader = Arc::clone(&strand);
    let task = strand.propagator().callable(move || {
        reader
            .get_metadata("n")
            .unwrap()
            .and_then(|v| v.as_int())
            .map(|n| n + 1)
    });
    let result = thread::spawn(move || task.call()).join().unwrap();
    assert_eq!(result, Some(21));

    strand.end();
}

#[test]
fn test_spawned_thread_body_inherits_context() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("region", "eu-west-1").unwrap();

    let reader = Arc::clone(&strand);
    let region = strand
        .spawn(move || reader.get_metadata("region").unwrap())
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(region, Some(Value::from("eu-west-1")));

    strand.end();
}

#[test]
fn test_undecorated_thread_sees_nothing() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("user", "alice").unwrap();

    let reader = Arc::clone(&strand);
    thread::spawn(move || {
        assert!(reader.transaction_id().is_uninitialized());
        assert_eq!(reader.get_metadata("user").unwrap(), None);
    })
    .join()
    .unwrap();

    strand.end();
}

#[test]
fn test_decoration_without_context_is_inert() {
    let (strand, log) = create_recording_strand();
    let strand = Arc::new(strand);

    let reader = Arc::clone(&strand);
    let task = strand
        .propagator()
        .runnable(move || assert!(reader.transaction_id().is_uninitialized()));
    thread::spawn(move || task.run()).join().unwrap();

    assert!(log.lock().is_empty());
}

#[test]
fn test_context_destroyed_before_run_is_not_bound() {
    let strand = Arc::new(create_strand());
    strand.begin();
    strand.put_metadata("user", "alice").unwrap();

    let reader = Arc::clone(&strand);
    let task = strand.propagator().runnable(move || {
        assert!(!reader.context().is_within_created_context());
        assert_eq!(reader.get_metadata("user").unwrap(), None);
    });
    strand.end();

    thread::spawn(move || task.run()).join().unwrap();
}

#[test]
fn test_many_threads_each_keep_their_own_context() {
    const NUM_THREADS: usize = 8;

    let strand = Arc::new(create_strand());
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let strand = Arc::clone(&strand);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                strand.begin();
                strand.put_metadata("index", i as i64).unwrap();
                barrier.wait();

                let reader = Arc::clone(&strand);
                let child = strand
                    .spawn(move || reader.get_metadata("index").unwrap())
                    .unwrap();
                assert_eq!(child.join().unwrap(), Some(Value::Int(i as i64)));

                let id = strand.transaction_id();
                strand.end();
                id
            })
        })
        .collect();

    let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), NUM_THREADS);
    assert_eq!(strand.context().active_slots(), 0);
}
