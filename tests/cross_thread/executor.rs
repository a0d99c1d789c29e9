//! Executor Tests
//!
//! Every task submitted through a decorating executor runs in its
//! submitter's context, and pool threads are clean between tasks.

use crate::*;
use std::sync::{mpsc, Barrier};
use std::thread;
use strand::{Executor, TransactionId, Value};

#[test]
fn test_submissions_carry_submitter_context() {
    const NUM_SUBMITTERS: usize = 6;

    let strand = Arc::new(create_strand());
    let executor = Arc::new(strand.executor(create_pool(2)));
    let barrier = Arc::new(Barrier::new(NUM_SUBMITTERS));

    let handles: Vec<_> = (0..NUM_SUBMITTERS)
        .map(|i| {
            let strand = Arc::clone(&strand);
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                strand.begin();
                strand.put_metadata("submitter", i as i64).unwrap();
                barrier.wait();

                let reader = Arc::clone(&strand);
                let seen = executor
                    .submit(move || reader.get_metadata("submitter").unwrap())
                    .recv()
                    .unwrap();
                strand.end();
                seen
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), Some(Value::Int(i as i64)));
    }
}

#[test]
fn test_execute_runs_plain_runnable_in_context() {
    let strand = Arc::new(create_strand());
    let executor = strand.executor(create_pool(1));
    strand.begin();
    let id = strand.transaction_id();

    let (tx, rx) = mpsc::channel::<TransactionId>();
    let reader = Arc::clone(&strand);
    executor.execute(Box::new(move || tx.send(reader.transaction_id()).unwrap()));
    assert_eq!(rx.recv().unwrap(), id);
    strand.end();
}

#[test]
fn test_pool_thread_is_clean_between_tasks() {
    let strand = Arc::new(create_strand());
    let executor = strand.executor(create_pool(1));

    strand.begin();
    executor.submit(|| ()).recv().unwrap();
    strand.end();

    let reader = Arc::clone(&strand);
    let within = executor
        .submit(move || reader.context().is_within_created_context())
        .recv()
        .unwrap();
    assert!(!within);
}
