//! Thread Event Tests
//!
//! Every cross-thread binding is bracketed by ThreadEnter and ThreadExit,
//! both naming the capturing and the executing thread.

use crate::*;
use std::thread;

#[test]
fn test_enter_and_exit_bracket_binding() {
    let (strand, log) = create_recording_strand();
    let strand = Arc::new(strand);
    strand.begin();
    let parent = thread::current().id();

    let task = strand.propagator().runnable(|| {});
    let child = thread::spawn(move || {
        task.run();
        thread::current().id()
    })
    .join()
    .unwrap();
    strand.end();

    let log = log.lock();
    assert_eq!(
        *log,
        vec![
            EventKind::TransactionBegin,
            EventKind::ThreadEnter { parent, child },
            EventKind::ThreadExit { parent, child },
            EventKind::TransactionEnd,
        ]
    );
}

#[test]
fn test_no_thread_events_for_same_thread_dispatch() {
    let (strand, log) = create_recording_strand();
    strand.begin();
    strand.propagator().runnable(|| {}).run();
    strand.end();

    assert_eq!(
        *log.lock(),
        vec![EventKind::TransactionBegin, EventKind::TransactionEnd]
    );
}

#[test]
fn test_listener_sees_context_at_thread_exit() {
    let strand = Arc::new(create_strand());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reader = Arc::clone(&strand);
    strand.add_listener(listener_fn(0, move |e| {
        if let EventKind::ThreadExit { .. } = e.kind() {
            sink.lock().push(reader.get_metadata("user").unwrap());
        }
    }));

    strand.begin();
    strand.put_metadata("user", "alice").unwrap();
    let task = strand.propagator().runnable(|| {});
    thread::spawn(move || task.run()).join().unwrap();
    strand.end();

    assert_eq!(*seen.lock(), vec![Some(strand::Value::from("alice"))]);
}

#[test]
fn test_lifecycle_events_can_be_switched_off() {
    let strand = Strand::builder().publish_lifecycle_events(false).build();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    strand.add_listener(listener_fn(0, move |e| sink.lock().push(e.kind().clone())));

    strand.begin();
    let task = strand.propagator().runnable(|| {});
    thread::spawn(move || task.run()).join().unwrap();
    strand.end();

    assert!(log.lock().is_empty());
}
