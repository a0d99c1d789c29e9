//! Fork/Join Tests
//!
//! Divide-and-conquer subtasks carry the forking thread's context in their
//! own decoration field.

use crate::*;
use std::collections::HashSet;
use strand::{fork_join, invoke, DecorationField, Propagator, Subtask, TransactionId, Value};

/// Counts tagged words, checking the context at every leaf
struct CountWords {
    propagator: Propagator,
    field: DecorationField,
    words: Vec<&'static str>,
    seen: Arc<Mutex<HashSet<Option<Value>>>>,
}

impl CountWords {
    fn child(&self, words: Vec<&'static str>) -> Self {
        Self {
            propagator: self.propagator.clone(),
            field: DecorationField::new(),
            words,
            seen: Arc::clone(&self.seen),
        }
    }
}

impl Subtask for CountWords {
    type Output = usize;

    fn decoration_field(&mut self) -> &mut DecorationField {
        &mut self.field
    }

    fn compute(self) -> usize {
        if self.words.len() <= 2 {
            let request = self.propagator.store().get_metadata("request").unwrap();
            self.seen.lock().insert(request);
            return self.words.len();
        }
        let mid = self.words.len() / 2;
        let left = self.child(self.words[..mid].to_vec());
        let right = self.child(self.words[mid..].to_vec());
        let (l, r) = fork_join(&self.propagator, left, right);
        l + r
    }
}

#[test]
fn test_subtasks_run_in_forking_context() {
    let strand = create_strand();
    strand.begin();
    strand.put_metadata("request", "req-42").unwrap();

    let pool = create_pool(4);
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let words = "the quick brown fox jumps over the lazy dog again and again"
        .split(' ')
        .collect::<Vec<_>>();
    let total = words.len();
    let root = CountWords {
        propagator: strand.propagator().clone(),
        field: DecorationField::new(),
        words,
        seen: Arc::clone(&seen),
    };

    assert_eq!(invoke(strand.propagator(), &pool, root), total);
    assert_eq!(
        *seen.lock(),
        [Some(Value::from("req-42"))].into_iter().collect::<HashSet<_>>()
    );
    strand.end();
}

#[test]
fn test_pool_threads_released_after_invoke() {
    let strand = create_strand();
    strand.begin();
    let pool = create_pool(2);
    let root = CountWords {
        propagator: strand.propagator().clone(),
        field: DecorationField::new(),
        words: vec!["a", "b", "c", "d", "e"],
        seen: Arc::new(Mutex::new(HashSet::new())),
    };
    invoke(strand.propagator(), &pool, root);
    strand.end();

    let ids: Vec<TransactionId> = pool.broadcast(|_| strand.transaction_id());
    assert!(ids.iter().all(TransactionId::is_uninitialized));
}

#[test]
fn test_join_closures_share_context() {
    let strand = Arc::new(create_strand());
    strand.begin();
    let id = strand.transaction_id();

    let (a, b) = strand
        .propagator()
        .join(|| strand.transaction_id(), || strand.transaction_id());
    assert_eq!(a, id);
    assert_eq!(b, id);
    strand.end();
}

#[test]
fn test_foreign_job_inside_join_runs_under_joining_context() {
    let strand = Arc::new(create_strand());
    let pool = create_pool(1);

    // job from another transaction, as a stolen job would arrive
    let foreign_strand = Arc::clone(&strand);
    let (foreign, foreign_id) = std::thread::spawn(move || {
        foreign_strand.begin();
        let reader = Arc::clone(&foreign_strand);
        let job = foreign_strand
            .propagator()
            .callable(move || reader.transaction_id());
        (job, foreign_strand.transaction_id())
    })
    .join()
    .unwrap();

    strand.begin();
    let id = strand.transaction_id();
    let propagator = strand.propagator().clone();
    let outer = propagator.capture();
    let (seen, _) = pool.install(move || {
        let _scope = outer.enter();
        propagator.join(move || foreign.call(), || ())
    });

    assert_ne!(seen, foreign_id);
    assert_eq!(seen, id);
    strand.end();
}
