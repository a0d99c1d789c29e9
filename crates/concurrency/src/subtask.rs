//! Divide-and-conquer subtasks
//!
//! A fork/join subtask is not wrapped in an adapter. It carries its
//! decoration in a [`DecorationField`] that it owns, and [`fork_join`] /
//! [`invoke`] fill that field in at fork time and honour it at execution time.
//! The before/after contract is the same as for every other decorated shape.
//!
//! ```text
//! invoke(pool, root)
//!   └─ root.compute()
//!        └─ fork_join(left, right)      capture on the forking thread
//!             ├─ left.compute()         bound on whichever worker runs it
//!             └─ right.compute()
//! ```

use crate::decoration::Decoration;
use crate::propagator::Propagator;
use rayon::ThreadPool;

/// Decoration slot embedded in a subtask
#[derive(Debug, Default, Clone)]
pub struct DecorationField {
    decoration: Option<Decoration>,
}

impl DecorationField {
    /// Empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a decoration has been attached
    pub fn is_attached(&self) -> bool {
        self.decoration.is_some()
    }

    /// Capture the calling thread's context unless already attached
    pub fn attach(&mut self, propagator: &Propagator) {
        if self.decoration.is_none() {
            self.decoration = Some(propagator.capture());
        }
    }

    /// The attached decoration
    pub fn get(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    fn take(&mut self) -> Option<Decoration> {
        self.decoration.take()
    }
}

/// A unit of divide-and-conquer work
pub trait Subtask: Send {
    /// Result of computing this subtask
    type Output: Send;

    /// The field holding this task's decoration
    fn decoration_field(&mut self) -> &mut DecorationField;

    /// Do the work, possibly splitting further with [`fork_join`]
    fn compute(self) -> Self::Output;
}

/// Run `task` inside whatever decoration it carries
pub fn execute<S: Subtask>(mut task: S) -> S::Output {
    let decoration = task.decoration_field().take();
    let _scope = decoration.as_ref().map(Decoration::enter);
    task.compute()
}

/// Fork two subtasks and wait for both
///
/// Both are decorated with the calling thread's context before being handed
/// to rayon. While waiting, the worker may steal unrelated jobs from the same
/// pool; those run under this worker's bound context rather than their own,
/// so do not share a pool between transactions that need isolation.
pub fn fork_join<A, B>(propagator: &Propagator, mut a: A, mut b: B) -> (A::Output, B::Output)
where
    A: Subtask,
    B: Subtask,
{
    a.decoration_field().attach(propagator);
    b.decoration_field().attach(propagator);
    rayon::join(move || execute(a), move || execute(b))
}

/// Run a root subtask on `pool`, decorated with the calling thread's context
pub fn invoke<S: Subtask>(propagator: &Propagator, pool: &ThreadPool, mut task: S) -> S::Output {
    task.decoration_field().attach(propagator);
    pool.install(move || execute(task))
}
