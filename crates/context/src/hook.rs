//! Pluggable error reporting
//!
//! Misuse of the metadata API (reserved keys) is reported through an
//! [`ErrorHook`] in addition to the returned `Err`, so a host can surface
//! tooling bugs without instrumented code paths ever unwinding.

use strand_core::Error;
use tracing::warn;

/// Receives errors signalled by the context store
pub trait ErrorHook: Send + Sync {
    /// Called once per signalled error, on the thread that caused it
    fn report(&self, error: &Error);
}

/// Default hook: log at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHook;

impl ErrorHook for LoggingHook {
    fn report(&self, error: &Error) {
        warn!(error = %error, "Transaction context API misuse");
    }
}

/// Adapter turning a closure into an [`ErrorHook`]
pub struct FnHook<F>(pub F);

impl<F> ErrorHook for FnHook<F>
where
    F: Fn(&Error) + Send + Sync,
{
    fn report(&self, error: &Error) {
        (self.0)(error)
    }
}
