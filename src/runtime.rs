//! Main entry point for Strand.
//!
//! [`Strand`] wires one [`ContextStore`], one [`EventBus`], a [`Propagator`]
//! and a [`ContextPropagation`] codec together under a shared configuration.

use crate::error::Result;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use strand_concurrency::{Decorate, DecoratingExecutor, Executor, Propagator};
use strand_context::{ContextStore, ErrorHook};
use strand_core::{StrandConfig, TransactionId, Value};
use strand_events::{Event, EventBus, Listener};
use strand_propagation::ContextPropagation;
use tracing::debug;

static GLOBAL: Lazy<Strand> = Lazy::new(|| Strand::builder().from_env().build());

/// Process-wide instance, configured from the environment on first use.
///
/// Interception points that cannot thread a handle through the host
/// application share this instance.
pub fn global() -> &'static Strand {
    &GLOBAL
}

/// Transaction context, decorators, event bus and header codec.
///
/// Create one with [`Strand::new`] or [`Strand::builder`], or use
/// [`global()`].
///
/// # Example
///
/// ```ignore
/// use strand::prelude::*;
///
/// let strand = Strand::new();
/// strand.transaction(|| {
///     strand.put_metadata("user", "alice")?;
///     let task = strand.propagator().runnable(|| { /* sees "user" */ });
///     std::thread::spawn(move || task.run()).join().ok();
///     Ok::<_, Error>(())
/// })?;
/// ```
pub struct Strand {
    context: Arc<ContextStore>,
    events: Arc<EventBus>,
    propagator: Propagator,
    propagation: ContextPropagation,
    config: StrandConfig,
}

impl Strand {
    /// Create an instance with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let strand = Strand::builder()
    ///     .retag_unpacked(true)
    ///     .publish_lifecycle_events(false)
    ///     .build();
    /// ```
    pub fn builder() -> StrandBuilder {
        StrandBuilder::new()
    }

    /// The transaction context store.
    pub fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    /// The event bus.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// The decorator entry point.
    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// The header codec.
    pub fn propagation(&self) -> &ContextPropagation {
        &self.propagation
    }

    /// The effective configuration.
    pub fn config(&self) -> &StrandConfig {
        &self.config
    }

    // ========================================================================
    // Context lifecycle
    // ========================================================================

    /// Enter a transaction context; returns the new nesting depth.
    pub fn begin(&self) -> usize {
        self.context.create()
    }

    /// Leave a transaction context.
    pub fn end(&self) {
        self.context.destroy()
    }

    /// Run `f` inside a transaction context.
    ///
    /// The context is left again when `f` returns or panics.
    pub fn transaction<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.context.create();
        let _guard = ScopeGuard(&self.context);
        f()
    }

    /// The calling thread's transaction identifier, or the sentinel.
    pub fn transaction_id(&self) -> TransactionId {
        self.context.get()
    }

    /// Store a metadata value on the calling thread's context.
    pub fn put_metadata(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        Ok(self.context.put_metadata(key, value)?)
    }

    /// Read a metadata value.
    pub fn get_metadata(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.context.get_metadata(key)?)
    }

    /// Mark an existing metadata key for cross-process propagation.
    pub fn propagate(&self, key: &str) -> Result<()> {
        Ok(self
            .context
            .set_metadata_tag(key, self.propagation.tag())?)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a listener.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        self.events.add_listener(listener)
    }

    /// Unregister a listener.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) {
        self.events.remove_listener(listener)
    }

    /// Publish an event; returns how many listeners handled it cleanly.
    pub fn publish(&self, event: &Event) -> usize {
        self.events.publish(event)
    }

    // ========================================================================
    // Hand-off
    // ========================================================================

    /// Decorate a unit of work with the calling thread's context.
    pub fn decorate<D: Decorate>(&self, unit: D) -> D::Output {
        self.propagator.decorate(unit)
    }

    /// Spawn a thread that runs inside the calling thread's context.
    pub fn spawn<F, T>(&self, f: F) -> Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(strand_concurrency::spawn(&self.propagator, f)?)
    }

    /// Wrap an executor so every submission carries its submitter's context.
    pub fn executor<E: Executor>(&self, inner: E) -> DecoratingExecutor<E> {
        DecoratingExecutor::new(inner, self.propagator.clone())
    }

    // ========================================================================
    // Cross-process propagation
    // ========================================================================

    /// Pack propagate-tagged metadata into a header value.
    pub fn pack(&self) -> Option<String> {
        self.propagation.pack_all()
    }

    /// Unpack a header value into the calling thread's context.
    pub fn unpack(&self, header: &str) -> usize {
        self.propagation.unpack(header)
    }
}

impl Default for Strand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strand")
            .field("context", &self.context)
            .field("events", &self.events)
            .field("config", &self.config)
            .finish()
    }
}

struct ScopeGuard<'a>(&'a ContextStore);

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// Builder for [`Strand`].
///
/// # Example
///
/// ```ignore
/// // Share an existing bus with another component
/// let bus = Arc::new(EventBus::new());
/// let strand = Strand::builder().event_bus(bus).build();
///
/// // Defaults overridden by STRAND_* environment variables
/// let strand = Strand::builder().from_env().build();
/// ```
pub struct StrandBuilder {
    config: StrandConfig,
    events: Option<Arc<EventBus>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
}

impl StrandBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: StrandConfig::default(),
            events: None,
            error_hook: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StrandConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from [`StrandConfig::from_env`].
    pub fn from_env(mut self) -> Self {
        self.config = StrandConfig::from_env();
        self
    }

    /// Publish transaction and thread lifecycle events (default: on).
    pub fn publish_lifecycle_events(mut self, enabled: bool) -> Self {
        self.config.publish_lifecycle_events = enabled;
        self
    }

    /// Tag unpacked metadata for propagation again (default: off).
    pub fn retag_unpacked(mut self, enabled: bool) -> Self {
        self.config.retag_unpacked = enabled;
        self
    }

    /// Tag selecting metadata for the propagation header.
    pub fn propagate_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.propagate_tag = tag.into();
        self
    }

    /// Expected number of concurrently active threads.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Publish to an existing bus instead of a private one.
    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Report reserved-key misuse through `hook` instead of the log.
    pub fn error_hook(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Build the instance.
    pub fn build(self) -> Strand {
        let events = self.events.unwrap_or_else(|| Arc::new(EventBus::new()));
        let context = Arc::new(ContextStore::with_config(
            &self.config,
            Some(Arc::clone(&events)),
        ));
        if let Some(hook) = self.error_hook {
            context.install_error_hook(hook);
        }
        debug!(config = ?self.config, "Strand initialised");

        Strand {
            propagator: Propagator::new(Arc::clone(&context)),
            propagation: ContextPropagation::with_config(Arc::clone(&context), &self.config),
            context,
            events,
            config: self.config,
        }
    }
}

impl Default for StrandBuilder {
    fn default() -> Self {
        Self::new()
    }
}
