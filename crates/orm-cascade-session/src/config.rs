//! Cascade builder configuration.

/// Configuration for cascade queue construction.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    /// Maximum number of nested `enqueue` calls. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Whether to fire `BeforePersist` when an entity joins the queue.
    ///
    /// Entities are attached to their repository either way.
    pub fire_events: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            fire_events: true,
        }
    }
}

impl CascadeConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit recursion depth (builder pattern).
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Enable or disable lifecycle notifications (builder pattern).
    #[must_use]
    pub fn fire_events(mut self, value: bool) -> Self {
        self.fire_events = value;
        self
    }
}
