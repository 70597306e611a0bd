//! `CleanupRegistry`: deterministic teardown for every module on page
//! unload or host-context invalidation (spec.md §4, §5, §9). Every owned
//! subcomponent — watcher, style injector, DOM listeners, the page-world
//! bridge, pending timeouts — registers its own teardown closure here
//! rather than `CleanupRegistry` knowing their concrete types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

type Teardown = Box<dyn FnOnce() + Send>;

/// Registers teardown closures and runs them in reverse registration order
/// (LIFO), exactly once. Safe to call `cleanup()` more than once — later
/// calls are no-ops.
pub struct CleanupRegistry {
    entries: Mutex<Vec<(&'static str, Teardown)>>,
    torn_down: AtomicBool,
}

impl Default for CleanupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self { entries: Mutex::new(Vec::new()), torn_down: AtomicBool::new(false) }
    }

    /// Register a teardown action under `name` (used only for diagnostics).
    /// Registering after `cleanup()` has already run is a no-op — there is
    /// nothing left to tear anything down for.
    pub fn register(&self, name: &'static str, teardown: impl FnOnce() + Send + 'static) {
        if self.torn_down.load(Ordering::SeqCst) {
            warn!(target: "cleanup_registry", name, "registered after cleanup already ran, dropping immediately");
            return;
        }
        self.entries.lock().expect("cleanup registry poisoned").push((name, Box::new(teardown)));
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Runs every registered teardown in reverse dependency order (spec.md
    /// §4.8, §5), i.e. the most recently registered component — typically
    /// the one most dependent on everything registered before it — tears
    /// down first.
    pub fn cleanup(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = std::mem::take(&mut *self.entries.lock().expect("cleanup registry poisoned"));
        for (name, teardown) in entries.into_iter().rev() {
            debug!(target: "cleanup_registry", name, "tearing down");
            teardown();
        }
    }
}

impl Drop for CleanupRegistry {
    fn drop(&mut self) {
        self.cleanup();
    }
}
