//! Per-key debounced writer (spec.md §4.2): coalesces writes to the same key
//! within a 500 ms window, bounded to 100 distinct pending keys. When the
//! bound is reached the oldest pending write is flushed synchronously rather
//! than dropped.

use guard_types::{GuardError, Store};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

struct Pending {
    value: serde_json::Value,
    generation: u64,
}

struct State {
    order: VecDeque<String>,
    entries: HashMap<String, Pending>,
}

/// Debounces writes to a `Store` per key. Cloning shares the same underlying
/// queue (it's an `Arc` handle), so the same writer can be held by both the
/// caller scheduling writes and the background flush task.
#[derive(Clone)]
pub struct DebouncedWriter {
    store: Arc<dyn Store>,
    state: Arc<Mutex<State>>,
    coalesce_window: Duration,
    max_keys: usize,
}

impl DebouncedWriter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_params(store, Duration::from_millis(500), 100)
    }

    pub fn with_params(store: Arc<dyn Store>, coalesce_window: Duration, max_keys: usize) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(State {
                order: VecDeque::new(),
                entries: HashMap::new(),
            })),
            coalesce_window,
            max_keys,
        }
    }

    /// Queue `value` for `key`. Schedules a flush after the coalescing
    /// window unless a newer write supersedes it first. Returns
    /// immediately; must be called from within a Tokio runtime so the
    /// flush task can be spawned.
    pub fn schedule(&self, key: String, value: serde_json::Value) {
        let generation = {
            let mut state = self.state.lock().expect("debounce state poisoned");
            let generation = state.entries.get(&key).map_or(0, |p| p.generation + 1);
            if !state.entries.contains_key(&key) {
                state.order.push_back(key.clone());
            }
            state.entries.insert(key.clone(), Pending { value, generation });

            if state.order.len() > self.max_keys {
                if let Some(oldest) = state.order.pop_front() {
                    if let Some(pending) = state.entries.remove(&oldest) {
                        if let Err(err) = self.store.set(&oldest, pending.value) {
                            warn!(target: "cache.writer", key = oldest, %err, "synchronous overflow flush failed");
                        }
                    }
                }
            }
            generation
        };

        let store = self.store.clone();
        let state = self.state.clone();
        let window = self.coalesce_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let flushed = {
                let mut state = state.lock().expect("debounce state poisoned");
                match state.entries.get(&key) {
                    Some(pending) if pending.generation == generation => {
                        let pending = state.entries.remove(&key).unwrap();
                        state.order.retain(|k| k != &key);
                        Some(pending.value)
                    }
                    _ => None,
                }
            };
            if let Some(value) = flushed {
                if let Err(err) = store.set(&key, value) {
                    warn!(target: "cache.writer", %key, %err, "debounced flush failed");
                }
            }
        });
    }

    /// Flush every still-pending key synchronously, e.g. on teardown.
    pub fn flush_all(&self) -> Result<(), GuardError> {
        let mut state = self.state.lock().expect("debounce state poisoned");
        let mut first_err = None;
        while let Some(key) = state.order.pop_front() {
            if let Some(pending) = state.entries.remove(&key) {
                if let Err(err) = self.store.set(&key, pending.value) {
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drop any pending write for `key` without flushing it (used by
    /// `invalidate`, which must not let a stale queued write resurrect the
    /// entry after the store has already been told to forget it).
    pub fn cancel(&self, key: &str) {
        let mut state = self.state.lock().expect("debounce state poisoned");
        state.entries.remove(key);
        state.order.retain(|k| k != key);
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().expect("debounce state poisoned").order.len()
    }
}
