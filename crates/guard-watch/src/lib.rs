//! `MutationWatcher` (spec.md §4.7): a debounced, frame-aligned reactor
//! around DOM mutations. Mutation records are buffered FIFO and drained in
//! a single frame-aligned pass per buffer-emptiness transition, feeding
//! surviving elements back into `DomScanner`.

use guard_dom::{DomElement, DomScanner, ScanStats};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

/// One default animation-frame period, used to align drains the way the
/// host's `requestAnimationFrame` would (spec.md §4.7).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A single observed mutation, as the host would report it from its own
/// `MutationObserver` equivalent.
pub enum MutationRecord {
    /// A `childList` record: newly connected element nodes.
    ChildList { added: Vec<Arc<dyn DomElement>> },
    /// An `attributes` record for `class` or `id` on an already-known
    /// element: its token set may have changed.
    Attributes { element: Arc<dyn DomElement> },
}

struct WatcherState {
    buffer: VecDeque<MutationRecord>,
    /// Pointer-identity dedup set standing in for the host's weak set over
    /// processed nodes (spec.md §4.7) — Rust has no `Weak<dyn Trait>` over
    /// host-owned nodes, so identity is tracked by the element's `Arc` data
    /// pointer for the watcher's lifetime instead.
    processed: HashSet<usize>,
    drain_scheduled: bool,
    stopped: bool,
}

fn identity(element: &Arc<dyn DomElement>) -> usize {
    Arc::as_ptr(element) as *const () as usize
}

/// Bound around a `DomScanner`; owned exclusively by `HybridExecutor`
/// (spec.md §3).
#[derive(Clone)]
pub struct MutationWatcher {
    scanner: Arc<DomScanner>,
    state: Arc<Mutex<WatcherState>>,
    on_drain: Option<Arc<dyn Fn(ScanStats) + Send + Sync>>,
    frame_interval: Duration,
}

impl MutationWatcher {
    pub fn new(scanner: Arc<DomScanner>) -> Self {
        Self::with_frame_interval(scanner, DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(scanner: Arc<DomScanner>, frame_interval: Duration) -> Self {
        Self {
            scanner,
            state: Arc::new(Mutex::new(WatcherState {
                buffer: VecDeque::new(),
                processed: HashSet::new(),
                drain_scheduled: false,
                stopped: false,
            })),
            on_drain: None,
            frame_interval,
        }
    }

    /// Publish per-drain delta stats via a callback (spec.md §4.7).
    pub fn on_drain_stats(mut self, callback: impl Fn(ScanStats) + Send + Sync + 'static) -> Self {
        self.on_drain = Some(Arc::new(callback));
        self
    }

    /// Record one observed mutation. Schedules a single frame-aligned drain
    /// the first time the buffer transitions from empty to non-empty;
    /// subsequent mutations before that drain fires just append.
    pub fn on_mutation(&self, record: MutationRecord) {
        let should_schedule = {
            let mut state = self.state.lock().expect("watcher state poisoned");
            if state.stopped {
                return;
            }
            state.buffer.push_back(record);
            if state.drain_scheduled {
                false
            } else {
                state.drain_scheduled = true;
                true
            }
        };

        if should_schedule {
            let watcher = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(watcher.frame_interval).await;
                watcher.drain();
            });
        }
    }

    /// Drains the whole current buffer in one pass, returning the combined
    /// scan stats and invoking the drain callback if set. Safe to call
    /// directly (e.g. in tests) as well as from the scheduled task.
    pub fn drain(&self) -> ScanStats {
        let records = {
            let mut state = self.state.lock().expect("watcher state poisoned");
            state.drain_scheduled = false;
            if state.stopped {
                state.buffer.clear();
                return ScanStats::default();
            }
            std::mem::take(&mut state.buffer)
        };

        let mut stats = ScanStats::default();
        for record in records {
            match record {
                MutationRecord::ChildList { added } => {
                    for element in added {
                        let key = identity(&element);
                        let already = {
                            let mut state = self.state.lock().expect("watcher state poisoned");
                            !state.processed.insert(key)
                        };
                        if already {
                            continue;
                        }
                        stats.merge(self.scanner.scan_element(element.as_ref()));
                    }
                }
                MutationRecord::Attributes { element } => {
                    let key = identity(&element);
                    self.state.lock().expect("watcher state poisoned").processed.remove(&key);
                    stats.merge(self.scanner.scan_element(element.as_ref()));
                }
            }
        }

        trace!(target: "mutation_watcher", removed = stats.removed, hidden = stats.hidden, "drain complete");
        if let Some(callback) = &self.on_drain {
            callback(stats);
        }
        stats
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().expect("watcher state poisoned").buffer.len()
    }

    /// Disconnects the observer and drops any pending buffer (spec.md §4.7,
    /// §5: part of `CleanupRegistry`'s teardown order).
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("watcher state poisoned");
        state.stopped = true;
        state.buffer.clear();
        state.processed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_dom::DomDocument;
    use guard_types::{GuardError, Host, TokenIndex};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeElement {
        classes: Vec<String>,
        marker: Cell<bool>,
    }

    impl DomElement for FakeElement {
        fn tag_name(&self) -> String {
            "div".into()
        }
        fn class_tokens(&self) -> Vec<String> {
            self.classes.clone()
        }
        fn id_token(&self) -> Option<String> {
            None
        }
        fn attribute(&self, _name: &str) -> Option<String> {
            None
        }
        fn matches(&self, selector: &str) -> Result<bool, GuardError> {
            Ok(self.classes.iter().any(|c| selector == format!(".{c}")))
        }
        fn set_marker(&self) {
            self.marker.set(true);
        }
        fn has_marker(&self) -> bool {
            self.marker.get()
        }
        fn remove(&self) {}
        fn children(&self) -> Vec<Box<dyn DomElement>> {
            vec![]
        }
        fn framework_keys(&self) -> Vec<String> {
            vec![]
        }
    }

    struct NoopDocument;
    impl DomDocument for NoopDocument {
        fn root(&self) -> Box<dyn DomElement> {
            Box::new(FakeElement { classes: vec![], marker: Cell::new(false) })
        }
        fn query_marked_candidates(&self) -> Vec<Box<dyn DomElement>> {
            vec![]
        }
        fn query_selector_all(&self, _selector: &str) -> Result<Vec<Box<dyn DomElement>>, GuardError> {
            Ok(vec![])
        }
        fn inject_stylesheet(&self, _id: &str, _css: &str) -> Result<(), GuardError> {
            Ok(())
        }
        fn remove_stylesheet(&self, _id: &str) {}
        fn has_stylesheet(&self, _id: &str) -> bool {
            false
        }
    }

    fn scanner_with(selectors: &[&str]) -> Arc<DomScanner> {
        let mut index = TokenIndex::new();
        for selector in selectors {
            let token = selector.trim_start_matches('.').to_string();
            index.insert(token, selector.to_string());
        }
        Arc::new(DomScanner::new(Arc::new(NoopDocument), index, Host::parse("example.com")))
    }

    #[tokio::test(start_paused = true)]
    async fn buffered_mutations_drain_in_one_frame_aligned_pass() {
        let watcher = MutationWatcher::new(scanner_with(&[".ads"]));
        let el = Arc::new(FakeElement { classes: vec!["ads".into()], marker: Cell::new(false) });
        watcher.on_mutation(MutationRecord::ChildList { added: vec![el.clone()] });
        assert_eq!(watcher.pending_len(), 1);
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert_eq!(watcher.pending_len(), 0);
        assert!(el.has_marker());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_callback_receives_aggregate_stats() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let watcher = MutationWatcher::new(scanner_with(&[".ads"]))
            .on_drain_stats(move |stats| {
                count_clone.fetch_add(stats.hidden as usize, Ordering::SeqCst);
            });
        let el = Arc::new(FakeElement { classes: vec!["ads".into()], marker: Cell::new(false) });
        watcher.on_mutation(MutationRecord::ChildList { added: vec![el] });
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attribute_mutation_clears_dedup_and_rescans() {
        let watcher = MutationWatcher::new(scanner_with(&[".ads"]));
        let el: Arc<dyn DomElement> =
            Arc::new(FakeElement { classes: vec!["ads".into()], marker: Cell::new(false) });
        watcher.on_mutation(MutationRecord::ChildList { added: vec![el.clone()] });
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(el.has_marker());

        // Same node reported again via childList should be a no-op (dedup).
        watcher.on_mutation(MutationRecord::ChildList { added: vec![el.clone()] });
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;

        // An attributes record clears the dedup entry and forces a rescan.
        watcher.on_mutation(MutationRecord::Attributes { element: el.clone() });
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(el.has_marker());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_drops_pending_buffer() {
        let watcher = MutationWatcher::new(scanner_with(&[".ads"]));
        let el = Arc::new(FakeElement { classes: vec!["ads".into()], marker: Cell::new(false) });
        watcher.on_mutation(MutationRecord::ChildList { added: vec![el.clone()] });
        watcher.stop();
        assert_eq!(watcher.pending_len(), 0);
        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(!el.has_marker());
    }
}
