//! `HybridExecutor` (spec.md §4.8): orchestrates the declarative + procedural
//! DOM path for one rule set. Owns `StyleInjector`, the current `DomScanner`,
//! and the `MutationWatcher` bound to it.

use guard_dom::{DomDocument, DomScanner, ScanStats, StyleInjector};
use guard_index::TokenIndexer;
use guard_types::Host;
use guard_watch::MutationWatcher;
use std::sync::Arc;
use tracing::debug;

pub struct HybridExecutor {
    document: Arc<dyn DomDocument>,
    style_injector: StyleInjector,
    scanner: Option<Arc<DomScanner>>,
    watcher: Option<MutationWatcher>,
    total: ScanStats,
}

impl HybridExecutor {
    pub fn new(document: Arc<dyn DomDocument>) -> Self {
        Self {
            style_injector: StyleInjector::new(document.clone()),
            document,
            scanner: None,
            watcher: None,
            total: ScanStats::default(),
        }
    }

    /// Stylesheet injection, then index build, then initial scan, then
    /// watcher start — strictly in that order (spec.md §5). Returns the
    /// scan's own stats; `total()` accumulates across calls.
    pub fn execute(&mut self, selectors: &[String], domain: Host) -> ScanStats {
        let injected = self.style_injector.inject(selectors);
        debug!(target: "hybrid_executor", injected, domain = %domain, "stylesheet injected");

        let index = TokenIndexer::build(selectors);
        let scanner = Arc::new(DomScanner::new(self.document.clone(), index, domain));
        let stats = scanner.scan();

        if let Some(old_watcher) = self.watcher.take() {
            old_watcher.stop();
        }
        self.watcher = Some(MutationWatcher::new(scanner.clone()));
        self.scanner = Some(scanner);
        self.total.merge(stats);
        stats
    }

    /// Re-runs the scan over the current index without rebuilding the
    /// stylesheet or token index (spec.md §4.8 `rescan()`).
    pub fn rescan(&mut self) -> ScanStats {
        let Some(scanner) = &self.scanner else {
            return ScanStats::default();
        };
        let stats = scanner.scan();
        self.total.merge(stats);
        stats
    }

    pub fn mutation_watcher(&self) -> Option<&MutationWatcher> {
        self.watcher.as_ref()
    }

    pub fn total(&self) -> ScanStats {
        self.total
    }

    /// Tears everything down in reverse dependency order: watcher, then
    /// stylesheet (spec.md §4.8 `cleanup()`).
    pub fn cleanup(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        self.style_injector.cleanup();
        self.scanner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_dom::DomElement;
    use guard_types::GuardError;
    use std::cell::Cell;
    use std::sync::Mutex;

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

    #[derive(Default)]
    struct FakeDocument {
        sheets: Mutex<std::collections::HashMap<String, String>>,
    }

    impl DomDocument for FakeDocument {
        fn root(&self) -> Box<dyn DomElement> {
            Box::new(FakeElement { classes: vec![], marker: Cell::new(false) })
        }
        fn query_marked_candidates(&self) -> Vec<Box<dyn DomElement>> {
            vec![Box::new(FakeElement { classes: vec!["ads".into()], marker: Cell::new(false) })]
        }
        fn query_selector_all(&self, _selector: &str) -> Result<Vec<Box<dyn DomElement>>, GuardError> {
            Ok(vec![])
        }
        fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), GuardError> {
            self.sheets.lock().unwrap().insert(id.to_string(), css.to_string());
            Ok(())
        }
        fn remove_stylesheet(&self, id: &str) {
            self.sheets.lock().unwrap().remove(id);
        }
        fn has_stylesheet(&self, id: &str) -> bool {
            self.sheets.lock().unwrap().contains_key(id)
        }
    }

    #[test]
    fn execute_injects_scans_and_starts_watcher() {
        let doc = Arc::new(FakeDocument::default());
        let mut executor = HybridExecutor::new(doc.clone());
        let stats = executor.execute(&[".ads".to_string()], Host::parse("example.com"));
        assert_eq!(stats.hidden, 1);
        assert!(doc.has_stylesheet(guard_dom::STYLE_ELEMENT_ID));
        assert!(executor.mutation_watcher().is_some());
    }

    #[test]
    fn cleanup_stops_watcher_and_removes_stylesheet() {
        let doc = Arc::new(FakeDocument::default());
        let mut executor = HybridExecutor::new(doc.clone());
        executor.execute(&[".ads".to_string()], Host::parse("example.com"));
        executor.cleanup();
        assert!(!doc.has_stylesheet(guard_dom::STYLE_ELEMENT_ID));
    }
}
