//! `DomScanner` (spec.md §4.6): walks the tree, validates candidate
//! selectors with a real `matches()` test, and applies the tiered
//! remove-vs-hide policy.

use crate::host::{is_framework_managed, DomDocument, DomElement};
use guard_types::{ElementSnapshot, Host, TokenIndex};
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub removed: u64,
    pub hidden: u64,
    pub skipped_already_marked: u64,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.removed += other.removed;
        self.hidden += other.hidden;
        self.skipped_already_marked += other.skipped_already_marked;
    }
}

/// One scan pass over a live document against a fixed `TokenIndex`. A fresh
/// `DomScanner` is built per `HybridExecutor::execute` call (spec.md §4.8);
/// `rescan`/mutation-driven rescans reuse the same instance and index.
pub struct DomScanner {
    document: Arc<dyn DomDocument>,
    index: TokenIndex,
    current_host: Host,
    logged_invalid_selectors: RefCell<HashSet<String>>,
}

impl DomScanner {
    pub fn new(document: Arc<dyn DomDocument>, index: TokenIndex, current_host: Host) -> Self {
        Self {
            document,
            index,
            current_host,
            logged_invalid_selectors: RefCell::new(HashSet::new()),
        }
    }

    pub fn index(&self) -> &TokenIndex {
        &self.index
    }

    /// Full-tree scan: queries `[id],[class]` from the document root and
    /// processes every candidate directly (spec.md §4.6 `scan()`).
    pub fn scan(&self) -> ScanStats {
        let mut stats = ScanStats::default();
        for element in self.document.query_marked_candidates() {
            self.process_element(element.as_ref(), &mut stats);
        }
        stats
    }

    /// Processes `root` and, only if it survived (was not removed), its
    /// `[id],[class]` descendants (spec.md §4.6 `scanElement`).
    pub fn scan_element(&self, root: &dyn DomElement) -> ScanStats {
        let mut stats = ScanStats::default();
        let removed = self.process_element(root, &mut stats);
        if !removed {
            self.scan_marked_descendants(root, &mut stats);
        }
        stats
    }

    fn scan_marked_descendants(&self, node: &dyn DomElement, stats: &mut ScanStats) {
        for child in node.children() {
            if child.id_token().is_some() || !child.class_tokens().is_empty() {
                let removed = self.process_element(child.as_ref(), stats);
                if removed {
                    continue;
                }
            }
            self.scan_marked_descendants(child.as_ref(), stats);
        }
    }

    /// Returns `true` iff the element was removed (tier 1) rather than
    /// hidden (tier 2) or left untouched.
    fn process_element(&self, element: &dyn DomElement, stats: &mut ScanStats) -> bool {
        if element.has_marker() {
            stats.skipped_already_marked += 1;
            return false;
        }

        let Some(_matched) = self.first_match(element) else {
            return false;
        };

        if self.tier1_remove_eligible(element) {
            element.remove();
            stats.removed += 1;
            true
        } else {
            element.set_marker();
            stats.hidden += 1;
            false
        }
    }

    /// First actual selector match for `element`, trying token buckets
    /// before the universal fallback (spec.md §4.6). Invalid selectors are
    /// logged once and skipped, never aborting the scan (spec.md §4.6, §7).
    fn first_match(&self, element: &dyn DomElement) -> Option<String> {
        let tokens = Self::element_tokens(element);
        for token in &tokens {
            if !self.index.has(token) {
                continue;
            }
            for selector in self.index.get(token) {
                if self.selector_matches(element, selector) {
                    return Some(selector.clone());
                }
            }
        }
        for selector in self.index.universal() {
            if self.selector_matches(element, selector) {
                return Some(selector.clone());
            }
        }
        None
    }

    fn selector_matches(&self, element: &dyn DomElement, selector: &str) -> bool {
        match element.matches(selector) {
            Ok(matched) => matched,
            Err(_) => {
                if self.logged_invalid_selectors.borrow_mut().insert(selector.to_string()) {
                    warn!(target: "scanner", selector, "engine rejected matches(), skipping selector");
                }
                false
            }
        }
    }

    /// Builds the transient per-element snapshot (spec.md §3) and returns
    /// the tokens it contributes to an index lookup.
    fn element_tokens(element: &dyn DomElement) -> Vec<String> {
        let snapshot =
            ElementSnapshot::new(element.tag_name(), element.class_tokens(), element.id_token(), element.has_marker());
        snapshot.tokens()
    }

    /// Tier 1 (spec.md §4.6): inert tags always remove; a cross-origin
    /// iframe not managed by a host framework also removes. Everything
    /// else is hidden (tier 2).
    fn tier1_remove_eligible(&self, element: &dyn DomElement) -> bool {
        let tag = element.tag_name().to_ascii_lowercase();
        if tag == "script" || tag == "link" {
            return true;
        }
        if tag == "iframe" {
            if let Some(src) = element.attribute("src") {
                let iframe_host = Host::parse(&src);
                let cross_origin = !iframe_host.is_empty() && iframe_host != self.current_host;
                if cross_origin && !is_framework_managed(element) {
                    return true;
                }
            }
        }
        false
    }
}
