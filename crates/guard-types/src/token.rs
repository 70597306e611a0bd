//! `TokenIndex`: inverted index from token to selector bucket (spec.md §3, §4.4).

use std::collections::{HashMap, HashSet};

pub type Token = String;
pub type Selector = String;

/// `token -> [selector]` plus a universal fallback bucket for selectors that
/// yield no extractable token. Every selector reachable via `get` or present
/// in `universal()` satisfies the invariant in spec.md §3.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    buckets: HashMap<Token, Vec<Selector>>,
    universal: Vec<Selector>,
    all_selectors: HashSet<Selector>,
}

impl TokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `selector` is reachable via `token`.
    pub fn insert(&mut self, token: Token, selector: Selector) {
        self.all_selectors.insert(selector.clone());
        self.buckets.entry(token).or_default().push(selector);
    }

    /// Record `selector` as universal: it yielded no token and must be
    /// evaluated unconditionally during a scan.
    pub fn insert_universal(&mut self, selector: Selector) {
        self.all_selectors.insert(selector.clone());
        self.universal.push(selector);
    }

    pub fn has(&self, token: &str) -> bool {
        self.buckets.contains_key(token)
    }

    pub fn get(&self, token: &str) -> &[Selector] {
        self.buckets.get(token).map_or(&[], |v| v.as_slice())
    }

    pub fn universal(&self) -> &[Selector] {
        &self.universal
    }

    pub fn has_selector(&self, selector: &str) -> bool {
        self.all_selectors.contains(selector)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.universal.is_empty()
    }

    pub fn selector_count(&self) -> usize {
        self.all_selectors.len()
    }

    pub fn universal_count(&self) -> usize {
        self.universal.len()
    }

    pub fn snapshot(&self) -> TokenIndexSnapshot {
        TokenIndexSnapshot {
            token_count: self.len(),
            selector_count: self.selector_count(),
            universal_count: self.universal_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenIndexSnapshot {
    pub token_count: usize,
    pub selector_count: usize,
    pub universal_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_list_selector_indexed_under_both_tokens() {
        let mut idx = TokenIndex::new();
        idx.insert("a".into(), ".a, .b".into());
        idx.insert("b".into(), ".a, .b".into());
        assert!(idx.has("a"));
        assert!(idx.has("b"));
        assert_eq!(idx.get("a"), [".a, .b".to_string()]);
        assert_eq!(idx.selector_count(), 1);
    }

    #[test]
    fn universal_selectors_not_reachable_by_token() {
        let mut idx = TokenIndex::new();
        idx.insert_universal("*".into());
        assert!(!idx.has("*"));
        assert_eq!(idx.universal(), ["*".to_string()]);
        assert!(idx.has_selector("*"));
    }
}
