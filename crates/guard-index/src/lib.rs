//! `TokenIndexer` (spec.md §4.4): builds the inverted `token -> selector`
//! index used by the procedural scan path. Deterministic, regex-based token
//! extraction; every call to `build` starts from a clean index (atomic swap
//! happens at the caller boundary, per spec.md §4.4).

use guard_types::TokenIndex;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::trace;

static CLASS_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Za-z_][A-Za-z0-9_-]*)").unwrap());
static ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([A-Za-z_][A-Za-z0-9_-]*)").unwrap());
static LEADING_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*)").unwrap());
static ATTR_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[[\w-]+[~|^$*]?=["']([^"']*)["']\]"#).unwrap());

/// Extract every token a selector could be looked up by (spec.md §4.4):
/// class tokens, id tokens, a leading tag name, and attribute-literal
/// values. Order is not significant; callers dedupe before indexing.
fn extract_tokens(selector: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for cap in CLASS_TOKEN.captures_iter(selector) {
        tokens.push(cap[1].to_string());
    }
    for cap in ID_TOKEN.captures_iter(selector) {
        tokens.push(cap[1].to_string());
    }
    if let Some(cap) = LEADING_TAG.captures(selector) {
        tokens.push(cap[1].to_ascii_lowercase());
    }
    for cap in ATTR_LITERAL.captures_iter(selector) {
        tokens.push(cap[1].to_string());
    }

    tokens
}

/// Builds a `TokenIndex` from a selector corpus, clearing any prior state.
pub struct TokenIndexer;

impl TokenIndexer {
    pub fn build(selectors: &[String]) -> TokenIndex {
        let mut index = TokenIndex::new();
        for selector in selectors {
            let tokens = extract_tokens(selector);
            if tokens.is_empty() {
                trace!(target: "index", selector, "no extractable token, marking universal");
                index.insert_universal(selector.clone());
                continue;
            }
            let unique: HashSet<String> = tokens.into_iter().collect();
            for token in unique {
                index.insert(token, selector.clone());
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_list_indexed_under_both_tokens() {
        let index = TokenIndexer::build(&[".a, .b".to_string()]);
        assert!(index.has("a"));
        assert!(index.has("b"));
        assert_eq!(index.get("a"), index.get("b"));
    }

    #[test]
    fn id_and_class_and_leading_tag_extracted() {
        let tokens = extract_tokens("div.ads-banner#main");
        assert!(tokens.contains(&"ads-banner".to_string()));
        assert!(tokens.contains(&"main".to_string()));
        assert!(tokens.contains(&"div".to_string()));
    }

    #[test]
    fn leading_tag_lowercased_but_class_case_preserved() {
        let tokens = extract_tokens("DIV.AdsBanner");
        assert!(tokens.contains(&"div".to_string()));
        assert!(tokens.contains(&"AdsBanner".to_string()));
    }

    #[test]
    fn attribute_literal_extracted() {
        let tokens = extract_tokens(r#"[data-ad*="leaderboard"]"#);
        assert_eq!(tokens, vec!["leaderboard".to_string()]);
    }

    #[test]
    fn selector_with_no_tokens_is_universal() {
        let index = TokenIndexer::build(&["*".to_string()]);
        assert!(index.universal().contains(&"*".to_string()));
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn every_indexed_selector_is_reachable_or_universal() {
        let selectors = vec![".ads".to_string(), "*".to_string(), "#tracker".to_string()];
        let index = TokenIndexer::build(&selectors);
        for selector in &selectors {
            assert!(index.has_selector(selector));
        }
    }
}
