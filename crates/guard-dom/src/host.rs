//! DOM abstraction seam. The real document tree, its CSS engine, and its
//! element objects belong to the host page (spec.md §1: external
//! collaborator); every other module in this crate only ever talks to
//! these two traits.

use guard_types::GuardError;

/// The boolean marker attribute written by `DomScanner` and read by the
/// injected stylesheet (spec.md §3, §6: the single observable DOM write
/// besides the stylesheet element itself).
pub const MARKER_ATTR: &str = "data-content-blocked";

/// A live element handle. Implementors own whatever real DOM node (or test
/// double) backs them; `matches` must defer to the host's real selector
/// engine so the invariant in spec.md §8 ("token match without selector
/// match must never block") holds.
pub trait DomElement: Send + Sync {
    fn tag_name(&self) -> String;
    fn class_tokens(&self) -> Vec<String>;
    fn id_token(&self) -> Option<String>;
    fn attribute(&self, name: &str) -> Option<String>;
    fn matches(&self, selector: &str) -> Result<bool, GuardError>;
    fn set_marker(&self);
    fn has_marker(&self) -> bool;
    fn remove(&self);
    fn children(&self) -> Vec<Box<dyn DomElement>>;
    /// Own enumerable keys on this element/node, used to detect a
    /// framework-managed subtree (spec.md §4.6).
    fn framework_keys(&self) -> Vec<String>;
}

/// The live document tree plus the narrow stylesheet-lifecycle surface
/// `StyleInjector` needs. `Send + Sync` so a document handle can cross the
/// `tokio::spawn` boundary `MutationWatcher` schedules its drains on.
pub trait DomDocument: Send + Sync {
    fn root(&self) -> Box<dyn DomElement>;
    /// Flat `[id],[class]` query over the whole connected tree (spec.md
    /// §4.6 `scan()`).
    fn query_marked_candidates(&self) -> Vec<Box<dyn DomElement>>;
    /// Arbitrary selector query, used by the lightweight selector path
    /// (spec.md §4.9) rather than the token-indexed scanner. Errs on a
    /// selector the host's engine rejects.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, GuardError>;
    fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), GuardError>;
    fn remove_stylesheet(&self, id: &str);
    fn has_stylesheet(&self, id: &str) -> bool;
}

/// Closed list of private-key markers that indicate an element subtree is
/// managed by a host framework and therefore safe-listed from removal
/// (spec.md §4.6, tier 1 exception).
const FRAMEWORK_KEY_EXACT: &[&str] = &["_reactRootContainer", "__vue__", "__vueParentComponent"];
const FRAMEWORK_KEY_PREFIXES: &[&str] = &["__react", "__ng"];

pub fn is_framework_managed(element: &dyn DomElement) -> bool {
    element.framework_keys().iter().any(|key| {
        FRAMEWORK_KEY_EXACT.contains(&key.as_str())
            || FRAMEWORK_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeElement {
        keys: Vec<String>,
    }

    impl DomElement for FakeElement {
        fn tag_name(&self) -> String {
            "div".into()
        }
        fn class_tokens(&self) -> Vec<String> {
            vec![]
        }
        fn id_token(&self) -> Option<String> {
            None
        }
        fn attribute(&self, _name: &str) -> Option<String> {
            None
        }
        fn matches(&self, _selector: &str) -> Result<bool, GuardError> {
            Ok(false)
        }
        fn set_marker(&self) {}
        fn has_marker(&self) -> bool {
            false
        }
        fn remove(&self) {}
        fn children(&self) -> Vec<Box<dyn DomElement>> {
            vec![]
        }
        fn framework_keys(&self) -> Vec<String> {
            self.keys.clone()
        }
    }

    #[test]
    fn recognizes_each_closed_list_marker() {
        for key in ["_reactRootContainer", "__vue__", "__vueParentComponent", "__reactFiber$abc", "__ngContext__"] {
            let el = FakeElement { keys: vec![key.to_string()] };
            assert!(is_framework_managed(&el), "expected {key} to be recognized");
        }
    }

    #[test]
    fn plain_element_is_not_framework_managed() {
        let el = FakeElement { keys: vec!["onclick".to_string()] };
        assert!(!is_framework_managed(&el));
    }
}
