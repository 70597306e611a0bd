//! `StyleInjector` (spec.md §4.5): the declarative fast path. A single
//! consolidated stylesheet hides every enabled selector via the host's own
//! CSS engine, plus one universal rule that hides/disables elements the
//! procedural path has marked.

use crate::host::{DomDocument, MARKER_ATTR};
use std::sync::Arc;
use tracing::debug;

/// Stable id attribute identifying the single injected stylesheet element
/// (spec.md §6: "identifiable by a stable id attribute").
pub const STYLE_ELEMENT_ID: &str = "cosmetic-guard-stylesheet";

pub struct StyleInjector {
    document: Arc<dyn DomDocument>,
}

impl StyleInjector {
    pub fn new(document: Arc<dyn DomDocument>) -> Self {
        Self { document }
    }

    /// Build and inject one stylesheet covering `selectors`, replacing any
    /// previously injected sheet in an atomic swap (spec.md §4.5). Returns
    /// the number of selectors included.
    pub fn inject(&self, selectors: &[String]) -> usize {
        let css = Self::build_css(selectors);
        if let Err(err) = self.document.inject_stylesheet(STYLE_ELEMENT_ID, &css) {
            debug!(target: "style_injector", %err, "stylesheet injection failed");
            return 0;
        }
        selectors.len()
    }

    pub fn cleanup(&self) {
        self.document.remove_stylesheet(STYLE_ELEMENT_ID);
    }

    pub fn is_injected(&self) -> bool {
        self.document.has_stylesheet(STYLE_ELEMENT_ID)
    }

    fn build_css(selectors: &[String]) -> String {
        let mut css = String::new();
        for selector in selectors {
            css.push_str(selector);
            css.push_str(" { display: none !important; }\n");
        }
        css.push_str(&format!(
            "[{MARKER_ATTR}=\"true\"] {{ display: none !important; visibility: hidden !important; \
             height: 0 !important; width: 0 !important; overflow: hidden !important; \
             pointer-events: none !important; }}\n"
        ));
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DomElement;
    use guard_types::GuardError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDocument {
        sheets: Mutex<std::collections::HashMap<String, String>>,
    }

    struct NoElement;
    impl DomElement for NoElement {
        fn tag_name(&self) -> String {
            String::new()
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
            vec![]
        }
    }

    impl DomDocument for FakeDocument {
        fn root(&self) -> Box<dyn DomElement> {
            Box::new(NoElement)
        }
        fn query_marked_candidates(&self) -> Vec<Box<dyn DomElement>> {
            vec![]
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
    fn inject_then_cleanup_restores_pre_injection_state() {
        let doc = Arc::new(FakeDocument::default());
        let injector = StyleInjector::new(doc.clone());
        assert!(!injector.is_injected());
        injector.inject(&[".ads".to_string()]);
        assert!(injector.is_injected());
        injector.cleanup();
        assert!(!injector.is_injected());
    }

    #[test]
    fn generated_css_contains_marker_rule_and_each_selector() {
        let doc = Arc::new(FakeDocument::default());
        let injector = StyleInjector::new(doc.clone());
        injector.inject(&[".ads".to_string(), "#tracker".to_string()]);
        let css = doc.sheets.lock().unwrap().get(STYLE_ELEMENT_ID).cloned().unwrap();
        assert!(css.contains(".ads { display: none !important; }"));
        assert!(css.contains("#tracker { display: none !important; }"));
        assert!(css.contains(MARKER_ATTR));
    }
}
