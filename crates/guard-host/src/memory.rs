//! In-memory `DomDocument`/`DomElement` implementation used by the harness
//! binary and its integration tests. Nodes are `Arc<Mutex<..>>` rather than
//! the `Rc<RefCell<..>>` a browser binding would use, since the engine moves
//! document handles across `tokio::spawn` boundaries (`MutationWatcher`'s
//! drain task).

use guard_dom::{DomDocument, DomElement};
use guard_types::GuardError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct NodeData {
    tag: String,
    classes: Vec<String>,
    id: Option<String>,
    attrs: HashMap<String, String>,
    framework_keys: Vec<String>,
    marker: bool,
    removed: bool,
    children: Vec<MemoryElement>,
}

/// A single element in a fabricated page tree.
#[derive(Clone)]
pub struct MemoryElement(Arc<Mutex<NodeData>>);

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self(Arc::new(Mutex::new(NodeData {
            tag: tag.to_string(),
            classes: Vec::new(),
            id: None,
            attrs: HashMap::new(),
            framework_keys: Vec::new(),
            marker: false,
            removed: false,
            children: Vec::new(),
        })))
    }

    pub fn with_class(self, class: &str) -> Self {
        self.0.lock().expect("node poisoned").classes.push(class.to_string());
        self
    }

    pub fn with_id(self, id: &str) -> Self {
        self.0.lock().expect("node poisoned").id = Some(id.to_string());
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.0.lock().expect("node poisoned").attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_framework_key(self, key: &str) -> Self {
        self.0.lock().expect("node poisoned").framework_keys.push(key.to_string());
        self
    }

    pub fn with_child(self, child: MemoryElement) -> Self {
        self.0.lock().expect("node poisoned").children.push(child);
        self
    }

    pub fn is_removed(&self) -> bool {
        self.0.lock().expect("node poisoned").removed
    }
}

fn selector_part_matches(part: &str, node: &NodeData) -> bool {
    if let Some(class) = part.strip_prefix('.') {
        node.classes.iter().any(|c| c == class)
    } else if let Some(id) = part.strip_prefix('#') {
        node.id.as_deref() == Some(id)
    } else if !part.is_empty() {
        node.tag.eq_ignore_ascii_case(part)
    } else {
        false
    }
}

fn check_balanced_parens(selector: &str) -> Result<(), GuardError> {
    if selector.matches('(').count() != selector.matches(')').count() {
        return Err(GuardError::InvalidSelector(selector.to_string()));
    }
    Ok(())
}

impl DomElement for MemoryElement {
    fn tag_name(&self) -> String {
        self.0.lock().expect("node poisoned").tag.clone()
    }

    fn class_tokens(&self) -> Vec<String> {
        self.0.lock().expect("node poisoned").classes.clone()
    }

    fn id_token(&self) -> Option<String> {
        self.0.lock().expect("node poisoned").id.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.lock().expect("node poisoned").attrs.get(name).cloned()
    }

    fn matches(&self, selector: &str) -> Result<bool, GuardError> {
        check_balanced_parens(selector)?;
        let node = self.0.lock().expect("node poisoned");
        Ok(selector.split(',').any(|part| selector_part_matches(part.trim(), &node)))
    }

    fn set_marker(&self) {
        self.0.lock().expect("node poisoned").marker = true;
    }

    fn has_marker(&self) -> bool {
        self.0.lock().expect("node poisoned").marker
    }

    fn remove(&self) {
        self.0.lock().expect("node poisoned").removed = true;
    }

    fn children(&self) -> Vec<Box<dyn DomElement>> {
        self.0
            .lock()
            .expect("node poisoned")
            .children
            .iter()
            .filter(|c| !c.is_removed())
            .map(|c| Box::new(c.clone()) as Box<dyn DomElement>)
            .collect()
    }

    fn framework_keys(&self) -> Vec<String> {
        self.0.lock().expect("node poisoned").framework_keys.clone()
    }
}

fn collect_descendants(el: &MemoryElement, out: &mut Vec<MemoryElement>) {
    let children = el.0.lock().expect("node poisoned").children.clone();
    for child in children {
        if child.is_removed() {
            continue;
        }
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

/// A fabricated page tree plus its injected-stylesheet ledger.
pub struct MemoryDocument {
    root: MemoryElement,
    sheets: Mutex<HashMap<String, String>>,
}

impl MemoryDocument {
    pub fn new(root: MemoryElement) -> Self {
        Self { root, sheets: Mutex::new(HashMap::new()) }
    }

    fn all_nodes(&self) -> Vec<MemoryElement> {
        let mut out = vec![self.root.clone()];
        collect_descendants(&self.root, &mut out);
        out
    }
}

impl DomDocument for MemoryDocument {
    fn root(&self) -> Box<dyn DomElement> {
        Box::new(self.root.clone())
    }

    fn query_marked_candidates(&self) -> Vec<Box<dyn DomElement>> {
        self.all_nodes()
            .into_iter()
            .filter(|e| e.id_token().is_some() || !e.class_tokens().is_empty())
            .map(|e| Box::new(e) as Box<dyn DomElement>)
            .collect()
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Box<dyn DomElement>>, GuardError> {
        check_balanced_parens(selector)?;
        let mut matched = Vec::new();
        for node in self.all_nodes() {
            if node.matches(selector)? {
                matched.push(Box::new(node) as Box<dyn DomElement>);
            }
        }
        Ok(matched)
    }

    fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), GuardError> {
        self.sheets.lock().expect("sheet ledger poisoned").insert(id.to_string(), css.to_string());
        Ok(())
    }

    fn remove_stylesheet(&self, id: &str) {
        self.sheets.lock().expect("sheet ledger poisoned").remove(id);
    }

    fn has_stylesheet(&self, id: &str) -> bool {
        self.sheets.lock().expect("sheet ledger poisoned").contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_class_id_and_tag_selectors() {
        let el = MemoryElement::new("div").with_class("ads-banner").with_id("main");
        assert!(el.matches(".ads-banner").unwrap());
        assert!(el.matches("#main").unwrap());
        assert!(el.matches("div").unwrap());
        assert!(!el.matches(".other").unwrap());
    }

    #[test]
    fn rejects_unbalanced_selector() {
        let el = MemoryElement::new("div");
        assert!(el.matches("div:has(").is_err());
    }

    #[test]
    fn query_marked_candidates_skips_removed_and_bare_nodes() {
        let child = MemoryElement::new("span").with_class("ads");
        let removed = MemoryElement::new("span").with_class("ads-2");
        removed.remove();
        let root = MemoryElement::new("body").with_child(child).with_child(removed).with_child(MemoryElement::new("p"));
        let doc = MemoryDocument::new(root);
        let candidates = doc.query_marked_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_tokens(), vec!["ads".to_string()]);
    }
}
