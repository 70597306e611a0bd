//! `ElementSnapshot` (spec.md §3) — procedural-path-only, transient state
//! describing one element for the duration of a single scan call. Never
//! persisted or cloned across frames: callers construct one per element as
//! they visit it and drop it once the tiered policy has been applied.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub class_tokens: Vec<String>,
    pub id_token: Option<String>,
    pub has_blocked_mark: bool,
}

impl ElementSnapshot {
    pub fn new(tag_name: impl Into<String>, class_tokens: Vec<String>, id_token: Option<String>, has_blocked_mark: bool) -> Self {
        Self {
            tag_name: tag_name.into(),
            class_tokens,
            id_token,
            has_blocked_mark,
        }
    }

    /// All tokens this element contributes to a token-index lookup: its
    /// class tokens, its id token, and its lowercased tag name.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.class_tokens.clone();
        if let Some(id) = &self.id_token {
            tokens.push(id.clone());
        }
        tokens.push(self.tag_name.to_ascii_lowercase());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_include_tag_class_and_id() {
        let snap = ElementSnapshot::new("DIV", vec!["ads-banner".into()], Some("main".into()), false);
        let tokens = snap.tokens();
        assert!(tokens.contains(&"ads-banner".to_string()));
        assert!(tokens.contains(&"main".to_string()));
        assert!(tokens.contains(&"div".to_string()));
    }
}
