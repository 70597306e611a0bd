//! `Rule` and `RuleSet` (spec.md §3).

use crate::domain::DomainSpec;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Advertising,
    Tracking,
    Social,
    Popup,
    Easylist,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSourceKind {
    Default,
    Custom,
    Easylist,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    pub id: String,
    pub selector: String,
    pub domains: DomainSpec,
    pub enabled: bool,
    pub category: RuleCategory,
    pub confidence: Confidence,
    pub source: RuleSourceKind,
}

impl Rule {
    /// A rule is inert if it can never apply to any domain (spec.md §3).
    pub fn is_inert(&self) -> bool {
        self.domains.is_inert()
    }
}

/// An ordered, deduplicated collection of rules (spec.md §3). Two rules with
/// identical `(source, selector)` are merged on insert; `enabled=false`
/// suppresses a rule from `selector_list()` without removing it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    version: u64,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new(), version: 0 }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Insert `rule`, merging into an existing entry that shares
    /// `(source, selector)` rather than duplicating it. Bumps the version tag
    /// on any structural change.
    pub fn insert(&mut self, rule: Rule) {
        if let Some(existing) = self
            .rules
            .iter_mut()
            .find(|r| r.source == rule.source && r.selector == rule.selector)
        {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
        self.version += 1;
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            self.insert(rule);
        }
    }

    /// Enabled-rules-only selector list, deduplicated, preserving the first
    /// occurrence's order (spec.md §3: `RuleSet.selectorList`).
    pub fn selector_list(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .filter(|r| r.enabled && !r.is_inert())
            .filter_map(|r| seen.insert(r.selector.clone()).then(|| r.selector.clone()))
            .collect()
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, selector: &str, source: RuleSourceKind, enabled: bool) -> Rule {
        Rule {
            id: id.into(),
            selector: selector.into(),
            domains: DomainSpec::All,
            enabled,
            category: RuleCategory::Easylist,
            confidence: Confidence::High,
            source,
        }
    }

    #[test]
    fn merges_identical_source_and_selector() {
        let mut set = RuleSet::new();
        set.insert(rule("a", ".ads", RuleSourceKind::Easylist, true));
        set.insert(rule("a-dup", ".ads", RuleSourceKind::Easylist, true));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn disabled_rule_is_persisted_but_excluded_from_selector_list() {
        let mut set = RuleSet::new();
        set.insert(rule("a", ".ads", RuleSourceKind::Custom, false));
        assert_eq!(set.len(), 1);
        assert!(set.selector_list().is_empty());
    }

    #[test]
    fn selector_list_deduplicates_across_sources() {
        let mut set = RuleSet::new();
        set.insert(rule("a", ".ads", RuleSourceKind::Easylist, true));
        set.insert(rule("b", ".ads", RuleSourceKind::Custom, true));
        assert_eq!(set.selector_list(), vec![".ads".to_string()]);
    }
}
