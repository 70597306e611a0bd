//! Domain scoping for rules and whitelist entries.
//!
//! The matching rule is authoritative and shared by `Rule::domains` and by
//! whitelist lookups (spec.md §7: "Whitelist hosts are matched by the same
//! rules as rule `DomainSpec` subdomain inclusion.").

use crate::host::Host;

/// A rule's domain scope: either unrestricted, or a non-empty set of host
/// patterns. An empty pattern set is constructible but inert (spec.md §3
/// invariant) — `matches` always returns `false` for it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "patterns")]
pub enum DomainSpec {
    All,
    Patterns(Vec<String>),
}

impl DomainSpec {
    pub fn all() -> Self {
        DomainSpec::All
    }

    pub fn patterns(patterns: Vec<String>) -> Self {
        DomainSpec::Patterns(patterns)
    }

    /// True iff this spec would never match any host (empty pattern list).
    pub fn is_inert(&self) -> bool {
        matches!(self, DomainSpec::Patterns(p) if p.is_empty())
    }

    pub fn matches(&self, current: &Host) -> bool {
        match self {
            DomainSpec::All => true,
            DomainSpec::Patterns(patterns) => {
                !patterns.is_empty() && patterns.iter().any(|p| pattern_matches(p, current))
            }
        }
    }
}

/// Domain match rules (spec.md §4.9, authoritative):
///
/// - `*.H` matches iff `current == H` or `current` ends with `.H`.
/// - `H` matches iff `current == H` or `current` ends with `.H` (subdomain
///   inclusion), but NOT when `current` merely ends with `H` as a suffix of a
///   different label — `myexample.com` must not match `example.com`.
pub fn pattern_matches(pattern: &str, current: &Host) -> bool {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    let current = current.as_str();
    current == host || current.ends_with(&format!(".{host}"))
}

/// Convenience wrapper for whitelist lookups: a host is whitelisted if any
/// whitelist entry matches it under the same rule as `DomainSpec`.
pub fn is_whitelisted(whitelist: &[Host], current: &Host) -> bool {
    whitelist.iter().any(|entry| pattern_matches(entry.as_str(), current))
}
