//! `NavigationStats` / `DomainStats` (spec.md §3): monotonically
//! non-decreasing counters, resettable only by explicit administrative
//! action.

use crate::host::Host;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NavigationStats {
    pub blocked_count: u64,
    pub allowed_count: u64,
}

impl NavigationStats {
    pub fn increment(&mut self, allowed: bool) {
        if allowed {
            self.allowed_count += 1;
        } else {
            self.blocked_count += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DomainCounters {
    pub default_rules_removed: u64,
    pub custom_rules_removed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCounterKind {
    DefaultRules,
    CustomRules,
}

/// `map<host, DomainCounters>`, session-scoped by design (spec.md §3).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DomainStats(HashMap<Host, DomainCounters>);

impl DomainStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, host: Host, kind: DomainCounterKind) {
        let counters = self.0.entry(host).or_default();
        match kind {
            DomainCounterKind::DefaultRules => counters.default_rules_removed += 1,
            DomainCounterKind::CustomRules => counters.custom_rules_removed += 1,
        }
    }

    pub fn get(&self, host: &Host) -> DomainCounters {
        self.0.get(host).copied().unwrap_or_default()
    }

    /// Explicit administrative reset for one host (spec.md §4.13).
    pub fn reset(&mut self, host: &Host) {
        self.0.remove(host);
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.0.keys()
    }
}
