//! `RuleCoordinator` (spec.md §4.10): composes the enabled `RuleSource`s
//! against a settings snapshot, routes each source to its declared executor
//! kind, and runs Hybrid sources before Selector sources. Owns the
//! `RuleSource` instances and every `HybridExecutor` it starts.

use crate::hybrid::HybridExecutor;
use crate::selector::{SelectorExecutor, SelectorOpts};
use guard_dom::{DomDocument, ScanStats};
use guard_sources::{ExecutorKind, RuleSource};
use guard_types::{is_whitelisted, DomainCounterKind, Host, RuleSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Which toggle enables a given source. Whether EasyList rides along with
/// the default-rules toggle or has its own switch is controlled by
/// `easylist_bundled_under_default` (spec.md §9 open question,
/// SPEC_FULL.md §2/§4.16): bundled by default, but an independent
/// `easylistDomEnabled`-equivalent toggle is a config change away.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCoordinatorSettings {
    pub default_rules_enabled: bool,
    pub custom_rules_enabled: bool,
    pub easylist_bundled_under_default: bool,
    pub easylist_enabled: bool,
}

impl RuleCoordinatorSettings {
    fn allows(&self, source_name: &str) -> bool {
        match source_name {
            "default" => self.default_rules_enabled,
            "easylistDom" => {
                if self.easylist_bundled_under_default {
                    self.default_rules_enabled
                } else {
                    self.easylist_enabled
                }
            }
            "custom" => self.custom_rules_enabled,
            _ => false,
        }
    }
}

/// Reports aggregate per-domain removal counts (spec.md §3 `DomainStats`,
/// §4.13 `StatsStore.incrementDomain`). Kept as a narrow trait here so this
/// crate doesn't need to depend on the stats crate.
pub trait DomainStatsSink: Send + Sync {
    fn record_removed(&self, host: &Host, kind: DomainCounterKind, count: u64);
}

pub struct RuleCoordinator {
    sources: Vec<Arc<dyn RuleSource>>,
    hybrid_executors: Mutex<HashMap<&'static str, HybridExecutor>>,
}

impl RuleCoordinator {
    pub fn new(sources: Vec<Arc<dyn RuleSource>>) -> Self {
        Self { sources, hybrid_executors: Mutex::new(HashMap::new()) }
    }

    /// Runs one pass for `domain`. Whitelist is checked before any source is
    /// touched (spec.md §7). Hybrid-kind sources run before Selector-kind
    /// sources, each source's executor kept alive for future mutation
    /// handling / rescans.
    pub async fn execute(
        &self,
        document: Arc<dyn DomDocument>,
        domain: Host,
        whitelist: &[Host],
        settings: RuleCoordinatorSettings,
        stats_sink: &dyn DomainStatsSink,
    ) -> ScanStats {
        if is_whitelisted(whitelist, &domain) {
            debug!(target: "rule_coordinator", domain = %domain, "domain whitelisted, skipping execution");
            return ScanStats::default();
        }

        let mut total = ScanStats::default();

        for source in self.sources.iter().filter(|s| s.executor_kind() == ExecutorKind::Hybrid) {
            if !settings.allows(source.name()) {
                continue;
            }
            let rules = source.fetch().await;
            let mut set = RuleSet::new();
            set.extend(rules);
            let selectors = set.selector_list();
            if selectors.is_empty() {
                continue;
            }

            let mut executors = self.hybrid_executors.lock().expect("coordinator state poisoned");
            let executor = executors.entry(source.name()).or_insert_with(|| HybridExecutor::new(document.clone()));
            let stats = executor.execute(&selectors, domain.clone());
            stats_sink.record_removed(&domain, bucket_for(source.name()), stats.removed + stats.hidden);
            total.merge(stats);
        }

        for source in self.sources.iter().filter(|s| s.executor_kind() == ExecutorKind::Selector) {
            if !settings.allows(source.name()) {
                continue;
            }
            let rules = source.fetch().await;
            let removed =
                SelectorExecutor::execute(document.as_ref(), &rules, &domain, SelectorOpts::default()).await;
            stats_sink.record_removed(&domain, bucket_for(source.name()), removed);
            total.removed += removed;
        }

        total
    }

    /// Tears down every `HybridExecutor` this coordinator started, in no
    /// particular cross-source order (each is independent).
    pub fn cleanup(&self) {
        let mut executors = self.hybrid_executors.lock().expect("coordinator state poisoned");
        for (_, mut executor) in executors.drain() {
            executor.cleanup();
        }
    }
}

fn bucket_for(source_name: &str) -> DomainCounterKind {
    match source_name {
        "custom" => DomainCounterKind::CustomRules,
        _ => DomainCounterKind::DefaultRules,
    }
}
