//! `StatsStore` (spec.md §4.13): in-memory counters with debounced
//! persistence. Readers always observe the in-memory counter, which is
//! updated synchronously before the persisted write is even scheduled —
//! no increment is ever lost across a coalesce boundary (spec.md §4.13).

use guard_cache::DebouncedWriter;
use guard_engine::DomainStatsSink;
use guard_nav::NavigationStatsSink;
use guard_types::{DomainCounterKind, DomainStats, Host, NavigationStats, Store};
use std::sync::{Arc, Mutex};

const NAVIGATION_STATS_KEY: &str = "navigationStats";
const DOMAIN_STATS_KEY: &str = "domainStats";

pub struct StatsStore {
    navigation: Mutex<NavigationStats>,
    domain: Mutex<DomainStats>,
    writer: DebouncedWriter,
}

impl StatsStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { navigation: Mutex::new(NavigationStats::default()), domain: Mutex::new(DomainStats::new()), writer: DebouncedWriter::new(store) }
    }

    pub fn increment_navigation(&self, allowed: bool) {
        let snapshot = {
            let mut stats = self.navigation.lock().expect("navigation stats poisoned");
            stats.increment(allowed);
            *stats
        };
        self.writer.schedule(
            NAVIGATION_STATS_KEY.to_string(),
            serde_json::to_value(snapshot).expect("NavigationStats always serializes"),
        );
    }

    pub fn increment_domain(&self, host: Host, kind: DomainCounterKind) {
        let snapshot = {
            let mut stats = self.domain.lock().expect("domain stats poisoned");
            stats.increment(host, kind);
            stats.clone()
        };
        self.persist_domain(&snapshot);
    }

    /// Explicit administrative reset for one host (spec.md §4.13).
    pub fn reset_domain(&self, host: &Host) {
        let snapshot = {
            let mut stats = self.domain.lock().expect("domain stats poisoned");
            stats.reset(host);
            stats.clone()
        };
        self.persist_domain(&snapshot);
    }

    fn persist_domain(&self, snapshot: &DomainStats) {
        self.writer.schedule(
            DOMAIN_STATS_KEY.to_string(),
            serde_json::to_value(snapshot).expect("DomainStats always serializes"),
        );
    }

    pub fn navigation_snapshot(&self) -> NavigationStats {
        *self.navigation.lock().expect("navigation stats poisoned")
    }

    pub fn domain_snapshot(&self, host: &Host) -> guard_types::DomainCounters {
        self.domain.lock().expect("domain stats poisoned").get(host)
    }

    /// Flush any still-pending debounced write synchronously (called by
    /// `CleanupRegistry` on teardown).
    pub fn flush(&self) {
        if let Err(err) = self.writer.flush_all() {
            tracing::warn!(target: "stats_store", %err, "failed to flush pending stats writes on cleanup");
        }
    }
}

impl NavigationStatsSink for StatsStore {
    fn increment(&self, allowed: bool) {
        self.increment_navigation(allowed);
    }
}

impl DomainStatsSink for StatsStore {
    fn record_removed(&self, host: &Host, kind: DomainCounterKind, count: u64) {
        for _ in 0..count {
            self.increment_domain(host.clone(), kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_types::GuardError;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStore {
        data: StdMutex<HashMap<String, serde_json::Value>>,
    }
    impl Store for FakeStore {
        fn get(&self, key: &str) -> Option<serde_json::Value> {
            self.data.lock().unwrap().get(key).cloned()
        }
        fn set(&self, key: &str, value: serde_json::Value) -> Result<(), GuardError> {
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        fn remove(&self, key: &str) {
            self.data.lock().unwrap().remove(key);
        }
        fn subscribe(&self, _key: &str) -> tokio::sync::broadcast::Receiver<Option<serde_json::Value>> {
            tokio::sync::broadcast::channel(1).1
        }
    }

    #[tokio::test]
    async fn navigation_counters_increment_correct_bucket() {
        let stats = StatsStore::new(Arc::new(FakeStore::default()));
        stats.increment_navigation(true);
        stats.increment_navigation(false);
        stats.increment_navigation(false);
        let snapshot = stats.navigation_snapshot();
        assert_eq!(snapshot.allowed_count, 1);
        assert_eq!(snapshot.blocked_count, 2);
    }

    #[tokio::test]
    async fn domain_counters_are_session_scoped_until_reset() {
        let stats = StatsStore::new(Arc::new(FakeStore::default()));
        let host = Host::parse("example.com");
        stats.record_removed(&host, DomainCounterKind::DefaultRules, 3);
        stats.record_removed(&host, DomainCounterKind::CustomRules, 1);
        let snapshot = stats.domain_snapshot(&host);
        assert_eq!(snapshot.default_rules_removed, 3);
        assert_eq!(snapshot.custom_rules_removed, 1);

        stats.reset_domain(&host);
        assert_eq!(stats.domain_snapshot(&host).default_rules_removed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_are_coalesced_to_persistent_store() {
        let store = Arc::new(FakeStore::default());
        let stats = StatsStore::new(store.clone());
        stats.increment_navigation(true);
        stats.increment_navigation(true);
        tokio::time::advance(std::time::Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        let persisted: NavigationStats = serde_json::from_value(store.get(NAVIGATION_STATS_KEY).unwrap()).unwrap();
        assert_eq!(persisted.allowed_count, 2);
    }
}
