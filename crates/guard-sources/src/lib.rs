//! `RuleSource` variants (spec.md §4.3): `Default`, `Custom`, `EasyListDom`.
//! Each owns its TTL and invalidation policy and never throws out of
//! `fetch` — on failure it always returns the last-known value if
//! non-empty.

mod memo;

pub use memo::Memo;

use async_trait::async_trait;
use guard_cache::RuleCache;
use guard_parser::parse_cosmetic;
use guard_types::{CacheEntry, Clock, GuardError, Rule, Store, StoreExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Selector,
    Hybrid,
}

/// Fetches raw rule-source text over the network. The concrete transport
/// (fetch(), XHR, a native HTTP client) is an external collaborator; the
/// core only depends on this trait (spec.md §1).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, GuardError>;
}

#[async_trait]
pub trait RuleSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn executor_kind(&self) -> ExecutorKind;
    async fn fetch(&self) -> Vec<Rule>;
    fn invalidate(&self);
}

const DEFAULT_TTL: Duration = Duration::from_secs(60);
const CUSTOM_TTL: Duration = Duration::from_secs(30);
const EASYLIST_TTL: Duration = Duration::from_secs(7 * 24 * 3600);
const EASYLIST_MEMO_TTL: Duration = Duration::from_secs(60);
const EASYLIST_SCHEMA_VERSION: &str = "1.0";

/// Reads a fixed array of seeded rules from `defaultRules`, memoized for 60s
/// (spec.md §4.3).
pub struct DefaultSource {
    store: Arc<dyn Store>,
    memo: Memo<Vec<Rule>>,
}

impl DefaultSource {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, memo: Memo::new(clock, DEFAULT_TTL) }
    }
}

#[async_trait]
impl RuleSource for DefaultSource {
    fn name(&self) -> &'static str {
        "default"
    }

    fn executor_kind(&self) -> ExecutorKind {
        ExecutorKind::Hybrid
    }

    async fn fetch(&self) -> Vec<Rule> {
        if let Some(cached) = self.memo.get() {
            return cached;
        }
        let rules: Vec<Rule> = self.store.get_typed("defaultRules").unwrap_or_default();
        self.memo.set(rules.clone());
        rules
    }

    fn invalidate(&self) {
        self.memo.clear();
    }
}

/// Reads `customRules`, memoized for only 30s since users edit these
/// frequently (spec.md §4.3).
pub struct CustomSource {
    store: Arc<dyn Store>,
    memo: Memo<Vec<Rule>>,
}

impl CustomSource {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, memo: Memo::new(clock, CUSTOM_TTL) }
    }
}

#[async_trait]
impl RuleSource for CustomSource {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn executor_kind(&self) -> ExecutorKind {
        ExecutorKind::Selector
    }

    async fn fetch(&self) -> Vec<Rule> {
        if let Some(cached) = self.memo.get() {
            return cached;
        }
        let rules: Vec<Rule> = self.store.get_typed("customRules").unwrap_or_default();
        self.memo.set(rules.clone());
        rules
    }

    fn invalidate(&self) {
        self.memo.clear();
    }
}

/// Fetches the EasyList-style cosmetic resource over the network. Persists
/// the raw text with `version=1.0` on success; on failure serves the stale
/// persistent cache if any, else an empty set — `fetch` never throws
/// (spec.md §4.3).
pub struct EasyListDomSource {
    url: String,
    fetcher: Arc<dyn Fetcher>,
    cache: RuleCache,
    clock: Arc<dyn Clock>,
    memo: Memo<Vec<Rule>>,
}

impl EasyListDomSource {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn Fetcher>, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            url: url.into(),
            fetcher,
            cache: RuleCache::new(store, clock.clone()),
            memo: Memo::new(clock.clone(), EASYLIST_MEMO_TTL),
            clock,
        }
    }

    fn parse(raw: &[String]) -> Vec<Rule> {
        let lines: Vec<&str> = raw.iter().map(String::as_str).collect();
        parse_cosmetic(&lines).0
    }
}

#[async_trait]
impl RuleSource for EasyListDomSource {
    fn name(&self) -> &'static str {
        "easylistDom"
    }

    fn executor_kind(&self) -> ExecutorKind {
        ExecutorKind::Hybrid
    }

    async fn fetch(&self) -> Vec<Rule> {
        if let Some(cached) = self.memo.get() {
            return cached;
        }

        if let Some(entry) = self.cache.get::<Vec<String>>("easylistDom", EASYLIST_SCHEMA_VERSION, EASYLIST_TTL) {
            let rules = Self::parse(&entry.rules);
            self.memo.set(rules.clone());
            return rules;
        }

        match self.fetcher.fetch_text(&self.url).await {
            Ok(text) => {
                let raw: Vec<String> = text.lines().map(str::to_string).collect();
                let rules = Self::parse(&raw);
                let entry = CacheEntry::new(raw, self.clock.now(), EASYLIST_SCHEMA_VERSION.to_string());
                self.cache.put("easylistDom", &entry);
                self.memo.set(rules.clone());
                rules
            }
            Err(err) => {
                warn!(target: "sources.easylist", %err, "fetch failed, falling back to stale cache");
                let stale = self
                    .cache
                    .get_stale::<Vec<String>>("easylistDom")
                    .map(|entry| Self::parse(&entry.rules))
                    .unwrap_or_default();
                if stale.is_empty() {
                    debug!(target: "sources.easylist", "no stale cache available, returning empty rule set");
                }
                stale
            }
        }
    }

    fn invalidate(&self) {
        self.memo.clear();
        self.cache.invalidate("easylistDom");
    }
}
