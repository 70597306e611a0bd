//! `RuleCache` (spec.md §4.2): a versioned, TTL-bounded persistent cache of
//! parsed rule sets per source, backed by the debounced writer in
//! `debounce.rs`.

pub mod debounce;

pub use debounce::DebouncedWriter;

use guard_types::{CacheEntry, Clock, Store, StoreExt};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct RuleCache {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    writer: DebouncedWriter,
}

impl RuleCache {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let writer = DebouncedWriter::new(store.clone());
        Self { store, clock, writer }
    }

    fn key_for(source: &str) -> String {
        format!("{source}Rules")
    }

    /// A read is a hit only when the entry is valid (spec.md §4.2, §3).
    pub fn get<T: DeserializeOwned>(&self, source: &str, schema_version: &str, ttl: Duration) -> Option<CacheEntry<T>> {
        let entry: CacheEntry<T> = self.store.get_typed(&Self::key_for(source))?;
        let now = self.clock.now();
        if entry.is_valid(schema_version, ttl, now) {
            Some(entry)
        } else {
            debug!(target: "cache", source, "cache miss: entry expired or schema mismatch");
            None
        }
    }

    /// Read the entry regardless of TTL/schema validity, for the
    /// "serve stale on fetch failure" fallback (spec.md §4.3).
    pub fn get_stale<T: DeserializeOwned>(&self, source: &str) -> Option<CacheEntry<T>> {
        self.store.get_typed(&Self::key_for(source))
    }

    pub fn put<T: Serialize>(&self, source: &str, entry: &CacheEntry<T>) {
        if let Ok(value) = serde_json::to_value(entry) {
            self.writer.schedule(Self::key_for(source), value);
        }
    }

    pub fn invalidate(&self, source: &str) {
        let key = Self::key_for(source);
        self.writer.cancel(&key);
        self.store.remove(&key);
    }

    pub fn flush(&self) {
        let _ = self.writer.flush_all();
    }
}
