//! `CacheEntry` and the schema-version/TTL validity rule (spec.md §3, §4.2).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Schema version tag for persisted rule payloads. A mismatch invalidates the
/// entry regardless of TTL (spec.md §3).
pub type SchemaVersion = String;

/// Milliseconds since the Unix epoch. Using a plain serializable integer
/// (rather than `std::time::Instant`, which has no stable epoch and is not
/// `Serialize`) lets `CacheEntry` round-trip through the persistent `Store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn elapsed_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0).max(0) as u64)
    }
}

/// Clock abstraction so TTL logic is testable without real sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Timestamp(millis)
    }
}

/// A versioned, timestamped payload of raw or parsed rules (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub rules: T,
    pub last_fetched: Timestamp,
    pub version: SchemaVersion,
}

impl<T> CacheEntry<T> {
    pub fn new(rules: T, last_fetched: Timestamp, version: SchemaVersion) -> Self {
        Self { rules, last_fetched, version }
    }

    /// Valid iff `version` matches the current schema AND
    /// `(now - lastFetched) < TTL` (strict less-than, spec.md §3, §8).
    pub fn is_valid(&self, current_schema: &str, ttl: Duration, now: Timestamp) -> bool {
        self.version == current_schema && now.elapsed_since(self.last_fetched) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_at_exactly_ttl_is_invalid() {
        let entry = CacheEntry::new(vec!["x".to_string()], Timestamp(0), "1.0".into());
        let ttl = Duration::from_secs(7 * 24 * 3600);
        let exactly_at_ttl = Timestamp(ttl.as_millis() as i64);
        assert!(!entry.is_valid("1.0", ttl, exactly_at_ttl));
        assert!(entry.is_valid("1.0", ttl, Timestamp(exactly_at_ttl.0 - 1)));
    }

    #[test]
    fn schema_mismatch_invalidates_regardless_of_age() {
        let entry = CacheEntry::new(vec!["x".to_string()], Timestamp(0), "0.9".into());
        assert!(!entry.is_valid("1.0", Duration::from_secs(3600), Timestamp(1)));
    }
}
