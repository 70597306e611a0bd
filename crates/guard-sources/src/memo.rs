//! In-process memoization layer shared by the `RuleSource` variants
//! (spec.md §4.3: "memoize for 60s" / "memoize for 30s" / "≤60 s in-process
//! memoization layer" on top of the persistent cache).

use guard_types::{Clock, Timestamp};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Entry<T> {
    value: T,
    fetched_at: Timestamp,
}

pub struct Memo<T: Clone> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> Memo<T> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { clock, ttl, entry: Mutex::new(None) }
    }

    pub fn get(&self) -> Option<T> {
        let guard = self.entry.lock().expect("memo poisoned");
        let entry = guard.as_ref()?;
        let now = self.clock.now();
        if now.elapsed_since(entry.fetched_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn set(&self, value: T) {
        let fetched_at = self.clock.now();
        *self.entry.lock().expect("memo poisoned") = Some(Entry { value, fetched_at });
    }

    pub fn clear(&self) {
        *self.entry.lock().expect("memo poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FixedClock(AtomicI64);
    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp(self.0.load(Ordering::SeqCst))
        }
    }

    #[test]
    fn expires_after_ttl() {
        let clock = Arc::new(FixedClock(AtomicI64::new(0)));
        let memo: Memo<u32> = Memo::new(clock.clone(), Duration::from_millis(100));
        memo.set(7);
        assert_eq!(memo.get(), Some(7));
        clock.0.store(200, Ordering::SeqCst);
        assert_eq!(memo.get(), None);
    }

    #[test]
    fn clear_forces_a_miss() {
        let clock = Arc::new(FixedClock(AtomicI64::new(0)));
        let memo: Memo<u32> = Memo::new(clock, Duration::from_secs(60));
        memo.set(1);
        memo.clear();
        assert_eq!(memo.get(), None);
    }
}
