//! `Store` — the persistent key/value collaborator (spec.md §1, §6). The
//! concrete backing store (extension storage, a database, a file) is an
//! external collaborator; the core only ever talks to this trait.

use crate::error::GuardError;
use tokio::sync::broadcast;

/// String-keyed, JSON-serializable persistent storage. Implementations must
/// tolerate being unavailable: a write failure should be surfaced via
/// `Err(GuardError::StoreWriteFailure)` but never panic (spec.md §4.2:
/// "writes tolerate host-storage unavailability").
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), GuardError>;
    fn remove(&self, key: &str);

    /// Subscribe to change notifications for `key` (spec.md §6's
    /// `STORAGE_CHANGED`-equivalent inter-context message). A `set` publishes
    /// `Some(new value)`; a `remove` publishes `None`. Lagged receivers just
    /// miss intermediate values; a write must never block on a slow
    /// subscriber.
    fn subscribe(&self, key: &str) -> broadcast::Receiver<Option<serde_json::Value>>;
}

/// Typed convenience helpers layered over the raw `Store` trait.
pub trait StoreExt: Store {
    fn get_typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    fn set_typed<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), GuardError> {
        let json = serde_json::to_value(value)
            .map_err(|e| GuardError::StoreWriteFailure(e.to_string()))?;
        self.set(key, json)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
