//! `TomlStore`: a `Store` backed by a single TOML file on disk, used by the
//! harness binary for local persistence (SPEC_FULL.md's "guard-host supplies
//! a toml-backed `Store` for local harness persistence" note). Production
//! embeddings back `Store` with extension storage instead; this crate never
//! assumes that backend.

use guard_types::{GuardError, Store};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::warn;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

pub struct TomlStore {
    path: PathBuf,
    data: Mutex<HashMap<String, serde_json::Value>>,
    channels: Mutex<HashMap<String, broadcast::Sender<Option<serde_json::Value>>>>,
}

fn json_to_toml(value: &serde_json::Value) -> Option<toml::Value> {
    toml::Value::try_from(value).ok()
}

fn toml_to_json(value: &toml::Value) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

impl TomlStore {
    /// Loads `path` if it exists and parses as valid TOML; any read or parse
    /// failure starts from an empty store rather than panicking (spec.md
    /// §4.2: host storage unavailability must never crash the core).
    pub fn load(path: PathBuf) -> Self {
        let table: toml::Table = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| toml::from_str(&text).ok())
            .unwrap_or_default();
        let data = table.into_iter().filter_map(|(k, v)| toml_to_json(&v).map(|jv| (k, jv))).collect();
        Self { path, data: Mutex::new(data), channels: Mutex::new(HashMap::new()) }
    }

    /// Publishes a `STORAGE_CHANGED`-equivalent notification for `key` to any
    /// active subscriber. Dropped if nobody is listening.
    fn publish(&self, key: &str, value: Option<serde_json::Value>) {
        let channels = self.channels.lock().expect("toml store poisoned");
        if let Some(tx) = channels.get(key) {
            let _ = tx.send(value);
        }
    }

    fn persist(&self) {
        let data = self.data.lock().expect("toml store poisoned");
        let table: toml::Table = data.iter().filter_map(|(k, v)| json_to_toml(v).map(|tv| (k.clone(), tv))).collect();
        match toml::to_string_pretty(&table) {
            Ok(text) => {
                if let Err(err) = std::fs::write(&self.path, text) {
                    warn!(target: "toml_store", %err, path = %self.path.display(), "failed to persist store");
                }
            }
            Err(err) => warn!(target: "toml_store", %err, "failed to serialize store to toml"),
        }
    }
}

impl Store for TomlStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.lock().expect("toml store poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), GuardError> {
        self.data.lock().expect("toml store poisoned").insert(key.to_string(), value.clone());
        self.persist();
        self.publish(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.data.lock().expect("toml store poisoned").remove(key);
        self.persist();
        self.publish(key, None);
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Option<serde_json::Value>> {
        let mut channels = self.channels.lock().expect("toml store poisoned");
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_types::StoreExt;

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = std::env::temp_dir().join(format!("guard-host-toml-store-test-{:?}", std::thread::current().id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("store.toml");
        let _ = std::fs::remove_file(&path);

        {
            let store = TomlStore::load(path.clone());
            store.set_typed("isActive", &true).unwrap();
            store.set_typed("whitelist", &vec!["trusted.org".to_string()]).unwrap();
        }

        let reloaded = TomlStore::load(path.clone());
        assert_eq!(reloaded.get_typed::<bool>("isActive"), Some(true));
        assert_eq!(reloaded.get_typed::<Vec<String>>("whitelist"), Some(vec!["trusted.org".to_string()]));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_starts_empty_without_panicking() {
        let store = TomlStore::load(PathBuf::from("/nonexistent/does-not-exist.toml"));
        assert!(store.get("isActive").is_none());
    }

    #[tokio::test]
    async fn subscriber_observes_set_then_remove() {
        let dir = std::env::temp_dir().join(format!("guard-host-toml-store-sub-{:?}", std::thread::current().id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("store.toml");
        let _ = std::fs::remove_file(&path);

        let store = TomlStore::load(path.clone());
        let mut rx = store.subscribe("isActive");
        store.set_typed("isActive", &true).unwrap();
        assert_eq!(rx.recv().await.unwrap(), Some(serde_json::json!(true)));
        store.remove("isActive");
        assert_eq!(rx.recv().await.unwrap(), None);

        let _ = std::fs::remove_file(&path);
    }
}
