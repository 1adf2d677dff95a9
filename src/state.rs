//! Persistent key-value state backing cooldowns and daily markers.
//!
//! The store is schema-oblivious: the file is one JSON object and unknown
//! keys survive every round-trip untouched, so newer versions of the agent
//! (or the user poking at the file) never lose data. Writes go through a
//! sibling temp file and an atomic rename so a concurrent reader never
//! observes a partially written document.
//!
//! Reserved key families:
//! - `cooldown:<jobId>` — epoch-ms of the last sent notification
//! - `daily:<jobId>:<YYYY-MM-DD>` — marker equal to the date, "already
//!   emitted today"

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::AgentError;

/// Durable key→value map persisted as a single JSON object file.
pub struct StateStore {
    path: PathBuf,
    map: Map<String, Value>,
}

impl StateStore {
    /// Open the store at `path`. A missing, empty, or malformed file is
    /// treated as an empty map — the agent must not refuse to start over a
    /// corrupt state file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = read_map(&path);
        Self { path, map }
    }

    /// Get a raw value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Set a value and persist the whole document atomically.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), AgentError> {
        self.map.insert(key.to_string(), value);
        self.flush()
    }

    /// Typed accessor for epoch-ms timestamps. Absent or non-numeric values
    /// read as `None`.
    pub fn get_time(&self, key: &str) -> Option<i64> {
        self.map.get(key).and_then(Value::as_i64)
    }

    /// Store an epoch-ms timestamp.
    pub fn set_time(&mut self, key: &str, epoch_ms: i64) -> Result<(), AgentError> {
        self.set(key, Value::from(epoch_ms))
    }

    /// Replace the file with the empty map.
    pub fn clear(&mut self) -> Result<(), AgentError> {
        self.map.clear();
        self.flush()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Write the in-memory map to disk: temp sibling, then rename over the
    /// target. Rename failure fails this call but not the tick.
    fn flush(&self) -> Result<(), AgentError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(|e| AgentError::State(format!("create {}: {e}", parent.display())))?;

        let tmp = tmp_sibling(&self.path);
        let json = serde_json::to_string_pretty(&Value::Object(self.map.clone()))
            .map_err(|e| AgentError::State(format!("serialize state: {e}")))?;
        std::fs::write(&tmp, json)
            .map_err(|e| AgentError::State(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AgentError::State(format!("rename over {}: {e}", self.path.display())))
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_map(path: &Path) -> Map<String, Value> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            log::warn!(
                "state file {} is not a JSON object — treating as empty",
                path.display()
            );
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &Path) -> StateStore {
        StateStore::open(dir.join("state.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.is_empty());
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_set_get_roundtrip_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("k", json!({"nested": [1, 2, 3]})).unwrap();
        store.set("s", json!("text")).unwrap();

        let reopened = store_in(dir.path());
        assert_eq!(reopened.get("k"), Some(&json!({"nested": [1, 2, 3]})));
        assert_eq!(reopened.get("s"), Some(&json!("text")));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let dir = tempfile::tempdir().unwrap();
        // Process A writes k1 plus a key this version knows nothing about.
        std::fs::write(
            dir.path().join("state.json"),
            r#"{"k1": "v1", "future:feature": {"x": 1}}"#,
        )
        .unwrap();

        // Process B sets an unrelated key.
        let mut store = store_in(dir.path());
        store.set("k2", json!("v2")).unwrap();

        let reopened = store_in(dir.path());
        assert_eq!(reopened.get("k1"), Some(&json!("v1")));
        assert_eq!(reopened.get("k2"), Some(&json!("v2")));
        assert_eq!(reopened.get("future:feature"), Some(&json!({"x": 1})));
    }

    #[test]
    fn test_time_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set_time("cooldown:job", 1_700_000_000_000).unwrap();
        assert_eq!(store.get_time("cooldown:job"), Some(1_700_000_000_000));
        assert_eq!(store.get_time("absent"), None);
    }

    #[test]
    fn test_get_time_non_numeric_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("cooldown:job", json!("not a number")).unwrap();
        assert_eq!(store.get_time("cooldown:job"), None);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "{{{ not json").unwrap();
        let store = store_in(dir.path());
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_object_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "[1, 2, 3]").unwrap();
        let store = store_in(dir.path());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_replaces_with_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("k", json!(1)).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());

        let reopened = store_in(dir.path());
        assert!(reopened.is_empty());
        // The file itself holds the empty object, not nothing.
        let contents = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
        assert_eq!(contents.trim(), "{}");
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("k", json!(true)).unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());
    }
}
