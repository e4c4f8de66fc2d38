use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// String-keyed persistent storage for JSON-serializable client state.
///
/// Reads of an absent key are not errors: the JSON helpers substitute the
/// caller's default. A present value that fails to parse is an error.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn read_json<T>(&self, key: &str, default: impl FnOnce() -> T) -> Result<T>
    where
        T: DeserializeOwned,
        Self: Sized,
    {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Malformed value under key {}", key)),
            None => Ok(default()),
        }
    }

    fn write_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

/// In-process store, for tests and runs that should leave nothing on disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|e| anyhow!("Store lock poisoned: {}", e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| anyhow!("Store lock poisoned: {}", e))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| anyhow!("Store lock poisoned: {}", e))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_yields_default() {
        let store = MemoryStore::new();
        let v: Vec<u32> = store.read_json("missing", || vec![7]).unwrap();
        assert_eq!(v, vec![7]);
    }

    #[test]
    fn json_write_then_read() {
        let store = MemoryStore::new();
        store.write_json("nums", &vec![1u32, 2, 3]).unwrap();
        let v: Vec<u32> = store.read_json("nums", Vec::new).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn malformed_value_is_an_error() {
        let store = MemoryStore::new();
        store.set("nums", "not json").unwrap();
        let res: Result<Vec<u32>> = store.read_json("nums", Vec::new);
        assert!(res.is_err());
    }

    #[test]
    fn remove_clears_key() {
        let store = MemoryStore::new();
        store.set("k", "1").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
