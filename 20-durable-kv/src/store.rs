//! In-memory key-value storage.
//!
//! The store holds the live state served to clients. It is volatile: on
//! restart it is rebuilt from the transaction log by [`crate::replay`].

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreError;

/// Thread-safe key-value map.
///
/// Reads take a shared lock and run in parallel; `put` and `delete` take the
/// exclusive lock for the duration of a single map mutation. No method does
/// I/O while holding the lock.
#[derive(Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a key-value pair, overwriting any existing value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug!(key = %key, "putting key to store");
        self.data.write().insert(key, value.into());
    }

    /// Retrieves the current value for a key.
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        debug!(key, "getting value using key");
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    /// Removes a key. Removing an absent key is not an error.
    pub fn delete(&self, key: &str) {
        debug!(key, "deleting key from store");
        self.data.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns a sorted copy of every key-value pair.
    ///
    /// The lock is released before the caller iterates.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn get_returns_last_written_value() {
        let store = Store::new();
        store.put("a", "1");
        store.put("a", "2");
        assert_eq!(store.get("a"), Ok("2".to_string()));
    }

    #[test]
    fn get_after_delete_is_no_such_key() {
        let store = Store::new();
        store.put("a", "1");
        store.delete("a");
        assert_eq!(store.get("a"), Err(StoreError::NoSuchKey("a".into())));
        assert!(store.is_empty());
    }

    #[test]
    fn deleting_absent_key_is_a_no_op() {
        let store = Store::new();
        store.put("b", "kept");
        store.delete("missing");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b"), Ok("kept".to_string()));
    }

    #[test]
    fn snapshot_is_sorted_copy() {
        let store = Store::new();
        store.put("z", "26");
        store.put("a", "1");
        let snapshot = store.snapshot();
        store.put("m", "13");

        let keys: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "z".to_string()]);
    }

    #[test]
    fn parallel_puts_on_distinct_keys_are_not_lost() {
        let store = Arc::new(Store::new());
        let writers: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.put(format!("key-{i}"), format!("value-{i}")))
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread panicked");
        }

        let readers: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get(&format!("key-{i}")))
            })
            .collect();
        for (i, reader) in readers.into_iter().enumerate() {
            let value = reader.join().expect("reader thread panicked");
            assert_eq!(value, Ok(format!("value-{i}")));
        }
        assert_eq!(store.len(), 64);
    }
}
