//! In-memory key-value storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Mutex-guarded map standing in for `localStorage` in tests and previews.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_remove_is_idempotent() {
        let store = MemoryKeyValueStore::default();
        store.set_item("k", "one").expect("set");
        store.set_item("k", "two").expect("set");
        assert_eq!(store.get_item("k").expect("get").as_deref(), Some("two"));
        assert_eq!(store.len(), 1);

        store.remove_item("k").expect("remove");
        store.remove_item("k").expect("remove missing");
        assert!(store.is_empty());
    }
}
