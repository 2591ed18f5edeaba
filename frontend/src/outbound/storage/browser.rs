//! `window.localStorage` adapter for the browser build.

use web_sys::Storage;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Key-value storage over the page's `localStorage`.
#[derive(Debug, Clone)]
pub struct BrowserKeyValueStore {
    storage: Storage,
}

impl BrowserKeyValueStore {
    /// `localStorage` of the current window.
    pub fn local() -> Result<Self, KeyValueStoreError> {
        let window = web_sys::window()
            .ok_or_else(|| KeyValueStoreError::unavailable("no window"))?;
        let storage = window
            .local_storage()
            .map_err(|err| KeyValueStoreError::unavailable(format!("{err:?}")))?
            .ok_or_else(|| KeyValueStoreError::unavailable("localStorage disabled"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        self.storage
            .get_item(key)
            .map_err(|err| KeyValueStoreError::read(key, format!("{err:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| KeyValueStoreError::write(key, format!("{err:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.storage
            .remove_item(key)
            .map_err(|err| KeyValueStoreError::write(key, format!("{err:?}")))
    }
}
