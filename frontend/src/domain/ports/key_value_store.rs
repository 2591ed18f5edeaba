//! Driven port for the client's per-origin key-value storage.
//!
//! In the browser this is `window.localStorage`; native builds and tests use
//! in-memory or directory-backed adapters. The session store only ever talks
//! to this trait.

use std::rc::Rc;
use std::sync::Arc;

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value storage adapters.
    pub enum KeyValueStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } => "storage unavailable: {message}",
        /// The key is not acceptable to the adapter.
        InvalidKey { key: String } => "invalid storage key: {key}",
        /// Reading a value failed.
        Read { key: String, message: String } => "failed to read {key}: {message}",
        /// Writing or removing a value failed.
        Write { key: String, message: String } => "failed to write {key}: {message}",
    }
}

/// String key-value storage with whole-value writes.
///
/// `set_item` replaces the stored value in one step: a concurrent
/// `get_item` sees either the old or the new value, never a mix.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Remove `key`; removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

macro_rules! forward_key_value_store {
    ($($wrapper:ty),* $(,)?) => {
        $(
            impl<T: KeyValueStore + ?Sized> KeyValueStore for $wrapper {
                fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
                    (**self).get_item(key)
                }

                fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
                    (**self).set_item(key, value)
                }

                fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
                    (**self).remove_item(key)
                }
            }
        )*
    };
}

forward_key_value_store!(&T, Arc<T>, Rc<T>, Box<T>);
